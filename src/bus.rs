use crate::events::{EventKind, GameEvent};

type Listener = Box<dyn Fn(&GameEvent) + Send>;

/// Typed publish/subscribe registry keyed by the closed event-kind set.
/// Dispatch is synchronous, per kind, in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: [Vec<Listener>; EventKind::ALL.len()],
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F)
    where
        F: Fn(&GameEvent) + Send + 'static,
    {
        self.listeners[kind.index()].push(Box::new(listener));
    }

    pub fn emit(&self, event: &GameEvent) {
        for listener in &self.listeners[event.kind().index()] {
            listener(event);
        }
    }

    /// Drop listeners for one kind, or all of them.
    pub fn clear(&mut self, kind: Option<EventKind>) {
        match kind {
            Some(kind) => self.listeners[kind.index()].clear(),
            None => {
                for list in &mut self.listeners {
                    list.clear();
                }
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<usize> = self.listeners.iter().map(Vec::len).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::EventBus;
    use crate::events::{EventData, EventKind, GameEvent};

    fn kill_event() -> GameEvent {
        GameEvent {
            timestamp: 1000,
            source_id: "a".to_owned(),
            target_id: "b".to_owned(),
            loadout_id: "6".to_owned(),
            target_loadout_id: "20".to_owned(),
            zone_id: "2".to_owned(),
            data: EventData::Kill {
                weapon_id: "7169".to_owned(),
                is_headshot: false,
            },
        }
    }

    #[test]
    fn emits_only_to_matching_kind() {
        let mut bus = EventBus::new();
        let kills = Arc::new(AtomicUsize::new(0));
        let deaths = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&kills);
        bus.on(EventKind::Kill, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&deaths);
        bus.on(EventKind::Death, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&kill_event());
        assert_eq!(kills.load(Ordering::SeqCst), 1);
        assert_eq!(deaths.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispatch_runs_in_registration_order() {
        let mut bus = EventBus::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.on(EventKind::Kill, move |_| {
                order.lock().expect("order lock").push(tag);
            });
        }

        bus.emit(&kill_event());
        assert_eq!(*order.lock().expect("order lock"), vec!["first", "second", "third"]);
    }

    #[test]
    fn clear_drops_listeners() {
        let mut bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.on(EventKind::Kill, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        bus.clear(Some(EventKind::Kill));
        bus.emit(&kill_event());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
