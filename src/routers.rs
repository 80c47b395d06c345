use serde::Serialize;
use tracing::{debug, warn};

/// One tracked deployable placement. `first_spawn` stays unset until the
/// device produces its first activity tick; an instance that never sees a
/// destroy signal by session end is abandoned, which is terminal but not an
/// error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackedRouter {
    /// Provider-assigned npc id, learned from the first activity tick.
    pub id: String,
    pub owner: String,
    pub pulled_at: i64,
    pub first_spawn: Option<i64>,
    pub destroyed: Option<i64>,
    pub count: u32,
}

/// Lifecycle tracker for deployable routers, keyed by owner while a
/// placement awaits its first activity tick and by npc id once active.
///
/// At most one awaiting-first-activity placement is held per owner; a new
/// pull before the previous device's first tick supersedes the pending
/// placement (the superseded instance stays in the list, terminal).
#[derive(Debug, Default)]
pub struct RouterTracker {
    routers: Vec<TrackedRouter>,
    /// owner -> index into `routers` of the placement awaiting first activity
    pending: std::collections::HashMap<String, usize>,
}

impl RouterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pull signal: the owner just acquired a fresh device.
    pub fn handle_pull(&mut self, owner: &str, timestamp: i64) {
        if let Some(&idx) = self.pending.get(owner) {
            debug!(
                owner,
                pulled_at = self.routers[idx].pulled_at,
                "superseding pending router placement"
            );
        }
        self.routers.push(TrackedRouter {
            id: String::new(),
            owner: owner.to_owned(),
            pulled_at: timestamp,
            first_spawn: None,
            destroyed: None,
            count: 0,
        });
        self.pending.insert(owner.to_owned(), self.routers.len() - 1);
    }

    /// An activity tick from the owner's device. The first tick promotes
    /// the pending placement and binds the npc id; later ticks with the
    /// same npc id just bump the counter.
    pub fn handle_spawn(&mut self, owner: &str, npc_id: &str, timestamp: i64) {
        if npc_id.is_empty() || npc_id == "0" {
            warn!(owner, "router activity tick without an npc id, skipping");
            return;
        }

        if let Some(router) = self
            .routers
            .iter_mut()
            .find(|r| r.id == npc_id && r.destroyed.is_none())
        {
            router.count += 1;
            return;
        }

        match self.pending.remove(owner) {
            Some(idx) => {
                let router = &mut self.routers[idx];
                router.id = npc_id.to_owned();
                router.first_spawn = Some(timestamp);
                router.count = 1;
            }
            None => {
                debug!(owner, npc_id, "activity tick for an untracked router, skipping");
            }
        }
    }

    /// A destroy signal, matched by npc id. A device that never produced an
    /// activity tick has no npc id to match and stays abandoned.
    pub fn handle_destroy(&mut self, npc_id: &str, timestamp: i64) {
        match self
            .routers
            .iter_mut()
            .find(|r| r.id == npc_id && r.destroyed.is_none())
        {
            Some(router) => router.destroyed = Some(timestamp),
            None => debug!(npc_id, "destroy signal for an untracked router"),
        }
    }

    pub fn routers(&self) -> &[TrackedRouter] {
        &self.routers
    }

    pub fn for_owner(&self, owner: &str) -> Vec<TrackedRouter> {
        self.routers
            .iter()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.routers.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::RouterTracker;

    #[test]
    fn pull_spawn_spawn_destroy() {
        let mut tracker = RouterTracker::new();
        tracker.handle_pull("owner", 1_000);
        tracker.handle_spawn("owner", "npc-1", 5_000);
        tracker.handle_spawn("owner", "npc-1", 9_000);
        tracker.handle_destroy("npc-1", 12_000);

        let routers = tracker.routers();
        assert_eq!(routers.len(), 1);
        assert_eq!(routers[0].count, 2);
        assert_eq!(routers[0].first_spawn, Some(5_000));
        assert_eq!(routers[0].destroyed, Some(12_000));
    }

    #[test]
    fn pull_then_destroy_without_spawn_leaves_first_spawn_unset() {
        let mut tracker = RouterTracker::new();
        tracker.handle_pull("owner", 1_000);
        tracker.handle_destroy("npc-1", 2_000);

        let routers = tracker.routers();
        assert_eq!(routers.len(), 1);
        assert!(routers[0].first_spawn.is_none());
        assert!(routers[0].destroyed.is_none());
    }

    #[test]
    fn new_pull_supersedes_pending_placement() {
        let mut tracker = RouterTracker::new();
        tracker.handle_pull("owner", 1_000);
        tracker.handle_pull("owner", 4_000);
        tracker.handle_spawn("owner", "npc-2", 6_000);

        let routers = tracker.routers();
        assert_eq!(routers.len(), 2);
        // The first placement never activated.
        assert!(routers[0].first_spawn.is_none());
        assert_eq!(routers[1].first_spawn, Some(6_000));
        assert_eq!(routers[1].pulled_at, 4_000);
    }

    #[test]
    fn abandoned_router_is_not_an_error() {
        let mut tracker = RouterTracker::new();
        tracker.handle_pull("owner", 1_000);
        tracker.handle_spawn("owner", "npc-1", 2_000);
        // Session ends with no destroy signal.
        assert!(tracker.routers()[0].destroyed.is_none());
        assert_eq!(tracker.for_owner("owner").len(), 1);
        assert!(tracker.for_owner("someone-else").is_empty());
    }

    #[test]
    fn spawn_for_unknown_owner_is_skipped() {
        let mut tracker = RouterTracker::new();
        tracker.handle_spawn("owner", "npc-9", 2_000);
        assert!(tracker.routers().is_empty());
    }
}
