use std::collections::HashMap;

use crate::events::GameEvent;
use crate::stat_map::StatMap;

/// Per-identity mutable record: the append-ordered event log, derived
/// counters and session timing. Created when an identity is first
/// subscribed and only cleared at session reset, never destroyed
/// mid-session.
#[derive(Debug, Clone, Default)]
pub struct TrackedPlayer {
    pub character_id: String,
    pub name: String,
    pub faction: String,
    pub outfit_tag: String,
    pub online: bool,
    /// Epoch ms the player was first seen online this session. Overwritten
    /// by the first/last event timestamps once the log is finalized.
    pub join_time: i64,
    /// Derived, not authoritative until `finalize_online_time` runs.
    pub seconds_online: f64,
    pub score: i64,
    pub events: Vec<GameEvent>,
    pub stats: StatMap,
    pub ribbons: StatMap,
}

impl TrackedPlayer {
    pub fn new(character_id: &str, name: &str, faction: &str, outfit_tag: &str) -> Self {
        Self {
            character_id: character_id.to_owned(),
            name: name.to_owned(),
            faction: faction.to_owned(),
            outfit_tag: outfit_tag.to_owned(),
            ..Self::default()
        }
    }

    /// O(1) append. The store trusts per-player timestamp consistency of
    /// the feed; ordering is not re-checked here.
    pub fn append(&mut self, event: GameEvent) -> usize {
        self.events.push(event);
        self.events.len() - 1
    }

    pub fn handle_login(&mut self, now_ms: i64) {
        self.online = true;
        self.join_time = now_ms;
    }

    pub fn handle_logout(&mut self) {
        self.online = false;
        self.finalize_online_time();
    }

    /// Recompute `join_time`/`seconds_online` from the log endpoints. An
    /// empty log reads as zero seconds online.
    pub fn finalize_online_time(&mut self) {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => {
                self.join_time = first.timestamp;
                self.seconds_online = (last.timestamp - first.timestamp) as f64 / 1000.0;
            }
            _ => {
                self.seconds_online = 0.0;
            }
        }
    }
}

/// All tracked players keyed by character id.
#[derive(Debug, Default)]
pub struct PlayerStore {
    players: HashMap<String, TrackedPlayer>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: TrackedPlayer) {
        self.players.insert(player.character_id.clone(), player);
    }

    pub fn contains(&self, character_id: &str) -> bool {
        self.players.contains_key(character_id)
    }

    pub fn get(&self, character_id: &str) -> Option<&TrackedPlayer> {
        self.players.get(character_id)
    }

    pub fn get_mut(&mut self, character_id: &str) -> Option<&mut TrackedPlayer> {
        self.players.get_mut(character_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedPlayer> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedPlayer> {
        self.players.values_mut()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
