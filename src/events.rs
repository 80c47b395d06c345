use serde::{Deserialize, Serialize};

/// Closed set of event types the tracker understands. Used as the key for
/// typed listener registration and for cheap kind checks without matching
/// on the full payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Exp,
    Kill,
    Death,
    Teamkill,
    Capture,
    Defend,
    Vehicle,
    Login,
    Logout,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Exp,
        EventKind::Kill,
        EventKind::Death,
        EventKind::Teamkill,
        EventKind::Capture,
        EventKind::Defend,
        EventKind::Vehicle,
        EventKind::Login,
        EventKind::Logout,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            EventKind::Exp => 0,
            EventKind::Kill => 1,
            EventKind::Death => 2,
            EventKind::Teamkill => 3,
            EventKind::Capture => 4,
            EventKind::Defend => 5,
            EventKind::Vehicle => 6,
            EventKind::Login => 7,
            EventKind::Logout => 8,
        }
    }
}

/// Variant-specific payload of a tracked event.
///
/// `Death.revived_event` is a weak back-reference: the index of the linked
/// revive experience event in the owning player's log. It is set only by the
/// correlation engine and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventData {
    Exp {
        exp_id: String,
        amount: i64,
    },
    Kill {
        weapon_id: String,
        is_headshot: bool,
    },
    Death {
        weapon_id: String,
        is_headshot: bool,
        revived: bool,
        #[serde(skip)]
        revived_event: Option<usize>,
    },
    Teamkill {
        weapon_id: String,
        is_headshot: bool,
    },
    Capture {
        facility_id: String,
    },
    Defend {
        facility_id: String,
    },
    Vehicle {
        vehicle_id: String,
    },
    Login,
    Logout,
}

impl EventData {
    pub fn kind(&self) -> EventKind {
        match self {
            EventData::Exp { .. } => EventKind::Exp,
            EventData::Kill { .. } => EventKind::Kill,
            EventData::Death { .. } => EventKind::Death,
            EventData::Teamkill { .. } => EventKind::Teamkill,
            EventData::Capture { .. } => EventKind::Capture,
            EventData::Defend { .. } => EventKind::Defend,
            EventData::Vehicle { .. } => EventKind::Vehicle,
            EventData::Login => EventKind::Login,
            EventData::Logout => EventKind::Logout,
        }
    }
}

/// One event on a player's log: common envelope plus the typed payload.
///
/// Timestamps are epoch milliseconds as delivered by the feed. Identity and
/// loadout references are provider ids, never owned records. Events are
/// immutable once appended except for the `revived`/`revived_event` fields
/// of a death, which the correlation engine sets in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub timestamp: i64,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub target_id: String,
    #[serde(default)]
    pub loadout_id: String,
    #[serde(default)]
    pub target_loadout_id: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(flatten)]
    pub data: EventData,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        self.data.kind()
    }

    pub fn is_unrevived_death(&self) -> bool {
        matches!(self.data, EventData::Death { revived: false, .. })
    }

    /// Timestamp of the linked revive, if this is a linked death and the
    /// index still resolves in the owning log.
    pub fn revive_timestamp(&self, log: &[GameEvent]) -> Option<i64> {
        match self.data {
            EventData::Death {
                revived_event: Some(idx),
                ..
            } => log.get(idx).map(|ev| ev.timestamp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventData, EventKind, GameEvent};

    fn death(timestamp: i64) -> GameEvent {
        GameEvent {
            timestamp,
            source_id: "5428010".to_owned(),
            target_id: "5428011".to_owned(),
            loadout_id: "6".to_owned(),
            target_loadout_id: "20".to_owned(),
            zone_id: "2".to_owned(),
            data: EventData::Death {
                weapon_id: "7169".to_owned(),
                is_headshot: false,
                revived: false,
                revived_event: None,
            },
        }
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(death(0).kind(), EventKind::Death);
        let login = GameEvent {
            timestamp: 10,
            source_id: "5428010".to_owned(),
            target_id: String::new(),
            loadout_id: String::new(),
            target_loadout_id: String::new(),
            zone_id: String::new(),
            data: EventData::Login,
        };
        assert_eq!(login.kind(), EventKind::Login);
    }

    #[test]
    fn serializes_with_snake_case_tag() {
        let raw = serde_json::to_string(&death(1000)).expect("serialize");
        assert!(raw.contains(r#""type":"death""#));
        assert!(raw.contains(r#""revived":false"#));
        assert!(!raw.contains("revived_event"));
    }

    #[test]
    fn revive_timestamp_resolves_through_log_index() {
        let mut ev = death(1000);
        if let EventData::Death { revived_event, .. } = &mut ev.data {
            *revived_event = Some(1);
        }
        let log = vec![
            ev.clone(),
            GameEvent {
                timestamp: 6000,
                source_id: "5428012".to_owned(),
                target_id: "5428010".to_owned(),
                loadout_id: "4".to_owned(),
                target_loadout_id: String::new(),
                zone_id: "2".to_owned(),
                data: EventData::Exp {
                    exp_id: "7".to_owned(),
                    amount: 75,
                },
            },
        ];
        assert_eq!(ev.revive_timestamp(&log), Some(6000));
        assert_eq!(death(1000).revive_timestamp(&log), None);
    }
}
