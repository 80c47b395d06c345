use serde::Serialize;
use tracing::warn;

use crate::events::{EventData, GameEvent};
use crate::loadouts::{self, PlayerClass};

/// Per-class accumulator: wall-clock seconds spent as the class plus the
/// score/kill/death counters attributed while it was active.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassBreakdown {
    pub seconds_as: f64,
    pub score: i64,
    pub kills: u32,
    pub deaths: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MostPlayed {
    pub name: String,
    pub seconds_as: f64,
}

/// Where a player's session time went, one bucket per archetype.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Playtime {
    pub character_id: String,
    pub seconds_online: f64,
    pub infiltrator: ClassBreakdown,
    pub light_assault: ClassBreakdown,
    pub medic: ClassBreakdown,
    pub engineer: ClassBreakdown,
    pub heavy: ClassBreakdown,
    pub max: ClassBreakdown,
    pub most_played: MostPlayed,
}

impl Playtime {
    pub fn bucket_mut(&mut self, class: PlayerClass) -> &mut ClassBreakdown {
        match class {
            PlayerClass::Infiltrator => &mut self.infiltrator,
            PlayerClass::LightAssault => &mut self.light_assault,
            PlayerClass::Medic => &mut self.medic,
            PlayerClass::Engineer => &mut self.engineer,
            PlayerClass::Heavy => &mut self.heavy,
            PlayerClass::Max => &mut self.max,
        }
    }

    pub fn bucket(&self, class: PlayerClass) -> &ClassBreakdown {
        match class {
            PlayerClass::Infiltrator => &self.infiltrator,
            PlayerClass::LightAssault => &self.light_assault,
            PlayerClass::Medic => &self.medic,
            PlayerClass::Engineer => &self.engineer,
            PlayerClass::Heavy => &self.heavy,
            PlayerClass::Max => &self.max,
        }
    }

    fn settle_most_played(&mut self) {
        let mut best_seconds = 0.0;
        let mut best_name = String::new();
        for class in [
            PlayerClass::Infiltrator,
            PlayerClass::LightAssault,
            PlayerClass::Medic,
            PlayerClass::Engineer,
            PlayerClass::Heavy,
            PlayerClass::Max,
        ] {
            let seconds = self.bucket(class).seconds_as;
            if seconds > best_seconds {
                best_seconds = seconds;
                best_name = class.display_name().to_owned();
            }
        }
        self.most_played = MostPlayed {
            name: best_name,
            seconds_as: best_seconds,
        };
    }
}

/// Walk one player's ordered log and attribute elapsed time and counters to
/// the active class.
///
/// Login/logout/capture/defend events are skipped for timing but do not
/// break the walk. Elapsed time accrues only on experience ticks, into the
/// bucket of the *current* event's class: time spent leading up to the tick
/// was spent in that class. An unresolvable loadout id logs a warning and
/// skips that single event.
pub fn class_usage(character_id: &str, events: &[GameEvent]) -> Playtime {
    let mut usage = Playtime {
        character_id: character_id.to_owned(),
        ..Playtime::default()
    };

    let Some(first) = events.first() else {
        return usage;
    };
    let last_ts = events.last().map(|ev| ev.timestamp).unwrap_or(first.timestamp);
    usage.seconds_online = (last_ts - first.timestamp) as f64 / 1000.0;

    let mut prev_tick_ts = first.timestamp;
    for ev in events {
        match ev.data {
            EventData::Capture { .. }
            | EventData::Defend { .. }
            | EventData::Login
            | EventData::Logout => continue,
            _ => {}
        }

        let Some(loadout) = loadouts::lookup(&ev.loadout_id) else {
            warn!(loadout_id = %ev.loadout_id, "unknown loadout id, skipping attribution");
            continue;
        };

        match &ev.data {
            EventData::Exp { amount, .. } => {
                let elapsed = (ev.timestamp - prev_tick_ts) as f64 / 1000.0;
                prev_tick_ts = ev.timestamp;
                let bucket = usage.bucket_mut(loadout.class);
                bucket.seconds_as += elapsed;
                bucket.score += amount;
            }
            EventData::Kill { .. } => {
                usage.bucket_mut(loadout.class).kills += 1;
            }
            EventData::Death { revived: false, .. } => {
                usage.bucket_mut(loadout.class).deaths += 1;
            }
            _ => {}
        }
    }

    usage.settle_most_played();
    usage
}

/// Kills and deaths split by the *opposing* class. Revived deaths land in
/// `score` so they stay visible without counting against the class.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassVersus {
    pub infiltrator: ClassBreakdown,
    pub light_assault: ClassBreakdown,
    pub medic: ClassBreakdown,
    pub engineer: ClassBreakdown,
    pub heavy: ClassBreakdown,
    pub max: ClassBreakdown,
}

impl ClassVersus {
    fn bucket_mut(&mut self, class: PlayerClass) -> &mut ClassBreakdown {
        match class {
            PlayerClass::Infiltrator => &mut self.infiltrator,
            PlayerClass::LightAssault => &mut self.light_assault,
            PlayerClass::Medic => &mut self.medic,
            PlayerClass::Engineer => &mut self.engineer,
            PlayerClass::Heavy => &mut self.heavy,
            PlayerClass::Max => &mut self.max,
        }
    }
}

pub fn class_versus(events: &[GameEvent]) -> ClassVersus {
    let mut versus = ClassVersus::default();
    for ev in events {
        let (is_kill, revived) = match ev.data {
            EventData::Kill { .. } => (true, false),
            EventData::Death { revived, .. } => (false, revived),
            _ => continue,
        };
        if loadouts::lookup(&ev.loadout_id).is_none() {
            warn!(loadout_id = %ev.loadout_id, "unknown source loadout id, skipping");
            continue;
        }
        let Some(target) = loadouts::lookup(&ev.target_loadout_id) else {
            warn!(loadout_id = %ev.target_loadout_id, "unknown target loadout id, skipping");
            continue;
        };
        let bucket = versus.bucket_mut(target.class);
        if is_kill {
            bucket.kills += 1;
        } else if revived {
            bucket.score += 1;
        } else {
            bucket.deaths += 1;
        }
    }
    versus
}
