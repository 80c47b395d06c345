use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::warn;

use crate::class_time::{self, ClassVersus, Playtime};
use crate::correlate;
use crate::events::{EventData, GameEvent};
use crate::experience;
use crate::lookup::{AchievementInfo, CharacterInfo, Directory, WeaponInfo};
use crate::players::TrackedPlayer;
use crate::routers::TrackedRouter;
use crate::stats::{self, Timeslot, TREND_WINDOW_MS};

/// Horizon for the post-revive survival curve, in one-second ticks.
pub const POST_REVIVE_HORIZON_TICKS: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownEntry {
    pub display: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BreakdownArray {
    pub data: Vec<BreakdownEntry>,
    pub total: f64,
}

impl BreakdownArray {
    fn from_counts(counts: HashMap<String, f64>) -> Self {
        let total = counts.values().sum();
        let mut data: Vec<BreakdownEntry> = counts
            .into_iter()
            .map(|(display, amount)| BreakdownEntry { display, amount })
            .collect();
        data.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.display.cmp(&b.display))
        });
        Self { data, total }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpBreakdown {
    pub name: String,
    pub score: i64,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountedRibbon {
    pub id: String,
    pub name: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    Kill,
    Death,
    Revived,
}

#[derive(Debug, Clone, Serialize)]
pub struct Encounter {
    pub timestamp: i64,
    pub kind: EncounterKind,
    pub weapon_name: String,
    pub headshot: bool,
}

/// Head-to-head record against one opponent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerVersus {
    pub character_id: String,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub revives: u32,
    pub weapon_kills: BreakdownArray,
    pub weapon_deaths: BreakdownArray,
    pub encounters: Vec<Encounter>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SurvivalCurves {
    /// Kaplan-Meier curve over death-to-revive latencies.
    pub time_to_revive: Vec<f64>,
    /// Kaplan-Meier curve over revive-to-next-death lifespans.
    pub post_revive_life: Vec<f64>,
    pub revive_samples: usize,
    pub life_samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonalReport {
    pub character_id: String,
    pub name: String,
    pub outfit_tag: String,
    pub seconds_online: f64,
    pub stats: BTreeMap<String, f64>,
    pub calculated: Vec<(String, String)>,
    pub class_usage: Playtime,
    pub class_versus: ClassVersus,
    pub score_breakdown: Vec<ExpBreakdown>,
    pub weapon_kills: BreakdownArray,
    pub weapon_deaths: BreakdownArray,
    pub routers: Vec<TrackedRouter>,
    pub ribbons: Vec<CountedRibbon>,
    pub ribbon_count: u32,
    pub overtime_kpm: Vec<Timeslot>,
    pub overtime_kd: Vec<Timeslot>,
    pub overtime_rpm: Vec<Timeslot>,
    pub survival: SurvivalCurves,
    pub versus: Vec<PlayerVersus>,
}

/// Build the fully-populated per-player report.
///
/// The log must already be revive-linked (the core runs the batch pass
/// before calling in). Metadata fan-outs run concurrently and join at the
/// end; unresolved ids fall back to their placeholder records.
pub async fn generate_personal_report(
    player: &TrackedPlayer,
    routers: Vec<TrackedRouter>,
    directory: &dyn Directory,
) -> Result<PersonalReport> {
    if player.events.is_empty() {
        bail!("no events for {}, nothing to report", player.name);
    }

    let events = &player.events;
    let first_ts = events[0].timestamp;
    let last_ts = events[events.len() - 1].timestamp;
    let seconds_online = (last_ts - first_ts) as f64 / 1000.0;

    let usage = class_time::class_usage(&player.character_id, events);
    let class_versus = class_time::class_versus(events);

    let weapon_ids = collect_weapon_ids(events);
    let opponent_ids = collect_opponent_ids(&player.character_id, events);
    let ribbon_ids: Vec<String> = player.ribbons.iter().map(|(id, _)| id.to_owned()).collect();

    let (characters, weapons, achievements) = tokio::join!(
        directory.characters_by_ids(&opponent_ids),
        directory.weapons_by_ids(&weapon_ids),
        directory.achievements_by_ids(&ribbon_ids),
    );
    let characters = drain_lookup("characters", characters);
    let weapons = drain_lookup("weapons", weapons);
    let achievements = drain_lookup("achievements", achievements);

    let character_names: HashMap<&str, &CharacterInfo> =
        characters.iter().map(|c| (c.id.as_str(), c)).collect();
    let weapon_names: HashMap<&str, &WeaponInfo> =
        weapons.iter().map(|w| (w.id.as_str(), w)).collect();
    let achievement_names: HashMap<&str, &AchievementInfo> =
        achievements.iter().map(|a| (a.id.as_str(), a)).collect();

    let weapon_name = |id: &str| -> String {
        weapon_names
            .get(id)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| WeaponInfo::unknown(id).name)
    };

    let mut stats_table = BTreeMap::new();
    for (key, value) in player.stats.iter() {
        stats_table.insert(key.to_owned(), value);
    }

    let mut ribbons: Vec<CountedRibbon> = player
        .ribbons
        .iter()
        .map(|(id, amount)| CountedRibbon {
            id: id.to_owned(),
            name: achievement_names
                .get(id)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| AchievementInfo::unknown(id).name),
            amount: amount as u32,
        })
        .collect();
    ribbons.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    let ribbon_count = ribbons.iter().map(|r| r.amount).sum();

    let gives_revives = events.iter().any(|ev| match &ev.data {
        EventData::Exp { exp_id, .. } => {
            ev.source_id == player.character_id && experience::is_revive(exp_id)
        }
        _ => false,
    });

    let revive_samples = correlate::time_until_revive(events);
    let life_samples = correlate::post_revive_lifespans(events);
    let survival = SurvivalCurves {
        time_to_revive: stats::kaplan_meier(&revive_samples, None),
        post_revive_life: stats::kaplan_meier(&life_samples, Some(POST_REVIVE_HORIZON_TICKS)),
        revive_samples: revive_samples.len(),
        life_samples: life_samples.len(),
    };

    Ok(PersonalReport {
        character_id: player.character_id.clone(),
        name: player.name.clone(),
        outfit_tag: player.outfit_tag.clone(),
        seconds_online,
        calculated: stats::calculated_stats(&player.stats, &usage, seconds_online),
        stats: stats_table,
        score_breakdown: score_breakdown(events),
        weapon_kills: weapon_breakdown(events, true, &weapon_name),
        weapon_deaths: weapon_breakdown(events, false, &weapon_name),
        routers,
        ribbons,
        ribbon_count,
        overtime_kpm: stats::kills_per_minute_trend(events, TREND_WINDOW_MS),
        overtime_kd: stats::kill_death_trend(events, TREND_WINDOW_MS),
        overtime_rpm: if gives_revives {
            stats::revives_per_minute_trend(events, TREND_WINDOW_MS)
        } else {
            Vec::new()
        },
        survival,
        versus: versus_table(player, events, &character_names, &weapon_name),
        class_usage: usage,
        class_versus,
    })
}

fn drain_lookup<T>(what: &str, outcome: Result<Vec<T>>) -> Vec<T> {
    match outcome {
        Ok(records) => records,
        Err(err) => {
            warn!(?err, what, "metadata lookup failed, reporting with placeholders");
            Vec::new()
        }
    }
}

fn collect_weapon_ids(events: &[GameEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for ev in events {
        let weapon_id = match &ev.data {
            EventData::Kill { weapon_id, .. }
            | EventData::Death { weapon_id, .. }
            | EventData::Teamkill { weapon_id, .. } => weapon_id,
            _ => continue,
        };
        if weapon_id.is_empty() || weapon_id == "0" {
            continue;
        }
        if seen.insert(weapon_id.clone()) {
            ids.push(weapon_id.clone());
        }
    }
    ids
}

fn collect_opponent_ids(character_id: &str, events: &[GameEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for ev in events {
        if ev.source_id != character_id {
            continue;
        }
        if !matches!(
            ev.data,
            EventData::Kill { .. } | EventData::Death { .. }
        ) {
            continue;
        }
        if ev.target_id.is_empty() || ev.target_id == "0" {
            continue;
        }
        if seen.insert(ev.target_id.clone()) {
            ids.push(ev.target_id.clone());
        }
    }
    ids
}

fn score_breakdown(events: &[GameEvent]) -> Vec<ExpBreakdown> {
    let mut by_name: HashMap<&'static str, ExpBreakdown> = HashMap::new();
    for ev in events {
        if let EventData::Exp { exp_id, amount } = &ev.data {
            let def = experience::lookup(exp_id);
            let entry = by_name.entry(def.name).or_insert_with(|| ExpBreakdown {
                name: def.name.to_owned(),
                score: 0,
                amount: 0,
            });
            entry.score += amount;
            entry.amount += 1;
        }
    }
    let mut breakdown: Vec<ExpBreakdown> = by_name.into_values().collect();
    breakdown.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.amount.cmp(&a.amount))
            .then_with(|| a.name.cmp(&b.name))
    });
    breakdown
}

fn weapon_breakdown(
    events: &[GameEvent],
    kills: bool,
    weapon_name: &dyn Fn(&str) -> String,
) -> BreakdownArray {
    let mut counts: HashMap<String, f64> = HashMap::new();
    for ev in events {
        let weapon_id = match &ev.data {
            EventData::Kill { weapon_id, .. } if kills => weapon_id,
            EventData::Death {
                weapon_id,
                revived: false,
                ..
            } if !kills => weapon_id,
            _ => continue,
        };
        *counts.entry(weapon_name(weapon_id)).or_insert(0.0) += 1.0;
    }
    BreakdownArray::from_counts(counts)
}

fn versus_table(
    player: &TrackedPlayer,
    events: &[GameEvent],
    character_names: &HashMap<&str, &CharacterInfo>,
    weapon_name: &dyn Fn(&str) -> String,
) -> Vec<PlayerVersus> {
    let mut table: Vec<PlayerVersus> = Vec::new();
    let mut kill_weapons: HashMap<String, HashMap<String, f64>> = HashMap::new();
    let mut death_weapons: HashMap<String, HashMap<String, f64>> = HashMap::new();

    for ev in events {
        if ev.source_id != player.character_id {
            continue;
        }
        let (weapon_id, headshot, kind) = match &ev.data {
            EventData::Kill {
                weapon_id,
                is_headshot,
            } => (weapon_id, *is_headshot, EncounterKind::Kill),
            EventData::Death {
                weapon_id,
                is_headshot,
                revived,
                ..
            } => (
                weapon_id,
                *is_headshot,
                if *revived {
                    EncounterKind::Revived
                } else {
                    EncounterKind::Death
                },
            ),
            _ => continue,
        };
        if ev.target_id.is_empty() || ev.target_id == "0" {
            continue;
        }

        let idx = match table
            .iter()
            .position(|entry| entry.character_id == ev.target_id)
        {
            Some(idx) => idx,
            None => {
                table.push(PlayerVersus {
                    character_id: ev.target_id.clone(),
                    name: character_names
                        .get(ev.target_id.as_str())
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| CharacterInfo::unknown(&ev.target_id).name),
                    ..PlayerVersus::default()
                });
                table.len() - 1
            }
        };
        let entry = &mut table[idx];

        let resolved = weapon_name(weapon_id);
        match kind {
            EncounterKind::Kill => {
                entry.kills += 1;
                *kill_weapons
                    .entry(ev.target_id.clone())
                    .or_default()
                    .entry(resolved.clone())
                    .or_insert(0.0) += 1.0;
            }
            EncounterKind::Death => {
                entry.deaths += 1;
                *death_weapons
                    .entry(ev.target_id.clone())
                    .or_default()
                    .entry(resolved.clone())
                    .or_insert(0.0) += 1.0;
            }
            EncounterKind::Revived => entry.revives += 1,
        }
        entry.encounters.push(Encounter {
            timestamp: ev.timestamp,
            kind,
            weapon_name: resolved,
            headshot,
        });
    }

    for entry in &mut table {
        if let Some(counts) = kill_weapons.remove(&entry.character_id) {
            entry.weapon_kills = BreakdownArray::from_counts(counts);
        }
        if let Some(counts) = death_weapons.remove(&entry.character_id) {
            entry.weapon_deaths = BreakdownArray::from_counts(counts);
        }
    }
    table
}
