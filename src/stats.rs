use serde::Serialize;

use crate::class_time::Playtime;
use crate::events::{EventData, GameEvent};
use crate::stat_map::StatMap;

/// Ratios are suppressed below this many kills; small samples produce
/// noisy extremes rather than information.
pub const RATIO_MIN_KILLS: f64 = 25.0;

/// Width of one trend window.
pub const TREND_WINDOW_MS: i64 = 300_000;

#[derive(Debug, Clone, Serialize)]
pub struct Timeslot {
    pub start_ms: i64,
    pub value: f64,
}

/// Partition a log into fixed-width windows from its first timestamp and
/// compute one value per window, empty windows included.
pub fn trend<F>(events: &[GameEvent], width_ms: i64, mut value: F) -> Vec<Timeslot>
where
    F: FnMut(&[GameEvent]) -> f64,
{
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Vec::new();
    };
    debug_assert!(width_ms > 0);

    let mut slots = Vec::new();
    let mut start = first.timestamp;
    while start <= last.timestamp {
        let end = start + width_ms;
        let lo = events.partition_point(|ev| ev.timestamp < start);
        let hi = events.partition_point(|ev| ev.timestamp < end);
        slots.push(Timeslot {
            start_ms: start,
            value: value(&events[lo..hi]),
        });
        start = end;
    }
    slots
}

pub fn kills_per_minute_trend(events: &[GameEvent], width_ms: i64) -> Vec<Timeslot> {
    let minutes = width_ms as f64 / 60_000.0;
    trend(events, width_ms, |window| {
        let kills = window
            .iter()
            .filter(|ev| matches!(ev.data, EventData::Kill { .. }))
            .count();
        kills as f64 / minutes.max(1.0)
    })
}

pub fn kill_death_trend(events: &[GameEvent], width_ms: i64) -> Vec<Timeslot> {
    trend(events, width_ms, |window| {
        let kills = window
            .iter()
            .filter(|ev| matches!(ev.data, EventData::Kill { .. }))
            .count();
        let deaths = window.iter().filter(|ev| ev.is_unrevived_death()).count();
        kills as f64 / (deaths.max(1)) as f64
    })
}

pub fn revives_per_minute_trend(events: &[GameEvent], width_ms: i64) -> Vec<Timeslot> {
    let minutes = width_ms as f64 / 60_000.0;
    trend(events, width_ms, |window| {
        let revives = window
            .iter()
            .filter(|ev| match &ev.data {
                EventData::Exp { exp_id, .. } => crate::experience::is_revive(exp_id),
                _ => false,
            })
            .count();
        revives as f64 / minutes.max(1.0)
    })
}

/// Product-limit survival estimator.
///
/// For each integer tick up to the horizon (default: the largest observed
/// duration), the fraction of the still-at-risk population surviving past
/// the tick, accumulated as a product. The at-risk set is re-evaluated per
/// tick, so the output is non-increasing and stays inside [0, 1].
pub fn kaplan_meier(samples: &[f64], horizon: Option<usize>) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let ticks = horizon.unwrap_or_else(|| {
        samples
            .iter()
            .fold(0.0_f64, |acc, sample| acc.max(*sample))
            .ceil() as usize
    });

    let mut probs = Vec::with_capacity(ticks);
    let mut at_risk = samples.len();
    for tick in 0..ticks {
        let survived = samples.iter().filter(|s| **s > tick as f64).count();
        probs.push(survived as f64 / at_risk.max(1) as f64);
        at_risk = survived;
    }

    let mut cumulative = 1.0;
    for prob in &mut probs {
        *prob *= cumulative;
        cumulative = *prob;
    }
    probs
}

/// The derived ratio table of the personal report. All denominators follow
/// the `max(d, 1)` convention; K/D and HSR are suppressed below
/// `RATIO_MIN_KILLS`.
pub fn calculated_stats(
    stats: &StatMap,
    usage: &Playtime,
    seconds_online: f64,
) -> Vec<(String, String)> {
    let kills = stats.get("Kill");
    let deaths = stats.get("Death");
    let assists = stats.get("Kill assist");
    let headshots = stats.get("Headshot");
    let revives = stats.get("Revive");

    let minutes = (seconds_online / 60.0).max(1.0);
    let medic_minutes = (usage.medic.seconds_as / 60.0).max(1.0);
    let medic_deaths = f64::from(usage.medic.deaths).max(1.0);

    let kd = if kills < RATIO_MIN_KILLS {
        0.0
    } else {
        kills / deaths.max(1.0)
    };
    let hsr = if kills < RATIO_MIN_KILLS {
        0.0
    } else {
        headshots / kills.max(1.0) * 100.0
    };

    vec![
        ("KPM".to_owned(), format!("{:.2}", kills / minutes)),
        ("K/D".to_owned(), format!("{kd:.2}")),
        (
            "KA/D".to_owned(),
            format!("{:.2}", (kills + assists) / deaths.max(1.0)),
        ),
        ("HSR".to_owned(), format!("{hsr:.2}%")),
        (
            "KR/D".to_owned(),
            format!(
                "{:.2}",
                (f64::from(usage.medic.kills) + revives) / medic_deaths
            ),
        ),
        ("R/D".to_owned(), format!("{:.2}", revives / medic_deaths)),
        ("RPM".to_owned(), format!("{:.2}", revives / medic_minutes)),
    ]
}
