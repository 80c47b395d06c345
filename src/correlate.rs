use std::collections::HashSet;

use tracing::error;

use crate::events::{EventData, GameEvent};
use crate::experience;

/// Latest a revive may trail its death and still be linked. Feed delivery
/// gaps occasionally hand a revive to the wrong earlier death; the cap
/// bounds that misattribution without eliminating it.
pub const REVIVE_WINDOW_MS: i64 = 40_000;

/// Batch pass over one player's log: give every unlinked death its revive.
///
/// For each death without a link, scan forward for the next unclaimed
/// revive-class experience event targeting the log's owner within the
/// window. Linking is one-to-one; a revive claimed by an earlier death is
/// never reused. Deaths with no match inside the window stay terminal.
/// Idempotent, safe to re-run at report time.
pub fn link_revives(events: &mut [GameEvent], owner_id: &str) {
    let mut claimed: HashSet<usize> = events
        .iter()
        .filter_map(|ev| match ev.data {
            EventData::Death {
                revived_event: Some(idx),
                ..
            } => Some(idx),
            _ => None,
        })
        .collect();

    for i in 0..events.len() {
        let death_ts = match events[i].data {
            EventData::Death {
                revived: false,
                revived_event: None,
                ..
            } => events[i].timestamp,
            _ => continue,
        };

        let mut found = None;
        for (j, candidate) in events.iter().enumerate().skip(i + 1) {
            if claimed.contains(&j) {
                continue;
            }
            if candidate.timestamp < death_ts
                || candidate.timestamp - death_ts > REVIVE_WINDOW_MS
            {
                continue;
            }
            if let EventData::Exp { ref exp_id, .. } = candidate.data {
                if experience::is_revive(exp_id) && candidate.target_id == owner_id {
                    found = Some(j);
                    break;
                }
            }
        }

        if let Some(j) = found {
            claimed.insert(j);
            if let EventData::Death {
                revived,
                revived_event,
                ..
            } = &mut events[i].data
            {
                *revived = true;
                *revived_event = Some(j);
            }
        }
    }
}

/// Incremental counterpart, run when the event just appended to the log is
/// a revive experience targeting the owner: claim the most recent unlinked
/// death inside the window so mid-session state stays current.
pub fn link_revive_on_append(events: &mut [GameEvent], owner_id: &str) {
    let Some(last) = events.len().checked_sub(1) else {
        return;
    };
    let revive_ts = match &events[last].data {
        EventData::Exp { exp_id, .. }
            if experience::is_revive(exp_id) && events[last].target_id == owner_id =>
        {
            events[last].timestamp
        }
        _ => return,
    };

    for i in (0..last).rev() {
        let (death_ts, linkable) = match events[i].data {
            EventData::Death {
                revived,
                revived_event,
                ..
            } => (events[i].timestamp, !revived && revived_event.is_none()),
            _ => continue,
        };
        if linkable && revive_ts >= death_ts && revive_ts - death_ts <= REVIVE_WINDOW_MS {
            if let EventData::Death {
                revived,
                revived_event,
                ..
            } = &mut events[i].data
            {
                *revived = true;
                *revived_event = Some(last);
            }
        }
        // Whether linked, already claimed or outside the window, deaths
        // older than the most recent one are not candidates for this revive.
        return;
    }
}

/// Longest run of kills not broken by an unrevived death. A revived death
/// keeps the streak alive; ties report the numeric maximum only.
pub fn longest_kill_streak(events: &[GameEvent]) -> u32 {
    let mut current: u32 = 0;
    let mut longest: u32 = 0;
    for ev in events {
        match ev.data {
            EventData::Kill { .. } => {
                current += 1;
                longest = longest.max(current);
            }
            EventData::Death { revived, .. } => {
                if !revived {
                    current = 0;
                }
            }
            _ => {}
        }
    }
    longest
}

/// Seconds each life lasted. An unrevived death closes a life measured from
/// the previous life-closing event (or the first event); revived deaths do
/// not close a life.
pub fn life_expectancies(events: &[GameEvent]) -> Vec<f64> {
    let Some(first) = events.first() else {
        return Vec::new();
    };
    let mut start = first.timestamp;
    let mut lives = Vec::new();
    for ev in events {
        if ev.is_unrevived_death() {
            lives.push((ev.timestamp - start) as f64 / 1000.0);
            start = ev.timestamp;
        }
    }
    lives
}

/// Seconds from each linked death to its revive, longest first. Samples
/// past the window are dropped as misattributed links.
pub fn time_until_revive(events: &[GameEvent]) -> Vec<f64> {
    let mut samples = Vec::new();
    for ev in events {
        if let Some(revive_ts) = ev.revive_timestamp(events) {
            let diff = (revive_ts - ev.timestamp) as f64 / 1000.0;
            if diff <= REVIVE_WINDOW_MS as f64 / 1000.0 {
                samples.push(diff);
            }
        }
    }
    samples.sort_by(|a, b| b.total_cmp(a));
    samples
}

/// Seconds each revived life lasted: from the linked revive to the
/// source's next death. A linked death with no later death on the log is
/// a dropped sample, not an error raised to the caller.
pub fn post_revive_lifespans(events: &[GameEvent]) -> Vec<f64> {
    let mut samples = Vec::new();
    for (i, ev) in events.iter().enumerate() {
        let Some(revive_ts) = ev.revive_timestamp(events) else {
            continue;
        };
        let next_death = events
            .iter()
            .skip(i + 1)
            .find(|later| matches!(later.data, EventData::Death { .. }));
        match next_death {
            Some(later) => samples.push((later.timestamp - revive_ts) as f64 / 1000.0),
            None => {
                error!(
                    source = %ev.source_id,
                    timestamp = ev.timestamp,
                    "no death follows a linked revive, dropping lifespan sample"
                );
            }
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::{
        life_expectancies, link_revive_on_append, link_revives, longest_kill_streak,
        post_revive_lifespans, time_until_revive,
    };
    use crate::events::{EventData, GameEvent};

    const OWNER: &str = "5428010";

    fn event(timestamp: i64, data: EventData) -> GameEvent {
        GameEvent {
            timestamp,
            source_id: OWNER.to_owned(),
            target_id: String::new(),
            loadout_id: "6".to_owned(),
            target_loadout_id: "20".to_owned(),
            zone_id: "2".to_owned(),
            data,
        }
    }

    fn death(timestamp: i64) -> GameEvent {
        event(
            timestamp,
            EventData::Death {
                weapon_id: "7169".to_owned(),
                is_headshot: false,
                revived: false,
                revived_event: None,
            },
        )
    }

    fn kill(timestamp: i64) -> GameEvent {
        event(
            timestamp,
            EventData::Kill {
                weapon_id: "7169".to_owned(),
                is_headshot: false,
            },
        )
    }

    fn revive(timestamp: i64) -> GameEvent {
        let mut ev = event(
            timestamp,
            EventData::Exp {
                exp_id: "7".to_owned(),
                amount: 75,
            },
        );
        ev.source_id = "5428012".to_owned();
        ev.target_id = OWNER.to_owned();
        ev
    }

    fn revived_flag(ev: &GameEvent) -> bool {
        matches!(ev.data, EventData::Death { revived: true, .. })
    }

    #[test]
    fn links_revive_inside_window() {
        let mut log = vec![death(1_000), revive(6_000)];
        link_revives(&mut log, OWNER);
        assert!(revived_flag(&log[0]));
        assert_eq!(log[0].revive_timestamp(&log), Some(6_000));
    }

    #[test]
    fn ignores_revive_outside_window() {
        let mut log = vec![death(1_000), revive(46_000)];
        link_revives(&mut log, OWNER);
        assert!(!revived_flag(&log[0]));
    }

    #[test]
    fn linking_is_one_to_one() {
        let mut log = vec![death(1_000), death(2_000), revive(6_000)];
        link_revives(&mut log, OWNER);
        assert!(revived_flag(&log[0]));
        assert!(!revived_flag(&log[1]));
    }

    #[test]
    fn batch_pass_is_idempotent() {
        let mut log = vec![death(1_000), revive(6_000), death(10_000), revive(12_000)];
        link_revives(&mut log, OWNER);
        link_revives(&mut log, OWNER);
        assert_eq!(log[0].revive_timestamp(&log), Some(6_000));
        assert_eq!(log[2].revive_timestamp(&log), Some(12_000));
    }

    #[test]
    fn incremental_link_claims_most_recent_death() {
        let mut log = vec![death(1_000)];
        log.push(revive(6_000));
        link_revive_on_append(&mut log, OWNER);
        assert!(revived_flag(&log[0]));
        assert_eq!(log[0].revive_timestamp(&log), Some(6_000));
    }

    #[test]
    fn incremental_link_respects_window() {
        let mut log = vec![death(1_000)];
        log.push(revive(50_000));
        link_revive_on_append(&mut log, OWNER);
        assert!(!revived_flag(&log[0]));
    }

    #[test]
    fn streak_resets_on_unrevived_death_only() {
        let mut log = vec![
            kill(1_000),
            kill(2_000),
            kill(3_000),
            death(4_000),
            kill(5_000),
        ];
        assert_eq!(longest_kill_streak(&log), 3);

        // A revived death keeps the streak going.
        log.insert(4, revive(4_500));
        link_revives(&mut log, OWNER);
        assert_eq!(longest_kill_streak(&log), 4);
    }

    #[test]
    fn trailing_streak_counts() {
        let log = vec![death(1_000), kill(2_000), kill(3_000)];
        assert_eq!(longest_kill_streak(&log), 2);
    }

    #[test]
    fn lives_close_on_unrevived_deaths() {
        let mut log = vec![
            kill(0),
            death(10_000),
            revive(12_000),
            death(30_000),
            death(90_000),
        ];
        link_revives(&mut log, OWNER);
        // First death is revived, so the first life closes at 30s and the
        // second at 90s.
        assert_eq!(life_expectancies(&log), vec![30.0, 60.0]);
    }

    #[test]
    fn revive_latency_samples_sort_longest_first() {
        let mut log = vec![death(1_000), revive(6_000), death(20_000), revive(22_000)];
        link_revives(&mut log, OWNER);
        assert_eq!(time_until_revive(&log), vec![5.0, 2.0]);
    }

    #[test]
    fn post_revive_lifespans_measure_to_next_death() {
        let mut log = vec![death(1_000), revive(6_000), death(16_000)];
        link_revives(&mut log, OWNER);
        assert_eq!(post_revive_lifespans(&log), vec![10.0]);

        // A linked death with no later death drops the sample.
        let mut open = vec![death(1_000), revive(6_000)];
        link_revives(&mut open, OWNER);
        assert!(post_revive_lifespans(&open).is_empty());
    }
}
