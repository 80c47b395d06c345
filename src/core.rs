use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, trace, warn};

use crate::bus::EventBus;
use crate::config::CoreSettings;
use crate::correlate;
use crate::dedup::DedupQueue;
use crate::events::{EventData, EventKind, GameEvent};
use crate::experience;
use crate::loadouts;
use crate::lookup::{CharacterInfo, Directory};
use crate::players::{PlayerStore, TrackedPlayer};
use crate::protocol::{self, CensusEvent};
use crate::report::{self, PersonalReport};
use crate::routers::RouterTracker;

/// Identities per subscribe request. Large outfits stress the feed socket
/// when subscribed in one message, so roster changes go out in fixed-size
/// chunks in input order.
pub const SUBSCRIBE_CHUNK: usize = 200;

const SUBSCRIBE_EVENT_NAMES: &[&str] = &[
    "GainExperience",
    "AchievementEarned",
    "Death",
    "FacilityControl",
    "ItemAdded",
    "VehicleDestroy",
];

/// Outbound half of the feed socket. Reconnection and backoff live with
/// the socket owner, not here.
pub trait Transport: Send {
    fn send(&self, payload: String) -> Result<()>;
}

/// Session clock. `start`/`stop` stamp it; everything else reads it.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TimeTracking {
    pub running: bool,
    pub start_ms: i64,
    pub end_ms: i64,
}

/// One facility changing hands, kept session-wide for the report surface.
#[derive(Debug, Clone, Serialize)]
pub struct BaseExchange {
    pub facility_id: String,
    pub zone_id: String,
    pub timestamp: i64,
    pub faction_id: String,
    pub previous_faction_id: String,
    pub outfit_id: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionSummary {
    pub added: usize,
    pub skipped: usize,
    pub requests: usize,
}

/// The ingestion, correlation and aggregation engine.
///
/// All mutation funnels through `process_message`, one raw message at a
/// time, whatever channel delivered it. The caller provides the
/// single-writer dispatch (one consumer draining one queue). Reports are
/// pulled after `stop`, against logs no longer being appended to.
pub struct Core {
    pub settings: CoreSettings,
    dedup: DedupQueue,
    pub players: PlayerStore,
    pub routers: RouterTracker,
    pub captures: Vec<BaseExchange>,
    pub player_captures: Vec<GameEvent>,
    pub tracking: TimeTracking,
    bus: EventBus,
    connected: bool,
    transport: Box<dyn Transport>,
}

impl Core {
    pub fn new(settings: CoreSettings, transport: Box<dyn Transport>) -> Self {
        Self {
            settings,
            dedup: DedupQueue::default(),
            players: PlayerStore::new(),
            routers: RouterTracker::new(),
            captures: Vec::new(),
            player_captures: Vec::new(),
            tracking: TimeTracking::default(),
            bus: EventBus::new(),
            connected: false,
            transport,
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Register a listener for one event kind. Dispatch is synchronous and
    /// in registration order, on the ingestion thread.
    pub fn on<F>(&mut self, kind: EventKind, listener: F)
    where
        F: Fn(&GameEvent) + Send + 'static,
    {
        self.bus.on(kind, listener);
    }

    /// Begin the session. Fails while the feed socket is not connected.
    pub fn start(&mut self) -> Result<()> {
        if !self.connected {
            bail!("cannot start tracking: feed transport is not connected");
        }
        let now_ms = Utc::now().timestamp_millis();
        self.tracking.running = true;
        self.tracking.start_ms = now_ms;
        for player in self.players.iter_mut() {
            if player.online {
                player.join_time = now_ms;
            }
        }
        info!(players = self.players.len(), "tracking started");
        Ok(())
    }

    /// End the session and finalize every player's time online.
    pub fn stop(&mut self) {
        if self.tracking.running {
            self.tracking.end_ms = Utc::now().timestamp_millis();
        }
        self.tracking.running = false;
        for player in self.players.iter_mut() {
            player.finalize_online_time();
        }
        info!("tracking stopped");
    }

    /// Drop all session state, keeping the roster subscription-side state
    /// empty as well. Used between sessions, never mid-session.
    pub fn reset(&mut self) {
        self.players.clear();
        self.routers.clear();
        self.captures.clear();
        self.player_captures.clear();
        self.tracking = TimeTracking::default();
    }

    /// Subscribe a batch of identities: resolve enrichment for the new ones
    /// first, open their records, then emit chunked subscribe requests.
    /// Already-tracked identities are skipped, so the call is idempotent.
    pub async fn subscribe(
        &mut self,
        ids: &[String],
        directory: &dyn Directory,
    ) -> Result<SubscriptionSummary> {
        let mut fresh: Vec<String> = Vec::new();
        for id in ids {
            let id = id.trim();
            if id.is_empty() || self.players.contains(id) || fresh.iter().any(|f| f == id) {
                continue;
            }
            fresh.push(id.to_owned());
        }
        let skipped = ids.len() - fresh.len();
        if fresh.is_empty() {
            return Ok(SubscriptionSummary {
                skipped,
                ..SubscriptionSummary::default()
            });
        }

        let resolved = directory
            .characters_by_ids(&fresh)
            .await
            .context("failed resolving characters for subscription")?;

        let now_ms = Utc::now().timestamp_millis();
        for id in &fresh {
            let info = resolved
                .iter()
                .find(|c| &c.id == id)
                .cloned()
                .unwrap_or_else(|| CharacterInfo::unknown(id));
            let mut player =
                TrackedPlayer::new(&info.id, &info.name, &info.faction, &info.outfit_tag);
            if info.online {
                player.handle_login(now_ms);
            }
            self.players.insert(player);
        }

        let mut requests = 0;
        for chunk in fresh.chunks(SUBSCRIBE_CHUNK) {
            let payload = json!({
                "service": "event",
                "action": "subscribe",
                "characters": chunk,
                "eventNames": SUBSCRIBE_EVENT_NAMES,
            });
            self.transport
                .send(payload.to_string())
                .context("failed sending subscribe request")?;
            requests += 1;
        }

        info!(added = fresh.len(), skipped, requests, "roster updated");
        Ok(SubscriptionSummary {
            added: fresh.len(),
            skipped,
            requests,
        })
    }

    /// Re-emit subscribe requests for the whole current roster, used after
    /// the feed socket reconnects and server-side subscriptions are gone.
    pub fn resubscribe(&mut self) -> Result<usize> {
        let ids: Vec<String> = self.players.iter().map(|p| p.character_id.clone()).collect();
        let mut requests = 0;
        for chunk in ids.chunks(SUBSCRIBE_CHUNK) {
            let payload = json!({
                "service": "event",
                "action": "subscribe",
                "characters": chunk,
                "eventNames": SUBSCRIBE_EVENT_NAMES,
            });
            self.transport
                .send(payload.to_string())
                .context("failed re-sending subscribe request")?;
            requests += 1;
        }
        Ok(requests)
    }

    /// Single entry point for every raw feed message, from any channel.
    /// Per-event failures are logged and isolated; nothing propagates out.
    pub fn process_message(&mut self, raw: &str) {
        if !self.dedup.accept(raw) {
            trace!("duplicate feed message dropped");
            return;
        }
        match protocol::classify(raw) {
            Ok(Some(event)) => self.route(event),
            Ok(None) => {}
            Err(err) => warn!(?err, "dropping malformed feed message"),
        }
    }

    fn route(&mut self, event: CensusEvent) {
        match event {
            CensusEvent::Death {
                timestamp,
                attacker_id,
                victim_id,
                attacker_loadout_id,
                victim_loadout_id,
                weapon_id,
                is_headshot,
                zone_id,
            } => {
                let teamkill = attacker_id != victim_id
                    && loadouts::same_faction(&attacker_loadout_id, &victim_loadout_id);

                if let Some(victim) = self.players.get_mut(&victim_id) {
                    victim.stats.increment("Death");
                    if teamkill {
                        victim.stats.increment("Teamkilled");
                    }
                    let ev = GameEvent {
                        timestamp,
                        source_id: victim_id.clone(),
                        target_id: attacker_id.clone(),
                        loadout_id: victim_loadout_id.clone(),
                        target_loadout_id: attacker_loadout_id.clone(),
                        zone_id: zone_id.clone(),
                        data: EventData::Death {
                            weapon_id: weapon_id.clone(),
                            is_headshot,
                            revived: false,
                            revived_event: None,
                        },
                    };
                    victim.append(ev.clone());
                    self.bus.emit(&ev);
                }

                if attacker_id != victim_id {
                    if let Some(attacker) = self.players.get_mut(&attacker_id) {
                        let data = if teamkill {
                            attacker.stats.increment("Teamkill");
                            EventData::Teamkill {
                                weapon_id: weapon_id.clone(),
                                is_headshot,
                            }
                        } else {
                            attacker.stats.increment("Kill");
                            if is_headshot {
                                attacker.stats.increment("Headshot");
                            }
                            EventData::Kill {
                                weapon_id: weapon_id.clone(),
                                is_headshot,
                            }
                        };
                        let ev = GameEvent {
                            timestamp,
                            source_id: attacker_id.clone(),
                            target_id: victim_id.clone(),
                            loadout_id: attacker_loadout_id.clone(),
                            target_loadout_id: victim_loadout_id.clone(),
                            zone_id,
                            data,
                        };
                        attacker.append(ev.clone());
                        self.bus.emit(&ev);
                    }
                }
            }

            CensusEvent::Experience {
                timestamp,
                source_id,
                target_id,
                exp_id,
                amount,
                loadout_id,
                zone_id,
            } => {
                let ev = GameEvent {
                    timestamp,
                    source_id: source_id.clone(),
                    target_id: target_id.clone(),
                    loadout_id,
                    target_loadout_id: String::new(),
                    zone_id,
                    data: EventData::Exp {
                        exp_id: exp_id.clone(),
                        amount,
                    },
                };

                if exp_id == experience::ROUTER_SPAWN {
                    self.routers.handle_spawn(&source_id, &target_id, timestamp);
                } else if exp_id == experience::ROUTER_KILL {
                    self.routers.handle_destroy(&target_id, timestamp);
                }

                if let Some(source) = self.players.get_mut(&source_id) {
                    experience::apply(&mut source.stats, &exp_id);
                    source.score += amount;
                    source.append(ev.clone());
                    self.bus.emit(&ev);
                }

                // A tick aimed at another tracked player also lands on the
                // target's log; that is what places a revive next to the
                // death it answers.
                if target_id != source_id {
                    if let Some(target) = self.players.get_mut(&target_id) {
                        target.append(ev.clone());
                        if experience::is_revive(&exp_id) {
                            target.stats.increment("Revived");
                            let owner = target.character_id.clone();
                            correlate::link_revive_on_append(&mut target.events, &owner);
                        }
                    }
                }
            }

            CensusEvent::VehicleDestroy {
                timestamp,
                attacker_id,
                attacker_loadout_id,
                vehicle_id,
                zone_id,
            } => {
                if let Some(attacker) = self.players.get_mut(&attacker_id) {
                    attacker.stats.increment("Vehicle kill");
                    let ev = GameEvent {
                        timestamp,
                        source_id: attacker_id.clone(),
                        target_id: String::new(),
                        loadout_id: attacker_loadout_id,
                        target_loadout_id: String::new(),
                        zone_id,
                        data: EventData::Vehicle { vehicle_id },
                    };
                    attacker.append(ev.clone());
                    self.bus.emit(&ev);
                }
            }

            CensusEvent::PlayerCapture {
                timestamp,
                character_id,
                facility_id,
                outfit_id: _,
                zone_id,
            } => {
                let ev = GameEvent {
                    timestamp,
                    source_id: character_id.clone(),
                    target_id: String::new(),
                    loadout_id: String::new(),
                    target_loadout_id: String::new(),
                    zone_id,
                    data: EventData::Capture { facility_id },
                };
                self.player_captures.push(ev.clone());
                if let Some(player) = self.players.get_mut(&character_id) {
                    player.stats.increment("Capture");
                    player.append(ev.clone());
                    self.bus.emit(&ev);
                }
            }

            CensusEvent::PlayerDefend {
                timestamp,
                character_id,
                facility_id,
                outfit_id: _,
                zone_id,
            } => {
                let ev = GameEvent {
                    timestamp,
                    source_id: character_id.clone(),
                    target_id: String::new(),
                    loadout_id: String::new(),
                    target_loadout_id: String::new(),
                    zone_id,
                    data: EventData::Defend { facility_id },
                };
                self.player_captures.push(ev.clone());
                if let Some(player) = self.players.get_mut(&character_id) {
                    player.stats.increment("Defend");
                    player.append(ev.clone());
                    self.bus.emit(&ev);
                }
            }

            CensusEvent::FacilityControl {
                timestamp,
                facility_id,
                zone_id,
                old_faction_id,
                new_faction_id,
                outfit_id,
            } => {
                self.captures.push(BaseExchange {
                    facility_id,
                    zone_id,
                    timestamp,
                    faction_id: new_faction_id,
                    previous_faction_id: old_faction_id,
                    outfit_id,
                });
            }

            CensusEvent::Login {
                timestamp,
                character_id,
            } => {
                if let Some(player) = self.players.get_mut(&character_id) {
                    player.handle_login(timestamp);
                    let ev = GameEvent {
                        timestamp,
                        source_id: character_id,
                        target_id: String::new(),
                        loadout_id: String::new(),
                        target_loadout_id: String::new(),
                        zone_id: String::new(),
                        data: EventData::Login,
                    };
                    player.append(ev.clone());
                    self.bus.emit(&ev);
                }
            }

            CensusEvent::Logout {
                timestamp,
                character_id,
            } => {
                if let Some(player) = self.players.get_mut(&character_id) {
                    let ev = GameEvent {
                        timestamp,
                        source_id: character_id,
                        target_id: String::new(),
                        loadout_id: String::new(),
                        target_loadout_id: String::new(),
                        zone_id: String::new(),
                        data: EventData::Logout,
                    };
                    player.append(ev.clone());
                    player.handle_logout();
                    self.bus.emit(&ev);
                }
            }

            CensusEvent::ItemAdded {
                timestamp,
                character_id,
                item_id,
            } => {
                if item_id == experience::ROUTER_ITEM_ID && self.players.contains(&character_id) {
                    self.routers.handle_pull(&character_id, timestamp);
                }
            }

            CensusEvent::Achievement {
                timestamp: _,
                character_id,
                achievement_id,
            } => {
                if achievement_id.is_empty() {
                    debug!(%character_id, "achievement event without an id");
                    return;
                }
                if let Some(player) = self.players.get_mut(&character_id) {
                    player.ribbons.increment(&achievement_id);
                }
            }
        }
    }

    /// Run the authoritative revive-linking pass and build one player's
    /// report. Meant to be called with tracking stopped; a running session
    /// is tolerated but observes the log only up to this moment.
    pub async fn generate_personal_report(
        &mut self,
        character_id: &str,
        directory: &dyn Directory,
    ) -> Result<PersonalReport> {
        if self.tracking.running {
            debug!(character_id, "report requested while tracking is running");
        }
        let routers = self.routers.for_owner(character_id);
        let player = self
            .players
            .get_mut(character_id)
            .with_context(|| format!("character {character_id} is not tracked"))?;
        let owner = player.character_id.clone();
        correlate::link_revives(&mut player.events, &owner);
        report::generate_personal_report(player, routers, directory).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;

    use super::{Core, Transport, SUBSCRIBE_CHUNK};
    use crate::config::CoreSettings;
    use crate::events::EventData;
    use crate::lookup::{AchievementInfo, CharacterInfo, Directory, WeaponInfo};

    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl Transport for RecordingTransport {
        fn send(&self, payload: String) -> Result<()> {
            self.sent.lock().expect("send lock").push(payload);
            Ok(())
        }
    }

    struct OnlineDirectory;

    #[async_trait]
    impl Directory for OnlineDirectory {
        async fn characters_by_ids(&self, ids: &[String]) -> Result<Vec<CharacterInfo>> {
            Ok(ids
                .iter()
                .map(|id| CharacterInfo {
                    id: id.clone(),
                    name: format!("Char{id}"),
                    faction: "VS".to_owned(),
                    outfit_tag: String::new(),
                    online: true,
                })
                .collect())
        }

        async fn weapons_by_ids(&self, _ids: &[String]) -> Result<Vec<WeaponInfo>> {
            Ok(Vec::new())
        }

        async fn achievements_by_ids(&self, _ids: &[String]) -> Result<Vec<AchievementInfo>> {
            Ok(Vec::new())
        }
    }

    fn test_core() -> (Core, RecordingTransport) {
        let transport = RecordingTransport::default();
        let core = Core::new(CoreSettings::default(), Box::new(transport.clone()));
        (core, transport)
    }

    fn death_message(attacker: &str, victim: &str, ts: i64) -> String {
        format!(
            r#"{{"payload":{{"event_name":"Death","attacker_character_id":"{attacker}","attacker_loadout_id":"13","attacker_weapon_id":"7169","character_id":"{victim}","character_loadout_id":"20","is_headshot":"0","timestamp":"{ts}","zone_id":"2"}},"service":"event","type":"serviceMessage"}}"#
        )
    }

    fn revive_message(medic: &str, target: &str, ts: i64) -> String {
        format!(
            r#"{{"payload":{{"event_name":"GainExperience","character_id":"{medic}","experience_id":"7","loadout_id":"18","other_id":"{target}","amount":"75","timestamp":"{ts}","zone_id":"2"}},"service":"event","type":"serviceMessage"}}"#
        )
    }

    async fn subscribe(core: &mut Core, ids: &[&str]) {
        let ids: Vec<String> = ids.iter().map(|s| (*s).to_owned()).collect();
        core.subscribe(&ids, &OnlineDirectory).await.expect("subscribe");
    }

    #[tokio::test]
    async fn duplicate_message_mutates_state_once() {
        let (mut core, _transport) = test_core();
        subscribe(&mut core, &["victim"]).await;

        let raw = death_message("attacker", "victim", 100);
        core.process_message(&raw);
        core.process_message(&raw);

        let victim = core.players.get("victim").expect("victim");
        assert_eq!(victim.events.len(), 1);
        assert_eq!(victim.stats.get("Death"), 1.0);
    }

    #[tokio::test]
    async fn roster_subscription_is_idempotent_and_chunked() {
        let (mut core, transport) = test_core();
        subscribe(&mut core, &["a", "b"]).await;
        subscribe(&mut core, &["b", "c"]).await;

        assert_eq!(core.players.len(), 3);
        let sent = transport.sent.lock().expect("sent lock");
        assert_eq!(sent.len(), 2);
        // The second request only names the genuinely new identity.
        assert!(sent[1].contains("\"c\""));
        assert!(!sent[1].contains("\"b\""));
    }

    #[tokio::test]
    async fn large_roster_changes_chunk_deterministically() {
        let (mut core, transport) = test_core();
        let ids: Vec<String> = (0..450).map(|i| format!("char-{i}")).collect();
        let summary = core.subscribe(&ids, &OnlineDirectory).await.expect("subscribe");
        assert_eq!(summary.added, 450);
        assert_eq!(summary.requests, 3);

        let sent = transport.sent.lock().expect("sent lock");
        let first: serde_json::Value = serde_json::from_str(&sent[0]).expect("json");
        let names = first["characters"].as_array().expect("characters");
        assert_eq!(names.len(), SUBSCRIBE_CHUNK);
        assert_eq!(names[0], "char-0");
    }

    #[tokio::test]
    async fn start_requires_connected_transport() {
        let (mut core, _transport) = test_core();
        assert!(core.start().is_err());
        core.set_connected(true);
        assert!(core.start().is_ok());
        assert!(core.tracking.running);
    }

    #[tokio::test]
    async fn death_fans_out_to_attacker_and_victim() {
        let (mut core, _transport) = test_core();
        subscribe(&mut core, &["attacker", "victim"]).await;

        core.process_message(&death_message("attacker", "victim", 100));

        let attacker = core.players.get("attacker").expect("attacker");
        assert_eq!(attacker.stats.get("Kill"), 1.0);
        assert!(matches!(
            attacker.events[0].data,
            EventData::Kill { .. }
        ));
        let victim = core.players.get("victim").expect("victim");
        assert_eq!(victim.stats.get("Death"), 1.0);
    }

    #[tokio::test]
    async fn same_faction_death_is_a_teamkill() {
        let (mut core, _transport) = test_core();
        subscribe(&mut core, &["attacker", "victim"]).await;

        let raw = format!(
            r#"{{"payload":{{"event_name":"Death","attacker_character_id":"attacker","attacker_loadout_id":"20","attacker_weapon_id":"7169","character_id":"victim","character_loadout_id":"18","is_headshot":"0","timestamp":"100","zone_id":"2"}},"service":"event","type":"serviceMessage"}}"#
        );
        core.process_message(&raw);

        let attacker = core.players.get("attacker").expect("attacker");
        assert_eq!(attacker.stats.get("Teamkill"), 1.0);
        assert_eq!(attacker.stats.get("Kill"), 0.0);
        let victim = core.players.get("victim").expect("victim");
        assert_eq!(victim.stats.get("Teamkilled"), 1.0);
    }

    #[tokio::test]
    async fn revive_lands_on_target_log_and_links_the_death() {
        let (mut core, _transport) = test_core();
        subscribe(&mut core, &["medic", "victim"]).await;

        core.process_message(&death_message("enemy", "victim", 100));
        core.process_message(&revive_message("medic", "victim", 105));

        let medic = core.players.get("medic").expect("medic");
        assert_eq!(medic.stats.get("Revive"), 1.0);
        assert_eq!(medic.score, 75);

        let victim = core.players.get("victim").expect("victim");
        assert_eq!(victim.stats.get("Revived"), 1.0);
        assert_eq!(victim.events.len(), 2);
        assert!(matches!(
            victim.events[0].data,
            EventData::Death { revived: true, .. }
        ));
    }

    #[tokio::test]
    async fn squad_revive_chains_into_parent_stat() {
        let (mut core, _transport) = test_core();
        subscribe(&mut core, &["medic"]).await;

        let raw = format!(
            r#"{{"payload":{{"event_name":"GainExperience","character_id":"medic","experience_id":"53","loadout_id":"18","other_id":"someone","amount":"100","timestamp":"100","zone_id":"2"}},"service":"event","type":"serviceMessage"}}"#
        );
        core.process_message(&raw);

        let medic = core.players.get("medic").expect("medic");
        assert_eq!(medic.stats.get("Squad revive"), 1.0);
        assert_eq!(medic.stats.get("Revive"), 1.0);
    }

    #[tokio::test]
    async fn router_lifecycle_flows_from_feed_messages() {
        let (mut core, _transport) = test_core();
        subscribe(&mut core, &["owner"]).await;

        let pull = r#"{"payload":{"event_name":"ItemAdded","character_id":"owner","item_id":"6003880","timestamp":"100","zone_id":"2"},"service":"event","type":"serviceMessage"}"#;
        core.process_message(pull);
        let spawn = |ts: i64| {
            format!(
                r#"{{"payload":{{"event_name":"GainExperience","character_id":"owner","experience_id":"1410","loadout_id":"18","other_id":"npc-7","amount":"5","timestamp":"{ts}","zone_id":"2"}},"service":"event","type":"serviceMessage"}}"#
            )
        };
        core.process_message(&spawn(110));
        core.process_message(&spawn(120));
        let destroy = r#"{"payload":{"event_name":"GainExperience","character_id":"enemy","experience_id":"1409","loadout_id":"13","other_id":"npc-7","amount":"100","timestamp":"130","zone_id":"2"},"service":"event","type":"serviceMessage"}"#;
        core.process_message(destroy);

        let routers = core.routers.routers();
        assert_eq!(routers.len(), 1);
        assert_eq!(routers[0].count, 2);
        assert_eq!(routers[0].first_spawn, Some(110_000));
        assert_eq!(routers[0].destroyed, Some(130_000));
    }

    #[tokio::test]
    async fn logout_finalizes_seconds_online() {
        let (mut core, _transport) = test_core();
        subscribe(&mut core, &["player"]).await;

        let login = r#"{"payload":{"event_name":"PlayerLogin","character_id":"player","timestamp":"100"},"service":"event","type":"serviceMessage"}"#;
        let kill = death_message("player", "enemy", 130);
        let logout = r#"{"payload":{"event_name":"PlayerLogout","character_id":"player","timestamp":"160"},"service":"event","type":"serviceMessage"}"#;
        core.process_message(login);
        core.process_message(&kill);
        core.process_message(logout);

        let player = core.players.get("player").expect("player");
        assert!(!player.online);
        assert_eq!(player.seconds_online, 60.0);
    }
}
