use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};

use outfit_tracker::{CensusDirectory, Core, CoreSettings, EventKind, Transport};

/// Messages from the socket workers into the single dispatch loop. Every
/// channel funnels into the same queue, so all core mutation is serialized.
#[derive(Debug)]
enum Inbound {
    Raw { channel: &'static str, text: String },
    Connected { channel: &'static str },
    Disconnected { channel: &'static str },
    Shutdown,
}

/// Outbound half of the tracked feed socket, handed to the core for
/// subscription requests.
struct SocketTransport {
    out: mpsc::UnboundedSender<String>,
}

impl Transport for SocketTransport {
    fn send(&self, payload: String) -> Result<()> {
        self.out
            .send(payload)
            .map_err(|_| anyhow!("tracked feed socket is gone"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (settings, settings_path) = CoreSettings::load_or_create()?;
    info!(path = %settings_path.display(), "loaded settings");
    if settings.track_ids.is_empty() {
        warn!("no track_ids configured; the tracker will idle until the settings file names characters");
    }

    let uri = format!(
        "wss://push.planetside2.com/streaming?environment=ps2&service-id={}",
        settings.service_id
    );

    let (tx, rx) = crossbeam_channel::unbounded::<Inbound>();
    let (subscribe_tx, subscribe_rx) = mpsc::unbounded_channel::<String>();

    spawn_socket_worker("tracked", uri.clone(), Vec::new(), Some(subscribe_rx), tx.clone());
    spawn_socket_worker(
        "logins",
        uri.clone(),
        vec![world_subscription(&settings.server_id, &["PlayerLogin", "PlayerLogout"])],
        None,
        tx.clone(),
    );
    spawn_socket_worker(
        "facility",
        uri.clone(),
        vec![world_subscription(
            &settings.server_id,
            &["FacilityControl", "PlayerFacilityCapture", "PlayerFacilityDefend"],
        )],
        None,
        tx.clone(),
    );
    if settings.debug {
        spawn_socket_worker(
            "debug",
            uri,
            vec![world_subscription(&settings.server_id, &["all"])],
            None,
            tx.clone(),
        );
    }

    let directory = CensusDirectory::new(&settings.service_id)?;
    let mut core = Core::new(settings, Box::new(SocketTransport { out: subscribe_tx }));
    if core.settings.debug {
        core.on(EventKind::Kill, |ev| {
            debug!(source = %ev.source_id, target = %ev.target_id, "kill dispatched");
        });
        core.on(EventKind::Death, |ev| {
            debug!(source = %ev.source_id, "death dispatched");
        });
    }

    let handle = tokio::runtime::Handle::current();
    let dispatch_directory = directory.clone();
    let dispatcher: thread::JoinHandle<Core> =
        thread::spawn(move || run_dispatch_loop(core, rx, handle, dispatch_directory));

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutting down");
    let _ = tx.send(Inbound::Shutdown);
    let mut core = tokio::task::spawn_blocking(move || dispatcher.join())
        .await
        .context("joining dispatch thread")?
        .map_err(|_| anyhow!("dispatch thread panicked"))?;

    core.stop();
    write_session_reports(&mut core, &directory).await;
    Ok(())
}

/// The single-writer loop: every raw message, from whichever channel, is
/// processed one at a time against the core.
fn run_dispatch_loop(
    mut core: Core,
    rx: Receiver<Inbound>,
    handle: tokio::runtime::Handle,
    directory: CensusDirectory,
) -> Core {
    let mut started = false;
    for message in rx.iter() {
        match message {
            Inbound::Raw { channel, text } => {
                trace!(channel, "dispatching feed message");
                core.process_message(&text);
            }
            Inbound::Connected { channel } => {
                info!(channel, "feed channel connected");
                if channel != "tracked" {
                    continue;
                }
                core.set_connected(true);
                if started {
                    match core.resubscribe() {
                        Ok(requests) => info!(requests, "re-sent roster subscriptions"),
                        Err(err) => error!(?err, "failed re-sending roster subscriptions"),
                    }
                    continue;
                }
                let ids = core.settings.track_ids.clone();
                if let Err(err) = handle.block_on(core.subscribe(&ids, &directory)) {
                    error!(?err, "initial roster subscription failed");
                }
                match core.start() {
                    Ok(()) => started = true,
                    Err(err) => error!(?err, "failed starting tracker"),
                }
            }
            Inbound::Disconnected { channel } => {
                warn!(channel, "feed channel disconnected");
                if channel == "tracked" {
                    core.set_connected(false);
                }
            }
            Inbound::Shutdown => break,
        }
    }
    core
}

async fn write_session_reports(core: &mut Core, directory: &CensusDirectory) {
    let ids: Vec<String> = core.players.iter().map(|p| p.character_id.clone()).collect();
    for id in ids {
        match core.generate_personal_report(&id, directory).await {
            Ok(report) => {
                let file = format!("report-{}.json", report.name);
                match serde_json::to_string_pretty(&report) {
                    Ok(payload) => match std::fs::write(&file, payload) {
                        Ok(()) => info!(file = %file, "wrote session report"),
                        Err(err) => warn!(?err, file = %file, "failed writing session report"),
                    },
                    Err(err) => warn!(?err, "failed serializing session report"),
                }
            }
            Err(err) => info!(%err, character = %id, "no report for character"),
        }
    }
}

fn world_subscription(server_id: &str, event_names: &[&str]) -> String {
    json!({
        "service": "event",
        "action": "subscribe",
        "characters": ["all"],
        "worlds": [server_id],
        "eventNames": event_names,
    })
    .to_string()
}

fn spawn_socket_worker(
    channel: &'static str,
    uri: String,
    announce: Vec<String>,
    mut outbound: Option<mpsc::UnboundedReceiver<String>>,
    tx: Sender<Inbound>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match connect_async(&uri).await {
                Ok((mut socket, _response)) => {
                    if tx.send(Inbound::Connected { channel }).is_err() {
                        return;
                    }
                    let mut healthy = true;
                    for payload in &announce {
                        if socket.send(Message::Text(payload.clone())).await.is_err() {
                            warn!(channel, "failed sending channel subscription");
                            healthy = false;
                            break;
                        }
                    }
                    while healthy {
                        tokio::select! {
                            command = next_outbound(&mut outbound) => {
                                match command {
                                    Some(payload) => {
                                        if socket.send(Message::Text(payload)).await.is_err() {
                                            warn!(channel, "feed write failed");
                                            break;
                                        }
                                    }
                                    None => outbound = None,
                                }
                            }
                            next = socket.next() => {
                                match next {
                                    Some(Ok(Message::Text(text))) => {
                                        if tx.send(Inbound::Raw { channel, text }).is_err() {
                                            return;
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) | None => break,
                                    Some(Ok(_)) => {}
                                    Some(Err(err)) => {
                                        warn!(?err, channel, "feed read error");
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    if tx.send(Inbound::Disconnected { channel }).is_err() {
                        return;
                    }
                }
                Err(err) => warn!(?err, channel, "failed connecting feed channel"),
            }
            sleep(Duration::from_secs(5)).await;
        }
    })
}

/// Pends forever once the outbound sender is gone, keeping the select loop
/// read-only for channels without an outbound half.
async fn next_outbound(outbound: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match outbound {
        Some(rx) => rx.recv().await,
        None => futures_util::future::pending().await,
    }
}
