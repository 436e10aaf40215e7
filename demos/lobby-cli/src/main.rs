mod sim;

use std::sync::atomic::Ordering;

use clap::Parser;
use roomlink::config::Config;
use roomlink::store::in_memory::InMemoryPreferences;
use roomlink::transport::DisconnectCause;
use roomlink::{EventDispatcher, LobbyHandle, RecoveryHandle, SceneDirector};
use tokio::time::{sleep, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::sim::SimTransport;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<String>,
}

struct LoggingScenes;

#[async_trait::async_trait]
impl SceneDirector for LoggingScenes {
    async fn load_lobby(&self) {
        info!("[scene] loading the lobby scene");
        sleep(Duration::from_millis(50)).await;
    }

    async fn load_game(&self) {
        info!("[scene] loading the game scene");
        sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match args.config {
        Some(path) => Config::load_from_path(path).expect("to be able to load config"),
        None => Config::default(),
    };
    // keep the demo snappy
    config.recovery.retry_interval = 1;

    let dispatcher = EventDispatcher::default();
    let transport = SimTransport::new(dispatcher.clone());

    // subscribe before the controllers start publishing-triggering requests
    let recovery_events = dispatcher.subscribe();
    let lobby_events = dispatcher.subscribe();

    let recovery = RecoveryHandle::new(config.recovery.clone(), transport.clone(), LoggingScenes);
    recovery.attach(recovery_events);

    let lobby = LobbyHandle::new(
        config.lobby.clone(),
        transport.clone(),
        LoggingScenes,
        InMemoryPreferences::default(),
    );
    lobby.attach(lobby_events);

    // startup connects, enters the lobby and receives the directory
    sleep(Duration::from_millis(200)).await;
    info!(status = ?lobby.status().await, "lobby ready");
    for session in lobby.sessions().await {
        let players = format!("{}/{}", session.player_count, session.max_players);
        info!(name = %session.name, players = %players, "visible session");
    }

    lobby
        .create_session("demo-room")
        .await
        .expect("demo room name to be valid");
    sleep(Duration::from_millis(200)).await;
    info!(status = ?lobby.status().await, "session up");

    // the server drops us: one transient rejoin failure, then success
    transport.rejoin_failures.store(1, Ordering::SeqCst);
    transport.force_drop(DisconnectCause::ServerTimeout);
    sleep(Duration::from_millis(100)).await;
    let snapshot = recovery.snapshot().await;
    info!(recovering = recovery.recovering(), ?snapshot, "recovery in progress");

    // wait out the retry interval; the second rejoin succeeds
    sleep(Duration::from_secs(2)).await;
    let snapshot = recovery.snapshot().await;
    info!(recovering = recovery.recovering(), ?snapshot, "after retry");

    // a manual disconnect is attributed and never triggers recovery
    recovery.manual_disconnect().await;
    sleep(Duration::from_millis(100)).await;
    let snapshot = recovery.snapshot().await;
    info!(recovering = recovery.recovering(), ?snapshot, "after manual disconnect");
}
