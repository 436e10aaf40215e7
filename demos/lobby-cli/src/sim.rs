use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use roomlink::transport::{
    DisconnectCause, JoinFailure, SessionInfo, SessionOptions, TransportEvent,
};
use roomlink::{EventDispatcher, SessionTransport};
use tracing::info;

/// In-process stand-in for the proprietary matchmaking transport. It answers
/// requests instantly and publishes the notifications a real transport would,
/// which is all the controllers care about.
#[derive(Clone)]
pub struct SimTransport {
    dispatcher: EventDispatcher,
    connected: Arc<AtomicBool>,
    last_session: Arc<Mutex<Option<String>>>,
    /// Transient rejoin failures to serve before a rejoin succeeds.
    pub rejoin_failures: Arc<AtomicUsize>,
}

impl SimTransport {
    pub fn new(dispatcher: EventDispatcher) -> Self {
        Self {
            dispatcher,
            connected: Arc::new(AtomicBool::new(false)),
            last_session: Arc::new(Mutex::new(None)),
            rejoin_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulate the server dropping us mid-session.
    pub fn force_drop(&self, cause: DisconnectCause) {
        self.connected.store(false, Ordering::SeqCst);
        self.dispatcher.publish(TransportEvent::Disconnected(cause));
    }

    fn sample_directory() -> Vec<SessionInfo> {
        vec![
            SessionInfo {
                name: "casual-corner".to_string(),
                player_count: 2,
                max_players: 4,
                visible: true,
                open: true,
                removed: false,
            },
            SessionInfo {
                name: "ranked-arena".to_string(),
                player_count: 4,
                max_players: 4,
                visible: true,
                open: false,
                removed: false,
            },
        ]
    }
}

#[async_trait::async_trait]
impl SessionTransport for SimTransport {
    async fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        self.dispatcher.publish(TransportEvent::ConnectedToDirectory);
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.dispatcher
            .publish(TransportEvent::Disconnected(DisconnectCause::ByClientLogic));
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn rejoin_last_session(&self) -> bool {
        if self.last_session.lock().expect("session lock").is_none() {
            return false;
        }

        if self.rejoin_failures.load(Ordering::SeqCst) > 0 {
            self.rejoin_failures.fetch_sub(1, Ordering::SeqCst);
            self.dispatcher
                .publish(TransportEvent::JoinFailed(JoinFailure::ServerRefused));
        } else {
            self.connected.store(true, Ordering::SeqCst);
            self.dispatcher.publish(TransportEvent::JoinedSession);
        }
        true
    }

    async fn enter_lobby(&self) {
        self.dispatcher.publish(TransportEvent::JoinedLobby);
        self.dispatcher
            .publish(TransportEvent::SessionListUpdate(Self::sample_directory()));
    }

    async fn create_session(&self, name: &str, options: SessionOptions) {
        info!(name, max_players = options.max_players, "session created");
        *self.last_session.lock().expect("session lock") = Some(name.to_string());
        self.dispatcher.publish(TransportEvent::JoinedSession);
    }

    async fn join_session(&self, name: &str) {
        *self.last_session.lock().expect("session lock") = Some(name.to_string());
        self.dispatcher.publish(TransportEvent::JoinedSession);
    }

    async fn join_random(&self) {
        *self.last_session.lock().expect("session lock") = Some("casual-corner".to_string());
        self.dispatcher.publish(TransportEvent::JoinedSession);
    }

    async fn leave_session(&self) {
        *self.last_session.lock().expect("session lock") = None;
        self.dispatcher.publish(TransportEvent::LeftSession);
    }

    async fn set_nickname(&self, nickname: &str) {
        info!(nickname, "nickname registered with the directory");
    }
}
