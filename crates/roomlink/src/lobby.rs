mod message;

use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::config::LobbyConfig;
use crate::error::LobbyError;
use crate::scene::SceneDirector;
use crate::store::PreferencesStore;
use crate::transport::{
    DisconnectCause, SessionInfo, SessionOptions, SessionTransport, TransportEvent,
};

use message::LobbyMessage;

/// Where the client currently stands relative to the directory service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LobbyStatus {
    Connecting,
    AtDirectory,
    InLobby,
    InSession,
    Disconnected(DisconnectCause),
}

/// Handle to the lobby controller: session discovery, creation and joining,
/// plus the player nickname. The room directory itself is propagated by the
/// transport; this controller only maintains a merged local cache of it.
#[derive(Clone)]
pub struct LobbyHandle {
    sender: mpsc::Sender<LobbyMessage>,
}

impl LobbyHandle {
    pub fn new(
        config: LobbyConfig,
        transport: impl SessionTransport,
        scenes: impl SceneDirector,
        prefs: impl PreferencesStore,
    ) -> Self {
        let (sender, mailbox) = mpsc::channel::<LobbyMessage>(10);
        let actor = LobbyActor::new(mailbox, config, transport, scenes, prefs);
        tokio::spawn(run_lobby(actor));

        Self { sender }
    }

    /// Pump a transport subscription into this controller's mailbox.
    pub fn attach(&self, mut events: broadcast::Receiver<TransportEvent>) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let forwarded = sender.send(LobbyMessage::TransportEvent(event)).await;
                        if forwarded.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "transport event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    pub async fn transport_event(&self, event: TransportEvent) {
        self.sender
            .send(LobbyMessage::TransportEvent(event))
            .await
            .expect("be able to deliver transport event");
    }

    pub async fn create_session(&self, name: &str) -> Result<(), LobbyError> {
        if name.trim().is_empty() {
            return Err(LobbyError::EmptyName);
        }
        self.sender
            .send(LobbyMessage::CreateSession(name.to_string()))
            .await
            .expect("be able to request session creation");
        Ok(())
    }

    pub async fn join_session(&self, name: &str) {
        self.sender
            .send(LobbyMessage::JoinSession(name.to_string()))
            .await
            .expect("be able to request join");
    }

    pub async fn join_random(&self) {
        self.sender
            .send(LobbyMessage::JoinRandom)
            .await
            .expect("be able to request random join");
    }

    pub async fn set_nickname(&self, nickname: &str) {
        self.sender
            .send(LobbyMessage::SetNickname(nickname.to_string()))
            .await
            .expect("be able to set nickname");
    }

    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let (sender, receiver) = oneshot::channel();
        self.sender
            .send(LobbyMessage::Sessions(sender))
            .await
            .expect("be able to request session list");
        receiver.await.expect("to receive the session list")
    }

    pub async fn status(&self) -> LobbyStatus {
        let (sender, receiver) = oneshot::channel();
        self.sender
            .send(LobbyMessage::Status(sender))
            .await
            .expect("be able to request status");
        receiver.await.expect("to receive the status")
    }

    pub async fn nickname(&self) -> String {
        let (sender, receiver) = oneshot::channel();
        self.sender
            .send(LobbyMessage::Nickname(sender))
            .await
            .expect("be able to request nickname");
        receiver.await.expect("to receive the nickname")
    }
}

struct LobbyActor<T, D, P> {
    mailbox: mpsc::Receiver<LobbyMessage>,
    config: LobbyConfig,
    transport: T,
    scenes: D,
    prefs: P,
    status: LobbyStatus,
    nickname: String,
    sessions: HashMap<String, SessionInfo>,
}

impl<T, D, P> LobbyActor<T, D, P>
where
    T: SessionTransport,
    D: SceneDirector,
    P: PreferencesStore,
{
    fn new(
        mailbox: mpsc::Receiver<LobbyMessage>,
        config: LobbyConfig,
        transport: T,
        scenes: D,
        prefs: P,
    ) -> LobbyActor<T, D, P> {
        let nickname = config
            .default_nickname
            .clone()
            .unwrap_or_else(fallback_nickname);
        Self {
            mailbox,
            config,
            transport,
            scenes,
            prefs,
            status: LobbyStatus::Connecting,
            nickname,
            sessions: HashMap::new(),
        }
    }

    async fn start(&mut self) {
        if let Some(saved) = self.prefs.nickname().await {
            self.nickname = saved;
        }
        if !self.transport.is_connected().await {
            debug!("connecting to the directory");
            self.transport.connect().await;
        }
    }

    async fn on_connected_to_directory(&mut self) {
        debug!("connected to the directory, entering the lobby");
        self.status = LobbyStatus::AtDirectory;
        self.transport.enter_lobby().await;
    }

    async fn on_joined_lobby(&mut self) {
        debug!(nickname = %self.nickname, "joined the lobby");
        self.status = LobbyStatus::InLobby;
        self.transport.set_nickname(&self.nickname).await;
        self.prefs.set_nickname(&self.nickname).await;
    }

    async fn on_joined_session(&mut self) {
        debug!("joined a session, switching to the game context");
        self.status = LobbyStatus::InSession;
        self.scenes.load_game().await;
    }

    fn on_left_session(&mut self) {
        if self.status == LobbyStatus::InSession {
            self.status = LobbyStatus::InLobby;
        }
    }

    fn on_disconnected(&mut self, cause: DisconnectCause) {
        debug!(?cause, "disconnected from the directory");
        self.status = LobbyStatus::Disconnected(cause);
        self.sessions.clear();
    }

    /// Merge a delta update into the cached directory. Entries flagged as
    /// removed or no longer visible drop out; everything else is upserted.
    fn on_session_list(&mut self, update: Vec<SessionInfo>) {
        for info in update {
            if !info.visible || info.removed {
                self.sessions.remove(&info.name);
            } else {
                self.sessions.insert(info.name.clone(), info);
            }
        }
    }

    async fn on_set_nickname(&mut self, nickname: String) {
        self.nickname = nickname;
        self.prefs.set_nickname(&self.nickname).await;
        if self.status == LobbyStatus::InLobby {
            self.transport.set_nickname(&self.nickname).await;
        }
    }

    fn session_snapshot(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<_> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| a.name.cmp(&b.name));
        sessions
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ConnectedToDirectory => self.on_connected_to_directory().await,
            TransportEvent::JoinedLobby => self.on_joined_lobby().await,
            TransportEvent::JoinedSession => self.on_joined_session().await,
            TransportEvent::LeftSession => self.on_left_session(),
            TransportEvent::Disconnected(cause) => self.on_disconnected(cause),
            TransportEvent::SessionListUpdate(update) => self.on_session_list(update),
            TransportEvent::JoinFailed(failure) => {
                debug!(?failure, "join failed");
            }
            TransportEvent::CreateFailed(failure) => {
                error!(?failure, "session creation failed");
            }
            TransportEvent::JoinRandomFailed(failure) => {
                error!(?failure, "no random session available");
            }
        }
    }

    async fn handle(&mut self, message: LobbyMessage) {
        match message {
            LobbyMessage::TransportEvent(event) => {
                self.on_transport_event(event).await;
            }
            LobbyMessage::CreateSession(name) => {
                let options = SessionOptions {
                    max_players: self.config.max_players,
                    ..SessionOptions::default()
                };
                self.transport.create_session(&name, options).await;
            }
            LobbyMessage::JoinSession(name) => {
                self.transport.join_session(&name).await;
            }
            LobbyMessage::JoinRandom => {
                self.transport.join_random().await;
            }
            LobbyMessage::SetNickname(nickname) => {
                self.on_set_nickname(nickname).await;
            }
            LobbyMessage::Sessions(responder) => {
                responder
                    .send(self.session_snapshot())
                    .expect("be able to respond with sessions");
            }
            LobbyMessage::Status(responder) => {
                responder
                    .send(self.status)
                    .expect("be able to respond with status");
            }
            LobbyMessage::Nickname(responder) => {
                responder
                    .send(self.nickname.clone())
                    .expect("be able to respond with nickname");
            }
        }
    }
}

fn fallback_nickname() -> String {
    format!("Player{}", 1000 + std::process::id() % 9000)
}

async fn run_lobby<T, D, P>(mut actor: LobbyActor<T, D, P>)
where
    T: SessionTransport,
    D: SceneDirector,
    P: PreferencesStore,
{
    actor.start().await;

    while let Some(msg) = actor.mailbox.recv().await {
        actor.handle(msg).await;
    }

    debug!("lobby controller is shutting down")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeScenes, FakeTransport, SharedPreferences, TransportCall};
    use std::sync::atomic::Ordering;

    fn session(name: &str, player_count: u8) -> SessionInfo {
        SessionInfo {
            name: name.to_string(),
            player_count,
            max_players: 4,
            visible: true,
            open: true,
            removed: false,
        }
    }

    fn lobby(transport: FakeTransport, scenes: FakeScenes, prefs: SharedPreferences) -> LobbyHandle {
        LobbyHandle::new(LobbyConfig::default(), transport, scenes, prefs)
    }

    #[tokio::test]
    async fn test_connects_on_startup_when_disconnected() {
        let transport = FakeTransport::default();
        let handle = lobby(transport.clone(), FakeScenes::default(), SharedPreferences::default());

        // any query serializes behind the startup sequence
        assert_eq!(handle.status().await, LobbyStatus::Connecting);
        assert_eq!(transport.count(&TransportCall::Connect), 1);
    }

    #[tokio::test]
    async fn test_directory_connection_enters_lobby() {
        let transport = FakeTransport::connected_and_accepting();
        let handle = lobby(transport.clone(), FakeScenes::default(), SharedPreferences::default());

        handle.transport_event(TransportEvent::ConnectedToDirectory).await;

        assert_eq!(handle.status().await, LobbyStatus::AtDirectory);
        assert_eq!(transport.count(&TransportCall::EnterLobby), 1);
    }

    #[tokio::test]
    async fn test_joining_lobby_pushes_and_persists_nickname() {
        let transport = FakeTransport::connected_and_accepting();
        let prefs = SharedPreferences::default();
        let handle = lobby(transport.clone(), FakeScenes::default(), prefs.clone());

        handle.transport_event(TransportEvent::JoinedLobby).await;

        let nickname = handle.nickname().await;
        assert_eq!(handle.status().await, LobbyStatus::InLobby);
        assert_eq!(transport.count(&TransportCall::Nickname(nickname.clone())), 1);
        assert_eq!(prefs.stored(), Some(nickname));
    }

    #[tokio::test]
    async fn test_saved_nickname_wins_over_fallback() {
        let transport = FakeTransport::connected_and_accepting();
        let prefs = SharedPreferences::preloaded("Ada");
        let handle = lobby(transport.clone(), FakeScenes::default(), prefs);

        assert_eq!(handle.nickname().await, "Ada");
    }

    #[tokio::test]
    async fn test_session_list_merges_deltas() {
        let transport = FakeTransport::connected_and_accepting();
        let handle = lobby(transport.clone(), FakeScenes::default(), SharedPreferences::default());

        handle
            .transport_event(TransportEvent::SessionListUpdate(vec![
                session("beta", 1),
                session("alpha", 2),
            ]))
            .await;

        // an update for a known session replaces it, a removal drops it
        let updated = session("alpha", 3);
        let mut removed = session("beta", 0);
        removed.removed = true;
        handle
            .transport_event(TransportEvent::SessionListUpdate(vec![updated, removed]))
            .await;

        let sessions = handle.sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].name, "alpha");
        assert_eq!(sessions[0].player_count, 3);
    }

    #[tokio::test]
    async fn test_invisible_sessions_drop_out_of_the_cache() {
        let transport = FakeTransport::connected_and_accepting();
        let handle = lobby(transport.clone(), FakeScenes::default(), SharedPreferences::default());

        handle
            .transport_event(TransportEvent::SessionListUpdate(vec![session("alpha", 1)]))
            .await;
        let mut hidden = session("alpha", 1);
        hidden.visible = false;
        handle
            .transport_event(TransportEvent::SessionListUpdate(vec![hidden]))
            .await;

        assert!(handle.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_session_rejects_empty_names() {
        let transport = FakeTransport::connected_and_accepting();
        let handle = lobby(transport.clone(), FakeScenes::default(), SharedPreferences::default());

        assert_eq!(handle.create_session("  ").await, Err(LobbyError::EmptyName));
        handle.create_session("duel").await.unwrap();

        // serialize behind the actor before inspecting calls
        handle.status().await;
        assert_eq!(transport.count(&TransportCall::Create("duel".to_string())), 1);
    }

    #[tokio::test]
    async fn test_joined_session_switches_to_game_context() {
        let transport = FakeTransport::connected_and_accepting();
        let scenes = FakeScenes::default();
        let handle = lobby(transport.clone(), scenes.clone(), SharedPreferences::default());

        handle.transport_event(TransportEvent::JoinedSession).await;

        assert_eq!(handle.status().await, LobbyStatus::InSession);
        assert_eq!(scenes.game_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnect_clears_the_directory_cache() {
        let transport = FakeTransport::connected_and_accepting();
        let handle = lobby(transport.clone(), FakeScenes::default(), SharedPreferences::default());

        handle
            .transport_event(TransportEvent::SessionListUpdate(vec![session("alpha", 1)]))
            .await;
        handle
            .transport_event(TransportEvent::Disconnected(DisconnectCause::ServerTimeout))
            .await;

        assert!(handle.sessions().await.is_empty());
        assert_eq!(
            handle.status().await,
            LobbyStatus::Disconnected(DisconnectCause::ServerTimeout)
        );
    }

    #[tokio::test]
    async fn test_join_requests_reach_the_transport() {
        let transport = FakeTransport::connected_and_accepting();
        let handle = lobby(transport.clone(), FakeScenes::default(), SharedPreferences::default());

        handle.join_session("alpha").await;
        handle.join_random().await;

        handle.status().await;
        assert_eq!(transport.count(&TransportCall::Join("alpha".to_string())), 1);
        assert_eq!(transport.count(&TransportCall::JoinRandom), 1);
    }
}
