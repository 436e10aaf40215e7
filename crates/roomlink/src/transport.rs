use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// The external matchmaking transport the controllers drive. The transport
/// owns the wire protocol, the room directory and reconnection plumbing; this
/// crate only issues requests and consumes the resulting [`TransportEvent`]s.
#[async_trait::async_trait]
pub trait SessionTransport: Send + Sync + 'static {
    async fn connect(&self);
    async fn disconnect(&self);
    async fn is_connected(&self) -> bool;
    /// Ask the transport to re-enter the most recently held session.
    /// Returns false if the request could not even be issued.
    async fn rejoin_last_session(&self) -> bool;
    async fn enter_lobby(&self);
    async fn create_session(&self, name: &str, options: SessionOptions);
    async fn join_session(&self, name: &str);
    async fn join_random(&self);
    async fn leave_session(&self);
    async fn set_nickname(&self, nickname: &str);
}

/// Asynchronous notifications delivered by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// The directory (master) service accepted our connection.
    ConnectedToDirectory,
    /// We entered the discovery lobby on the directory.
    JoinedLobby,
    /// We are inside a session.
    JoinedSession,
    /// We left a session without losing the connection.
    LeftSession,
    /// The connection dropped, voluntarily or not.
    Disconnected(DisconnectCause),
    /// A join or rejoin request was rejected.
    JoinFailed(JoinFailure),
    /// A session creation request was rejected.
    CreateFailed(JoinFailure),
    /// A join-random request found no session.
    JoinRandomFailed(JoinFailure),
    /// A delta update of the visible session directory.
    SessionListUpdate(Vec<SessionInfo>),
}

/// Why the transport connection ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The local client asked for the disconnect.
    ByClientLogic,
    /// The server closed the connection.
    ByServer,
    ClientTimeout,
    ServerTimeout,
    TransportError,
}

/// Why a join, rejoin or create request was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinFailure {
    /// The target session no longer exists on the directory.
    NoSuchSession,
    SessionFull,
    SessionClosed,
    ServerRefused,
}

impl JoinFailure {
    /// Terminal failures make retrying pointless; the target is gone.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JoinFailure::NoSuchSession)
    }
}

/// A directory entry describing one visible session.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub name: String,
    pub player_count: u8,
    pub max_players: u8,
    pub visible: bool,
    pub open: bool,
    /// Set on delta updates when the entry should be dropped from caches.
    pub removed: bool,
}

/// Options passed to the transport when creating a session.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct SessionOptions {
    pub max_players: u8,
    pub visible: bool,
    pub open: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_players: 4,
            visible: true,
            open: true,
        }
    }
}

/// Fan-out point for transport notifications. Transports publish here and any
/// number of independent observers subscribe; controllers pump a subscription
/// into their own mailbox.
#[derive(Clone, Debug)]
pub struct EventDispatcher {
    sender: broadcast::Sender<TransportEvent>,
}

impl EventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: TransportEvent) {
        if self.sender.send(event).is_err() {
            debug!("transport event published without any subscribers");
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_session_is_terminal() {
        assert!(JoinFailure::NoSuchSession.is_terminal());
        assert!(!JoinFailure::SessionFull.is_terminal());
        assert!(!JoinFailure::SessionClosed.is_terminal());
        assert!(!JoinFailure::ServerRefused.is_terminal());
    }

    #[tokio::test]
    async fn test_dispatcher_reaches_all_subscribers() {
        let dispatcher = EventDispatcher::new(8);
        let mut first = dispatcher.subscribe();
        let mut second = dispatcher.subscribe();

        dispatcher.publish(TransportEvent::JoinedLobby);

        assert_eq!(first.recv().await.unwrap(), TransportEvent::JoinedLobby);
        assert_eq!(second.recv().await.unwrap(), TransportEvent::JoinedLobby);
    }
}
