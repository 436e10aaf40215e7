use tokio::sync::oneshot;

use crate::lobby::LobbyStatus;
use crate::transport::{SessionInfo, TransportEvent};

#[derive(Debug)]
pub enum LobbyMessage {
    /// A notification forwarded from the transport.
    TransportEvent(TransportEvent),
    /// Create a session under the given name with the configured options.
    CreateSession(String),
    /// Join a named session from the directory listing.
    JoinSession(String),
    /// Join any open session the directory can find.
    JoinRandom,
    /// Change and persist the local player's nickname.
    SetNickname(String),
    /// Ask for the cached session directory, sorted by name.
    Sessions(oneshot::Sender<Vec<SessionInfo>>),
    /// Ask for the current connection status.
    Status(oneshot::Sender<LobbyStatus>),
    /// Ask for the current nickname.
    Nickname(oneshot::Sender<String>),
}
