use tokio::sync::oneshot;

use crate::recovery::state::RecoverySnapshot;
use crate::transport::TransportEvent;

#[derive(Debug)]
pub enum RecoveryMessage {
    /// A notification forwarded from the transport.
    TransportEvent(TransportEvent),
    /// The UI requested a disconnect; attribute the next drop to the player.
    ManualDisconnect,
    /// Ask the controller for its current state.
    Snapshot(oneshot::Sender<RecoverySnapshot>),
}
