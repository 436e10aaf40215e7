pub mod config;
pub mod error;
pub mod lobby;
pub mod recovery;
pub mod scene;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use lobby::LobbyHandle;
pub use recovery::RecoveryHandle;
pub use scene::SceneDirector;
pub use transport::{EventDispatcher, SessionTransport, TransportEvent};
