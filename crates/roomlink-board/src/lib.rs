//! Tic-tac-toe rules as a pure state crate: no rendering, no input handling,
//! no networking. Embedders own the UI and feed cell coordinates into
//! [`Game::play`]; every type serializes so game state can be persisted or
//! shipped to a client as-is.

pub mod board;
pub mod game;

pub use board::{Board, Mark};
pub use game::{Game, MoveError, Outcome};
