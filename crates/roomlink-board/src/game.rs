use serde::{Deserialize, Serialize};

use crate::board::{Board, Mark, SIZE};

/// The type returned when a move is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("cell ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("cell ({row}, {col}) is already taken")]
    CellOccupied { row: usize, col: usize },
    #[error("the game is over, reset to play again")]
    GameOver,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum Outcome {
    InProgress,
    Won(Mark),
    Draw,
}

/// A single game: the board plus whose turn it is. X always moves first.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Game {
    board: Board,
    turn: Mark,
    outcome: Outcome,
}

impl Game {
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            turn: Mark::X,
            outcome: Outcome::InProgress,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Place the current player's mark. The turn passes only after a legal,
    /// non-terminal move; a finished game rejects moves until [`Game::reset`].
    pub fn play(&mut self, row: usize, col: usize) -> Result<Outcome, MoveError> {
        if self.outcome != Outcome::InProgress {
            return Err(MoveError::GameOver);
        }
        if row >= SIZE || col >= SIZE {
            return Err(MoveError::OutOfBounds { row, col });
        }
        if self.board.cell(row, col).is_some() {
            return Err(MoveError::CellOccupied { row, col });
        }

        self.board.place(row, col, self.turn);

        if let Some(winner) = self.board.winner() {
            self.outcome = Outcome::Won(winner);
        } else if self.board.is_full() {
            self.outcome = Outcome::Draw;
        } else {
            self.turn = self.turn.opponent();
        }

        Ok(self.outcome)
    }

    pub fn reset(&mut self) {
        *self = Game::new();
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
