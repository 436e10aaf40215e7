use serde::{Deserialize, Serialize};

/// Board side length. The win detection below assumes 3.
pub const SIZE: usize = 3;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(&self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Board {
    cells: [[Option<Mark>; SIZE]; SIZE],
}

impl Board {
    pub fn cell(&self, row: usize, col: usize) -> Option<Mark> {
        self.cells[row][col]
    }

    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_some()))
    }

    /// The mark holding a complete row, column or diagonal, if any.
    pub fn winner(&self) -> Option<Mark> {
        for i in 0..SIZE {
            if let Some(mark) = self.line_winner([(i, 0), (i, 1), (i, 2)]) {
                return Some(mark);
            }
            if let Some(mark) = self.line_winner([(0, i), (1, i), (2, i)]) {
                return Some(mark);
            }
        }

        self.line_winner([(0, 0), (1, 1), (2, 2)])
            .or_else(|| self.line_winner([(0, 2), (1, 1), (2, 0)]))
    }

    pub(crate) fn place(&mut self, row: usize, col: usize, mark: Mark) {
        self.cells[row][col] = Some(mark);
    }

    fn line_winner(&self, line: [(usize, usize); SIZE]) -> Option<Mark> {
        let (first_row, first_col) = line[0];
        let first = self.cells[first_row][first_col]?;
        line.iter()
            .all(|&(row, col)| self.cells[row][col] == Some(first))
            .then_some(first)
    }
}
