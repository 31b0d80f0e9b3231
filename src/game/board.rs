//! The 5x5 letter board players form words from.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Side length of the board.
pub const BOARD_SIZE: usize = 5;

/// A 5x5 grid of uppercase letters.
///
/// Serializes as five rows of five one-character strings, which is the shape
/// clients render from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[char; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Generate a fresh board by shuffling the alphabet and laying out the
    /// first 25 letters row by row.
    pub fn shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut letters: Vec<char> = ('A'..='Z').collect();
        letters.shuffle(rng);

        let mut cells = [['A'; BOARD_SIZE]; BOARD_SIZE];
        for (i, letter) in letters.into_iter().take(BOARD_SIZE * BOARD_SIZE).enumerate() {
            cells[i / BOARD_SIZE][i % BOARD_SIZE] = letter;
        }
        Self { cells }
    }

    pub fn rows(&self) -> &[[char; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    pub fn letter_at(&self, row: usize, col: usize) -> Option<char> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn shuffled_board_is_uppercase_alphabet_cells() {
        let board = Board::shuffled(&mut rand::thread_rng());
        for row in board.rows() {
            for &cell in row {
                assert!(cell.is_ascii_uppercase(), "unexpected cell {cell:?}");
            }
        }
    }

    #[test]
    fn shuffled_board_has_distinct_letters() {
        // The generator truncates a shuffled alphabet, so the 25 cells are
        // distinct. Callers must not rely on this, but the generator should
        // not silently change shape.
        let board = Board::shuffled(&mut rand::thread_rng());
        let letters: HashSet<char> = board.rows().iter().flatten().copied().collect();
        assert_eq!(letters.len(), BOARD_SIZE * BOARD_SIZE);
    }

    #[test]
    fn serializes_as_rows_of_single_letter_strings() {
        let board = Board::shuffled(&mut rand::thread_rng());
        let value = serde_json::to_value(board).unwrap();
        let rows = value.as_array().expect("array of rows");
        assert_eq!(rows.len(), BOARD_SIZE);
        for row in rows {
            let cells = row.as_array().expect("array of cells");
            assert_eq!(cells.len(), BOARD_SIZE);
            for cell in cells {
                assert_eq!(cell.as_str().expect("string cell").len(), 1);
            }
        }
    }

    #[test]
    fn round_trips_through_json() {
        let board = Board::shuffled(&mut rand::thread_rng());
        let json = serde_json::to_string(&board).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(board, back);
    }
}
