//! Game collaborators consumed by clients: the letter board, the word
//! dictionary, and the letter score table. The room engine stores and relays
//! these; it does not validate words or arithmetic itself.

pub mod board;
pub mod dictionary;
pub mod scoring;

pub use board::{Board, BOARD_SIZE};
pub use dictionary::{Dictionary, DictionaryError};
