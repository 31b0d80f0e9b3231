//! Word-validity lookup against a static word list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Shortest playable word.
pub const MIN_WORD_LEN: usize = 3;
/// Longest playable word.
pub const MAX_WORD_LEN: usize = 20;

#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error("failed to read word list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A length-filtered word list with case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashSet<String>,
}

impl Dictionary {
    /// Load a dictionary from a file with one word per line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DictionaryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_words(text.lines()))
    }

    /// Build a dictionary from an iterator of words, keeping only words of
    /// playable length (3 to 20 characters).
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_ascii_lowercase())
            .filter(|w| (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&w.len()))
            .collect();
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.trim().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_words_outside_playable_lengths() {
        let dict = Dictionary::from_words(["at", "cat", "abcdefghijklmnopqrst", "abcdefghijklmnopqrstu"]);
        assert!(!dict.contains("at"), "two-letter words are unplayable");
        assert!(dict.contains("cat"));
        assert!(dict.contains("abcdefghijklmnopqrst"), "20 letters is playable");
        assert!(!dict.contains("abcdefghijklmnopqrstu"), "21 letters is not");
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let dict = Dictionary::from_words(["wave"]);
        assert!(dict.contains("WAVE"));
        assert!(dict.contains("Wave"));
        assert!(!dict.contains("waves"));
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join("wordwave-dictionary-test.txt");
        std::fs::write(&path, "cat\ndog\nox\n").unwrap();
        let dict = Dictionary::load(&path).unwrap();
        assert!(dict.contains("cat"));
        assert!(dict.contains("dog"));
        assert!(!dict.contains("ox"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Dictionary::load("/definitely/not/a/real/wordlist.txt").unwrap_err();
        assert!(matches!(err, DictionaryError::Read { .. }));
    }
}
