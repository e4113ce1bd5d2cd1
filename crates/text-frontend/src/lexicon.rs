//! Pronunciation lexicons (`word unit unit ...` per line).

use std::collections::HashMap;
use std::path::Path;

use tts_core::{TtsError, TtsResult};

/// Word → pronunciation units.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, Vec<String>>,
    max_word_chars: usize,
    lowercase: bool,
}

impl Lexicon {
    /// Load a lexicon file. With `lowercase`, keys and lookups are case-folded.
    pub fn from_file(path: impl AsRef<Path>, lowercase: bool) -> TtsResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TtsError::config(format!("cannot read lexicon {}: {e}", path.display()))
        })?;
        Self::parse(&raw, &path.display().to_string(), lowercase)
    }

    /// Parse lexicon text; `origin` names the source in error messages.
    ///
    /// Later duplicates of a word are ignored (first pronunciation wins).
    pub fn parse(raw: &str, origin: &str, lowercase: bool) -> TtsResult<Self> {
        let mut entries = HashMap::new();
        let mut max_word_chars = 0;
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else { continue };
            let units: Vec<String> = fields.map(str::to_string).collect();
            if units.is_empty() {
                return Err(TtsError::config(format!(
                    "{origin}:{}: word {word:?} has no pronunciation",
                    lineno + 1
                )));
            }
            let word = if lowercase {
                word.to_lowercase()
            } else {
                word.to_string()
            };
            max_word_chars = max_word_chars.max(word.chars().count());
            entries.entry(word).or_insert(units);
        }
        Ok(Self {
            entries,
            max_word_chars,
            lowercase,
        })
    }

    /// Pronunciation of `word`.
    pub fn get(&self, word: &str) -> Option<&[String]> {
        if self.lowercase {
            self.entries.get(&word.to_lowercase()).map(Vec::as_slice)
        } else {
            self.entries.get(word).map(Vec::as_slice)
        }
    }

    /// Longest entry matching `chars` at `start`.
    ///
    /// Returns the number of chars consumed and the pronunciation.
    pub fn longest_match(&self, chars: &[char], start: usize) -> Option<(usize, &[String])> {
        let remaining = chars.len().saturating_sub(start);
        let longest = self.max_word_chars.min(remaining);
        (1..=longest).rev().find_map(|len| {
            let word: String = chars[start..start + len].iter().collect();
            self.get(&word).map(|units| (len, units))
        })
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the lexicon is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
