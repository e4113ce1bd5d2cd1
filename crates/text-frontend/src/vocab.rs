//! Token ↔ id vocabularies (`phone_id_map.txt`, `tone_id_map.txt`,
//! `speaker_id_map.txt`).

use std::collections::HashMap;
use std::path::Path;

use tts_core::{TtsError, TtsResult};

/// A `token id` per line vocabulary.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    ids: HashMap<String, i64>,
}

impl IdMap {
    /// Load a vocabulary file.
    ///
    /// A missing or malformed file is a configuration error.
    pub fn from_file(path: impl AsRef<Path>) -> TtsResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TtsError::config(format!("cannot read vocabulary {}: {e}", path.display()))
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    /// Parse vocabulary text; `origin` names the source in error messages.
    pub fn parse(raw: &str, origin: &str) -> TtsResult<Self> {
        let mut ids = HashMap::new();
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(token), Some(id), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(TtsError::config(format!(
                    "{origin}:{}: expected `token id`, got {line:?}",
                    lineno + 1
                )));
            };
            let id: i64 = id.parse().map_err(|_| {
                TtsError::config(format!("{origin}:{}: invalid id {id:?}", lineno + 1))
            })?;
            ids.insert(token.to_string(), id);
        }
        Ok(Self { ids })
    }

    /// Id of `token`, if present.
    pub fn get(&self, token: &str) -> Option<i64> {
        self.ids.get(token).copied()
    }

    /// Id of `token`, or a frontend error naming the vocabulary kind.
    pub fn lookup(&self, token: &str, kind: &str) -> TtsResult<i64> {
        self.get(token)
            .ok_or_else(|| TtsError::frontend(format!("unknown {kind} '{token}'")))
    }

    /// Check whether any token maps to `id`.
    pub fn contains_id(&self, id: i64) -> bool {
        self.ids.values().any(|&v| v == id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
