//! English frontend: CMU-style lexicon lookup.

use std::path::Path;

use tracing::{debug, instrument};
use tts_core::{FrontendOptions, Lang, PhoneticFeatures, TextFrontend, TtsError, TtsResult};

use crate::lexicon::Lexicon;
use crate::vocab::IdMap;
use crate::{SentencePhones, batch_sentences, split_sentences};

const SENTENCE_DELIMITERS: &[char] = &['.', '!', '?', ';', ',', ':'];

/// English frontend. Never produces tone ids.
#[derive(Debug)]
pub struct EnFrontend {
    lexicon: Lexicon,
    phones: IdMap,
}

impl EnFrontend {
    /// Create a frontend from loaded vocabularies.
    pub fn new(lexicon: Lexicon, phones: IdMap) -> Self {
        Self { lexicon, phones }
    }

    /// Load lexicon and phone vocabulary from files.
    pub fn from_files(lexicon: impl AsRef<Path>, phones: impl AsRef<Path>) -> TtsResult<Self> {
        Ok(Self::new(
            Lexicon::from_file(lexicon, true)?,
            IdMap::from_file(phones)?,
        ))
    }

    fn sentence_phones(&self, sentence: &str) -> TtsResult<SentencePhones> {
        let mut out = SentencePhones::default();
        for word in words(sentence) {
            let units = self
                .lexicon
                .get(word)
                .ok_or_else(|| TtsError::frontend(format!("no pronunciation for '{word}'")))?;
            for unit in units {
                out.phones.push(self.phones.lookup(unit, "phone")?);
            }
        }
        Ok(out)
    }
}

impl TextFrontend for EnFrontend {
    fn lang(&self) -> Lang {
        Lang::En
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    fn get_input_ids(&self, text: &str, options: FrontendOptions) -> TtsResult<PhoneticFeatures> {
        if options.get_tone_ids {
            debug!("tone ids are not defined for English, ignoring request");
        }
        let sentences = split_sentences(text, SENTENCE_DELIMITERS)
            .into_iter()
            .map(|s| self.sentence_phones(&s))
            .collect::<TtsResult<Vec<_>>>()?;

        let pause = self.phones.get("sp").map(|id| (id, 0));
        batch_sentences(sentences, options, false, pause)
    }
}

/// Alphabetic runs (apostrophes kept, so `it's` stays one word).
fn words(sentence: &str) -> impl Iterator<Item = &str> {
    sentence
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
}
