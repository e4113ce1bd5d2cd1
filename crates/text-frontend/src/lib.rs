//! # text-frontend
//!
//! Text frontends for the TTS inference pipeline.
//!
//! This crate turns sentence text into the phone id (and tone id) sequences
//! consumed by acoustic models, including:
//! - `phone_id_map.txt` / `tone_id_map.txt` / `speaker_id_map.txt` vocabularies
//! - Lexicon-driven Mandarin (pinyin initials/finals) and English (CMU) frontends
//! - Sentence batching with optional merging
//! - A deterministic mock frontend for tests
//!
//! # Example
//!
//! ```ignore
//! use text_frontend::{Frontend, FrontendFiles};
//! use tts_core::{FrontendOptions, Lang, TextFrontend};
//!
//! let files = FrontendFiles::new("lexicon.txt", "phone_id_map.txt");
//! let frontend = Frontend::load(Lang::Zh, &files)?;
//! let features = frontend.get_input_ids("你好", FrontendOptions::default())?;
//! println!("Phone IDs: {:?}", features.phone_ids);
//! ```

pub mod en;
pub mod lexicon;
pub mod vocab;
pub mod zh;

use std::path::PathBuf;

use tracing::info;
use tts_core::{FrontendOptions, Lang, PhoneticFeatures, TextFrontend, TtsResult};

pub use en::EnFrontend;
pub use lexicon::Lexicon;
pub use vocab::IdMap;
pub use zh::ZhFrontend;

/// Files backing a lexicon-driven frontend.
#[derive(Debug, Clone)]
pub struct FrontendFiles {
    /// Pronunciation lexicon.
    pub lexicon: PathBuf,
    /// Phone vocabulary.
    pub phones: PathBuf,
    /// Tone vocabulary (Mandarin only).
    pub tones: Option<PathBuf>,
}

impl FrontendFiles {
    /// Files without a tone vocabulary.
    pub fn new(lexicon: impl Into<PathBuf>, phones: impl Into<PathBuf>) -> Self {
        Self {
            lexicon: lexicon.into(),
            phones: phones.into(),
            tones: None,
        }
    }

    /// Set the tone vocabulary.
    pub fn with_tones(mut self, tones: impl Into<PathBuf>) -> Self {
        self.tones = Some(tones.into());
        self
    }
}

/// Language-dispatched frontend.
#[derive(Debug)]
pub enum Frontend {
    Zh(ZhFrontend),
    En(EnFrontend),
}

impl Frontend {
    /// Load the frontend for `lang`.
    pub fn load(lang: Lang, files: &FrontendFiles) -> TtsResult<Self> {
        let frontend = match lang {
            Lang::Zh => Self::Zh(ZhFrontend::from_files(
                &files.lexicon,
                &files.phones,
                files.tones.as_deref(),
            )?),
            Lang::En => Self::En(EnFrontend::from_files(&files.lexicon, &files.phones)?),
        };
        info!(
            lang = %lang,
            lexicon = %files.lexicon.display(),
            phones = %files.phones.display(),
            "Frontend loaded"
        );
        Ok(frontend)
    }
}

impl TextFrontend for Frontend {
    fn lang(&self) -> Lang {
        match self {
            Self::Zh(f) => f.lang(),
            Self::En(f) => f.lang(),
        }
    }

    fn get_input_ids(&self, text: &str, options: FrontendOptions) -> TtsResult<PhoneticFeatures> {
        match self {
            Self::Zh(f) => f.get_input_ids(text, options),
            Self::En(f) => f.get_input_ids(text, options),
        }
    }
}

/// A mock frontend for testing without vocabulary files.
#[derive(Debug, Clone)]
pub struct MockFrontend {
    lang: Lang,
    vocab_size: i64,
}

impl MockFrontend {
    /// Create a new mock frontend.
    pub fn new(lang: Lang, vocab_size: i64) -> Self {
        Self {
            lang,
            vocab_size: vocab_size.max(1),
        }
    }
}

impl TextFrontend for MockFrontend {
    fn lang(&self) -> Lang {
        self.lang
    }

    fn get_input_ids(&self, text: &str, options: FrontendOptions) -> TtsResult<PhoneticFeatures> {
        // One id per non-space character
        let sentences = split_sentences(text, &['.', '!', '?', '。', '！', '？', '，', ','])
            .into_iter()
            .map(|s| {
                let phones: Vec<i64> = s
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| c as i64 % self.vocab_size)
                    .collect();
                let tones = phones.iter().map(|id| id % 5).collect();
                SentencePhones { phones, tones }
            })
            .collect();

        let with_tones = options.get_tone_ids && self.lang == Lang::Zh;
        batch_sentences(sentences, options, with_tones, None)
    }
}

/// Phone (and tone) ids of one sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SentencePhones {
    pub(crate) phones: Vec<i64>,
    pub(crate) tones: Vec<i64>,
}

/// Split text at any of `delimiters`, dropping empty pieces.
pub(crate) fn split_sentences(text: &str, delimiters: &[char]) -> Vec<String> {
    text.split(|c| delimiters.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Arrange per-sentence ids into batch entries.
///
/// In merge mode all sentences become one entry, joined by `pause` when given.
/// Merge mode always yields exactly one entry, even for empty text.
pub(crate) fn batch_sentences(
    sentences: Vec<SentencePhones>,
    options: FrontendOptions,
    with_tones: bool,
    pause: Option<(i64, i64)>,
) -> TtsResult<PhoneticFeatures> {
    let entries = if options.merge_sentences {
        let mut merged = SentencePhones::default();
        for (i, sentence) in sentences.into_iter().enumerate() {
            if i > 0
                && let Some((phone, tone)) = pause
            {
                merged.phones.push(phone);
                merged.tones.push(tone);
            }
            merged.phones.extend(sentence.phones);
            merged.tones.extend(sentence.tones);
        }
        vec![merged]
    } else {
        sentences
    };

    let (phones, tones): (Vec<_>, Vec<_>) = entries.into_iter().map(|s| (s.phones, s.tones)).unzip();
    if with_tones {
        PhoneticFeatures::with_tones(phones, tones)
    } else {
        Ok(PhoneticFeatures::new(phones))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_drops_empty() {
        let parts = split_sentences("a, ,b.", &[',', '.']);
        assert_eq!(parts, vec!["a", "b"]);
    }

    #[test]
    fn test_batch_merge_empty_text_yields_one_entry() {
        let features = batch_sentences(Vec::new(), FrontendOptions::default(), false, None).unwrap();
        assert_eq!(features.phone_ids, vec![Vec::<i64>::new()]);
    }

    #[test]
    fn test_batch_merge_with_pause_and_tones() {
        let sentences = vec![
            SentencePhones {
                phones: vec![1, 2],
                tones: vec![0, 3],
            },
            SentencePhones {
                phones: vec![4],
                tones: vec![1],
            },
        ];
        let options = FrontendOptions::default().with_tone_ids(true);
        let features = batch_sentences(sentences, options, true, Some((9, 0))).unwrap();
        assert_eq!(features.phone_ids, vec![vec![1, 2, 9, 4]]);
        assert_eq!(features.tone_ids, Some(vec![vec![0, 3, 0, 1]]));
    }

    #[test]
    fn test_mock_frontend_merges() {
        let frontend = MockFrontend::new(Lang::Zh, 256);
        let features = frontend
            .get_input_ids("测试。你好", FrontendOptions::default())
            .unwrap();
        assert_eq!(features.num_entries(), 1);
        assert_eq!(features.phone_ids[0].len(), 4);
        assert!(features.tone_ids.is_none());
    }

    #[test]
    fn test_mock_frontend_tones_only_for_zh() {
        let options = FrontendOptions::default().with_tone_ids(true);

        let zh = MockFrontend::new(Lang::Zh, 256).get_input_ids("测试", options).unwrap();
        let tones = zh.tone_ids.unwrap();
        assert_eq!(tones[0].len(), zh.phone_ids[0].len());

        let en = MockFrontend::new(Lang::En, 256).get_input_ids("test", options).unwrap();
        assert!(en.tone_ids.is_none());
    }

    #[test]
    fn test_frontend_load_missing_files() {
        let files = FrontendFiles::new("/nonexistent/lexicon.txt", "/nonexistent/phones.txt");
        let err = Frontend::load(Lang::En, &files).unwrap_err();
        assert!(matches!(err, tts_core::TtsError::Config(_)));
    }
}
