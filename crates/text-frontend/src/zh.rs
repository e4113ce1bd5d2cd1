//! Mandarin frontend: lexicon lookup → pinyin syllables → initials/finals.

use std::path::Path;

use tracing::instrument;
use tts_core::{FrontendOptions, Lang, PhoneticFeatures, TextFrontend, TtsError, TtsResult};

use crate::lexicon::Lexicon;
use crate::vocab::IdMap;
use crate::{SentencePhones, batch_sentences, split_sentences};

/// Sentence delimiters (full-width and ASCII).
const SENTENCE_DELIMITERS: &[char] = &[
    '。', '！', '？', '；', '，', '、', '：', ',', '.', '!', '?', ';', ':',
];

/// Two-letter initials, checked before single letters.
const DOUBLE_INITIALS: &[&str] = &["zh", "ch", "sh"];

/// Single-letter initials.
const SINGLE_INITIALS: &str = "bpmfdtnlgkhjqxrzcsyw";

/// Tone assigned to initials and pauses.
const NO_TONE: &str = "0";

/// Tone of syllables written without a tone digit.
const NEUTRAL_TONE: &str = "5";

/// Mandarin frontend.
#[derive(Debug)]
pub struct ZhFrontend {
    lexicon: Lexicon,
    phones: IdMap,
    tones: Option<IdMap>,
}

impl ZhFrontend {
    /// Create a frontend from loaded vocabularies.
    pub fn new(lexicon: Lexicon, phones: IdMap, tones: Option<IdMap>) -> Self {
        Self {
            lexicon,
            phones,
            tones,
        }
    }

    /// Load lexicon and vocabularies from files.
    pub fn from_files(
        lexicon: impl AsRef<Path>,
        phones: impl AsRef<Path>,
        tones: Option<&Path>,
    ) -> TtsResult<Self> {
        let lexicon = Lexicon::from_file(lexicon, false)?;
        let phones = IdMap::from_file(phones)?;
        let tones = tones.map(IdMap::from_file).transpose()?;
        Ok(Self::new(lexicon, phones, tones))
    }

    fn sentence_phones(&self, sentence: &str, with_tones: bool) -> TtsResult<SentencePhones> {
        let tones = if with_tones {
            Some(self.tones.as_ref().ok_or_else(|| {
                TtsError::config("tone ids requested but no tone vocabulary was loaded")
            })?)
        } else {
            None
        };

        let chars: Vec<char> = sentence.chars().filter(|c| !c.is_whitespace()).collect();
        let mut out = SentencePhones::default();
        let mut pos = 0;
        while pos < chars.len() {
            let (consumed, syllables) = self.lexicon.longest_match(&chars, pos).ok_or_else(|| {
                TtsError::frontend(format!("no pronunciation for '{}'", chars[pos]))
            })?;
            for syllable in syllables {
                let (initial, fin, tone) = split_syllable(syllable);
                if !initial.is_empty() {
                    out.phones.push(self.phones.lookup(initial, "phone")?);
                    if let Some(tones) = tones {
                        out.tones.push(tones.lookup(NO_TONE, "tone")?);
                    }
                }
                match tones {
                    Some(tones) => {
                        out.phones.push(self.phones.lookup(fin, "phone")?);
                        out.tones.push(tones.lookup(tone, "tone")?);
                    }
                    None => {
                        let toned = format!("{fin}{tone}");
                        out.phones.push(self.phones.lookup(&toned, "phone")?);
                    }
                }
            }
            pos += consumed;
        }
        Ok(out)
    }

    fn pause(&self, with_tones: bool) -> Option<(i64, i64)> {
        let phone = self.phones.get("sp")?;
        if !with_tones {
            return Some((phone, 0));
        }
        let tone = self.tones.as_ref()?.get(NO_TONE)?;
        Some((phone, tone))
    }
}

impl TextFrontend for ZhFrontend {
    fn lang(&self) -> Lang {
        Lang::Zh
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    fn get_input_ids(&self, text: &str, options: FrontendOptions) -> TtsResult<PhoneticFeatures> {
        let sentences = split_sentences(text, SENTENCE_DELIMITERS)
            .into_iter()
            .map(|s| self.sentence_phones(&s, options.get_tone_ids))
            .collect::<TtsResult<Vec<_>>>()?;

        batch_sentences(
            sentences,
            options,
            options.get_tone_ids,
            self.pause(options.get_tone_ids),
        )
    }
}

/// Split a toned pinyin syllable into (initial, final, tone).
///
/// `zhong1` → (`zh`, `ong`, `1`); `er2` → (``, `er`, `2`); `de` → (`d`, `e`, `5`).
pub fn split_syllable(syllable: &str) -> (&str, &str, &str) {
    let (body, tone) = match syllable.char_indices().last() {
        Some((i, c)) if c.is_ascii_digit() => (&syllable[..i], &syllable[i..]),
        _ => (syllable, NEUTRAL_TONE),
    };

    let initial_len = DOUBLE_INITIALS
        .iter()
        .find(|ini| body.starts_with(**ini) && body.len() > ini.len())
        .map(|ini| ini.len())
        .or_else(|| {
            body.chars()
                .next()
                .filter(|c| SINGLE_INITIALS.contains(*c) && body.len() > 1)
                .map(|_| 1)
        })
        .unwrap_or(0);

    (&body[..initial_len], &body[initial_len..], tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEXICON: &str = "你 ni3\n好 hao3\n世 shi4\n界 jie4\n";
    const PHONES: &str = "sp 0\nn 1\nh 2\nsh 3\nj 4\ni3 5\nao3 6\ni4 7\nie4 8\ni 9\nao 10\nie 11\n";
    const TONES: &str = "0 0\n1 1\n2 2\n3 3\n4 4\n5 5\n";

    fn frontend(with_tones: bool) -> ZhFrontend {
        ZhFrontend::new(
            Lexicon::parse(LEXICON, "lexicon", false).unwrap(),
            IdMap::parse(PHONES, "phones").unwrap(),
            with_tones.then(|| IdMap::parse(TONES, "tones").unwrap()),
        )
    }

    #[test]
    fn test_split_syllable() {
        assert_eq!(split_syllable("zhong1"), ("zh", "ong", "1"));
        assert_eq!(split_syllable("ni3"), ("n", "i", "3"));
        assert_eq!(split_syllable("er2"), ("", "er", "2"));
        assert_eq!(split_syllable("a1"), ("", "a", "1"));
        assert_eq!(split_syllable("de"), ("d", "e", "5"));
    }

    #[test]
    fn test_toned_finals_without_tone_ids() {
        let features = frontend(false)
            .get_input_ids("你好", FrontendOptions::default())
            .unwrap();
        assert_eq!(features.phone_ids, vec![vec![1, 5, 2, 6]]);
        assert!(features.tone_ids.is_none());
    }

    #[test]
    fn test_tone_ids_are_aligned() {
        let options = FrontendOptions::default().with_tone_ids(true);
        let features = frontend(true).get_input_ids("你好", options).unwrap();
        assert_eq!(features.phone_ids, vec![vec![1, 9, 2, 10]]);
        assert_eq!(features.tone_ids, Some(vec![vec![0, 3, 0, 3]]));
    }

    #[test]
    fn test_merge_inserts_pause() {
        let features = frontend(false)
            .get_input_ids("你好，世界。", FrontendOptions::default())
            .unwrap();
        assert_eq!(features.phone_ids, vec![vec![1, 5, 2, 6, 0, 3, 7, 4, 8]]);
    }

    #[test]
    fn test_enumeration_comma_and_colon_split() {
        let options = FrontendOptions {
            merge_sentences: false,
            get_tone_ids: false,
        };
        let features = frontend(false).get_input_ids("你、好：世界", options).unwrap();
        assert_eq!(
            features.phone_ids,
            vec![vec![1, 5], vec![2, 6], vec![3, 7, 4, 8]]
        );
    }

    #[test]
    fn test_unmerged_keeps_sentences() {
        let options = FrontendOptions {
            merge_sentences: false,
            get_tone_ids: false,
        };
        let features = frontend(false).get_input_ids("你好。世界", options).unwrap();
        assert_eq!(features.phone_ids, vec![vec![1, 5, 2, 6], vec![3, 7, 4, 8]]);
    }

    #[test]
    fn test_unknown_character() {
        let err = frontend(false)
            .get_input_ids("你们", FrontendOptions::default())
            .unwrap_err();
        assert!(matches!(err, TtsError::Frontend(_)));
    }

    #[test]
    fn test_tones_without_vocabulary() {
        let options = FrontendOptions::default().with_tone_ids(true);
        let err = frontend(false).get_input_ids("你好", options).unwrap_err();
        assert!(matches!(err, TtsError::Config(_)));
    }
}
