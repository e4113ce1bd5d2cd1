//! Sentence manifests: one `utt_id token token ...` line per utterance.

use std::path::Path;

use tracing::warn;
use tts_core::{Lang, TtsError, TtsResult, Utterance};

/// Parse one manifest line. Blank lines yield `None`.
///
/// Tokens after the id are joined with the language's separator, so Chinese
/// text loses the spaces between tokens and English keeps single spaces.
pub fn parse_line(line: &str, lang: Lang) -> Option<Utterance> {
    let mut tokens = line.split_whitespace();
    let id = tokens.next()?;
    let text = tokens.collect::<Vec<_>>().join(lang.token_separator());
    Some(Utterance::new(id, text))
}

/// Parse manifest text, keeping line order.
pub fn parse_manifest(raw: &str, lang: Lang) -> Vec<Utterance> {
    let utterances: Vec<Utterance> = raw.lines().filter_map(|l| parse_line(l, lang)).collect();
    for utt in utterances.iter().filter(|u| u.text.is_empty()) {
        warn!(utt_id = %utt.id, "utterance has no text");
    }
    utterances
}

/// Read and parse a manifest file.
pub fn read_manifest(path: impl AsRef<Path>, lang: Lang) -> TtsResult<Vec<Utterance>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        TtsError::config(format!("cannot read manifest {}: {e}", path.display()))
    })?;
    Ok(parse_manifest(&raw, lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zh_tokens_joined_without_separator() {
        let utt = parse_line("utt001 你好世界", Lang::Zh).unwrap();
        assert_eq!(utt.id, "utt001");
        assert_eq!(utt.text, "你好世界");

        let utt = parse_line("utt002 你好 世界", Lang::Zh).unwrap();
        assert_eq!(utt.text, "你好世界");
    }

    #[test]
    fn test_en_tokens_joined_with_space() {
        let utt = parse_line("utt002 hello   world", Lang::En).unwrap();
        assert_eq!(utt.id, "utt002");
        assert_eq!(utt.text, "hello world");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let utts = parse_manifest("a 测试\n\n   \nb 你好\n", Lang::Zh);
        let ids: Vec<&str> = utts.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_id_only_line_has_empty_text() {
        let utts = parse_manifest("lonely\n", Lang::En);
        assert_eq!(utts, vec![Utterance::new("lonely", "")]);
    }

    #[test]
    fn test_missing_manifest_is_config_error() {
        let err = read_manifest("/nonexistent/sentences.txt", Lang::Zh).unwrap_err();
        assert!(matches!(err, TtsError::Config(_)));
    }
}
