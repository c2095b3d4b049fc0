//! Noun extraction for Korean board posts.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static HANGUL_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[가-힣]+").expect("valid regex"));

/// Words that carry no topic signal on this board.
pub const STOP_WORDS: &[&str] = &[
    "이다", "하다", "있다", "없다", "되다", "것", "수", "이", "그", "저", "저희", "우리", "같다",
    "말", "안", "좀", "정말", "진짜", "너무", "요청", "문의", "개선", "숲", "SOOP", "BJ", "방송",
    "유저", "운영자", "문제", "내용", "부분", "점", "하나", "이렇", "또한", "어요", "저렇", "보이",
    "아니", "그렇",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Extracts noun tokens from free text.
pub trait NounExtractor {
    fn nouns(&self, text: &str) -> Vec<String>;
}

/// Suffixes of `noun + 하다` predicates. The noun before them is kept.
const HA_SUFFIXES: &[&str] = &[
    "해주세요", "했습니다", "했는데", "했어요", "합니다", "하세요", "하네요", "하지만", "하는데",
    "해야", "해서", "해요", "하다", "하는", "하고", "하게", "하지", "하면", "했다", "하기",
];

/// Endings that mark a verb or adjective. Words ending this way are not nouns.
const PREDICATE_ENDINGS: &[&str] = &[
    "습니다", "네요", "어요", "아요", "세요", "지요", "는데", "지만", "어서", "아서", "니까",
    "었다", "았다", "겠다", "는다", "어야", "려고",
];

/// Case particles and postpositions, longest first.
const PARTICLES: &[&str] = &[
    "에서는", "에게서", "으로는", "이라고", "에서", "에게", "으로", "까지", "부터", "처럼", "보다",
    "라고", "이나", "에는", "에도", "은", "는", "이", "가", "을", "를", "의", "에", "도", "와",
    "과", "로", "만", "랑",
];

/// Rule-based extractor that treats each run of Hangul syllables as an
/// eojeol, drops predicates and strips trailing particles.
///
/// Stripping never leaves a stem shorter than two syllables, so short nouns
/// that happen to end like a particle (`회의`, `아이`) survive intact.
#[derive(Debug, Default, Clone, Copy)]
pub struct HangulNouns;

impl HangulNouns {
    fn noun_of(eojeol: &str) -> Option<String> {
        if let Some(stem) = strip_suffix(eojeol, HA_SUFFIXES) {
            return Some(stem.to_string());
        }
        if PREDICATE_ENDINGS.iter().any(|e| eojeol.ends_with(e)) {
            return None;
        }
        Some(strip_suffix(eojeol, PARTICLES).unwrap_or(eojeol).to_string())
    }
}

impl NounExtractor for HangulNouns {
    fn nouns(&self, text: &str) -> Vec<String> {
        HANGUL_RUN_RE
            .find_iter(text)
            .filter_map(|m| Self::noun_of(m.as_str()))
            .collect()
    }
}

/// Removes the first matching suffix if at least two syllables remain.
fn strip_suffix<'a>(word: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    suffixes.iter().find_map(|suffix| {
        word.strip_suffix(suffix)
            .filter(|stem| stem.chars().count() >= 2)
    })
}

/// Turns a post into the token list the dictionary is built from: nouns
/// longer than one character that are not stop words.
#[must_use]
pub fn preprocess(text: &str, extractor: &dyn NounExtractor) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    extractor
        .nouns(text)
        .into_iter()
        .filter(|w| w.chars().count() > 1 && !STOP_SET.contains(w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nouns(text: &str) -> Vec<String> {
        HangulNouns.nouns(text)
    }

    #[test]
    fn particles_are_stripped() {
        assert_eq!(nouns("서버가 화질을"), vec!["서버", "화질"]);
        assert_eq!(nouns("채팅창에서는"), vec!["채팅창"]);
    }

    #[test]
    fn short_words_keep_particle_like_endings() {
        assert_eq!(nouns("회의 아이"), vec!["회의", "아이"]);
    }

    #[test]
    fn ha_predicates_keep_their_noun() {
        assert_eq!(nouns("불편해요 삭제해주세요"), vec!["불편", "삭제"]);
    }

    #[test]
    fn other_predicates_are_dropped() {
        assert!(nouns("좋겠습니다 없네요").is_empty());
    }

    #[test]
    fn non_hangul_is_ignored() {
        assert_eq!(nouns("SOOP 2024 버그!!"), vec!["버그"]);
    }

    #[test]
    fn preprocess_drops_stop_words_and_single_syllables() {
        let tokens = preprocess("방송 중에 문제가 생겨서 채팅 렉이 심함", &HangulNouns);
        assert!(!tokens.iter().any(|t| t == "방송" || t == "문제"));
        assert!(tokens.iter().all(|t| t.chars().count() > 1));
        assert!(tokens.contains(&"채팅".to_string()));
    }

    #[test]
    fn preprocess_of_blank_text_is_empty() {
        assert!(preprocess("   ", &HangulNouns).is_empty());
    }

    struct Fixed(Vec<&'static str>);

    impl NounExtractor for Fixed {
        fn nouns(&self, _text: &str) -> Vec<String> {
            self.0.iter().map(|s| (*s).to_string()).collect()
        }
    }

    #[test]
    fn preprocess_filters_any_extractor() {
        let extractor = Fixed(vec!["SOOP", "BJ", "x", "후원", "개선"]);
        assert_eq!(preprocess("text", &extractor), vec!["후원"]);
    }
}
