//! Statute citation extraction from free text.
//!
//! Finds `<statute name> 제N조[의M[의K]]` references in model answers and user
//! questions. The name pattern is deliberately permissive (Hangul, Latin,
//! digits, middle dot, parentheses, whitespace), so the raw capture may drag in
//! leading prose; [`trim_law_name`] cuts it back to the statute name.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::alias::{canonical_law_name, is_known_law};

static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣A-Za-z0-9·ㆍ()\s]{2,40}?)[」』]?\s*(제[0-9]+조(?:의[0-9]+){0,2})").unwrap()
});

/// Trailing syllables that mark a token as prose (particles, connective endings).
const PARTICLE_ENDINGS: &[char] = &[
    '은', '는', '이', '가', '을', '를', '에', '의', '서', '로', '와', '과', '도', '만', '면',
    '고', '며', '요', '다', '게',
];

/// Tokens that are never part of a statute name.
const STOPWORDS: &[&str] = &[
    "그리고", "또한", "따라서", "관련", "해당", "위", "이", "그", "같은", "동법",
];

/// Conjunctions that appear inside official names but also between citations.
const CONJUNCTIONS: &[&str] = &["및", "또는"];

/// Tokens after which a particle-ending token still belongs to the name
/// ("…등에 관한 법률", "…에 대한 특례법").
const NAME_JOINERS: &[&str] = &["관한", "대한", "따른", "위한"];

/// A `(law_name, article_label)` pair found in text.
///
/// Ordered lexicographically by law name, then article label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArticleCitation {
    pub law_name: String,
    pub article_label: String,
}

impl ArticleCitation {
    pub fn new(law_name: impl Into<String>, article_label: impl Into<String>) -> Self {
        Self {
            law_name: law_name.into(),
            article_label: article_label.into(),
        }
    }
}

/// Extract every statute citation in `text`, alias-normalised and deduplicated.
pub fn extract_citations(text: &str) -> BTreeSet<ArticleCitation> {
    let mut out = BTreeSet::new();
    for caps in CITATION_RE.captures_iter(text) {
        let raw_name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let article = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        let Some(name) = trim_law_name(raw_name) else {
            continue;
        };
        out.insert(ArticleCitation::new(canonical_law_name(&name), article));
    }
    out
}

/// Cut a permissive name capture back to the statute name.
///
/// 1. The longest whitespace-token suffix the alias table knows wins outright.
/// 2. Otherwise walk tokens backwards, keeping them until one is a stopword,
///    a bare number/date, or ends in a particle (unless followed by a joiner
///    such as 관한).
///
/// Returns `None` when fewer than two characters survive.
pub fn trim_law_name(raw: &str) -> Option<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    for start in 0..tokens.len() {
        let candidate = tokens[start..].join(" ");
        if is_known_law(&candidate) {
            return Some(candidate);
        }
    }

    let mut kept: Vec<&str> = Vec::new();
    for (i, token) in tokens.iter().enumerate().rev() {
        let is_last = i == tokens.len() - 1;
        let followed_by_joiner = kept.last().is_some_and(|next| NAME_JOINERS.contains(next));
        if CONJUNCTIONS.contains(token) {
            // Inside a name ("노동조합 및 노동관계조정법") only when a name token precedes it.
            let inside = i > 0 && {
                let prev = tokens[i - 1];
                !STOPWORDS.contains(&prev) && !ends_with_particle(prev) && !looks_numeric(prev)
            };
            if !inside || is_last {
                break;
            }
            kept.push(token);
            continue;
        }
        if STOPWORDS.contains(token) || looks_numeric(token) {
            break;
        }
        if !is_last && !followed_by_joiner && ends_with_particle(token) {
            break;
        }
        kept.push(token);
    }
    kept.reverse();

    let name = kept.join(" ");
    (name.chars().count() >= 2).then_some(name)
}

fn ends_with_particle(token: &str) -> bool {
    token.chars().last().is_some_and(|c| PARTICLE_ENDINGS.contains(&c))
}

fn looks_numeric(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '년' | '월' | '일' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<(String, String)> {
        extract_citations(text)
            .into_iter()
            .map(|c| (c.law_name, c.article_label))
            .collect()
    }

    #[test]
    fn finds_branch_article() {
        let found = names("민법 제839조의2에 따르면 재산분할청구권은...");
        assert_eq!(found, vec![("민법".to_string(), "제839조의2".to_string())]);
    }

    #[test]
    fn normalises_alias() {
        let found = names("형소법 제200조");
        assert_eq!(found, vec![("형사소송법".to_string(), "제200조".to_string())]);
    }

    #[test]
    fn trims_leading_prose() {
        let found = names("이 사건은 민법 제750조의 불법행위에 해당합니다.");
        assert_eq!(found, vec![("민법".to_string(), "제750조".to_string())]);
    }

    #[test]
    fn multiple_citations_sorted_and_deduplicated() {
        let text = "형법 제250조와 민법 제750조, 그리고 다시 민법 제750조를 보면";
        let found = names(text);
        assert_eq!(
            found,
            vec![
                ("민법".to_string(), "제750조".to_string()),
                ("형법".to_string(), "제250조".to_string()),
            ]
        );
    }

    #[test]
    fn keeps_long_names_joined_by_gwanhan() {
        let found = names("가정폭력방지 및 피해자보호 등에 관한 법률 제4조를 참고");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "가정폭력방지 및 피해자보호 등에 관한 법률");
    }

    #[test]
    fn quoted_statute_name() {
        let found = names("「근로기준법」 제23조");
        assert_eq!(found, vec![("근로기준법".to_string(), "제23조".to_string())]);
    }

    #[test]
    fn bare_article_without_name_is_skipped() {
        assert!(names("제1조 및 제2조").is_empty());
    }

    #[test]
    fn no_citations() {
        assert!(extract_citations("이혼 절차가 궁금합니다").is_empty());
        assert!(extract_citations("").is_empty());
    }

    #[test]
    fn trim_rejects_single_char() {
        assert_eq!(trim_law_name("및"), None);
        assert_eq!(trim_law_name("   "), None);
    }
}
