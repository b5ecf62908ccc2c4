//! Dead-page detection for deep links.
//!
//! The statute site answers unknown or repealed articles with a normal 200
//! page, so a link is only trusted after its opening text has been checked.

use std::sync::LazyLock;

use regex::Regex;

use crate::scrape::html_to_text;

/// Characters of the response body that are scanned.
pub const LIVENESS_SCAN_CHARS: usize = 3000;

/// Phrases that mark a page as not-found, repealed or deleted.
const DEAD_PHRASES: &[&str] = &[
    "존재하지 않는 법령",
    "존재하지 않는 조문",
    "해당 법령이 없습니다",
    "해당 조문이 없습니다",
    "조회된 법령이 없습니다",
    "검색 결과가 없습니다",
    "페이지를 찾을 수 없습니다",
    "요청하신 페이지를 찾을 수 없",
    "폐지된 법령",
    "폐지된 조문",
    "삭제된 조문",
];

/// A deleted article is its heading followed directly by `삭제 <2015. 1. 6.>`.
/// A deleted paragraph (`② 삭제 <...>`) inside a live article does not match.
static DELETED_ARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"제\s*\d+\s*조(?:\s*의\s*\d+)?(?:\s*\([^)]*\))?\s*삭제\s*<\s*\d{4}\s*\.").unwrap()
});

/// The first dead-page marker found in the head of `body`, if any.
pub fn dead_link_marker(body: &str) -> Option<&'static str> {
    let head: String = body.chars().take(LIVENESS_SCAN_CHARS).collect();
    if let Some(phrase) = DEAD_PHRASES.iter().copied().find(|p| head.contains(p)) {
        return Some(phrase);
    }
    DELETED_ARTICLE_RE
        .is_match(&html_to_text(&head))
        .then_some("삭제")
}
