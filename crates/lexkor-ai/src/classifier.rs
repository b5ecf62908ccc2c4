//! Rule-based intent classification for incoming questions.
//!
//! Ordered pattern checks, first match wins. No model, no network.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// General short answer.
    Quick,
    /// Statute or article lookup.
    LawFinder,
    /// Summarise or organise notes.
    Memo,
    /// Draft a document (complaint, contract, notice).
    Draft,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "QUICK",
            Self::LawFinder => "LAWFINDER",
            Self::Memo => "MEMO",
            Self::Draft => "DRAFT",
        }
    }

    /// Minimum confidence for [`crate::mode::route`] to keep this intent.
    pub fn threshold(&self) -> f32 {
        match self {
            Self::LawFinder => 0.70,
            Self::Draft => 0.65,
            Self::Memo => 0.60,
            Self::Quick => 0.0,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const LAWFINDER_CONFIDENCE: f32 = 0.85;
pub const DRAFT_CONFIDENCE: f32 = 0.70;
pub const MEMO_CONFIDENCE: f32 = 0.60;
pub const QUICK_CONFIDENCE: f32 = 0.55;

static STATUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"제\s*\d+\s*조|\d+\s*조\s*(?:의\s*\d+)?\s*(?:제\s*\d+\s*항)?|법령|법조문|조문|시행령|시행규칙|[가-힣]+법\s*(?:상|에서|에\s*따르|에\s*의하)|판례",
    )
    .unwrap()
});

static DRAFT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)초안|작성\s*해|작성해\s*줘|써\s*줘|서식|양식|내용증명|소장|고소장|답변서|준비서면|계약서|합의서|위임장|draft",
    )
    .unwrap()
});

static MEMO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)메모|요약|정리\s*해|정리해\s*줘|노트|기록\s*해|memo|note|summar").unwrap()
});

/// Classify a query into an [`Intent`] with a confidence in `[0, 1]`.
///
/// Blank input is `(Quick, 0.0)`. Otherwise statute vocabulary wins over
/// drafting vocabulary, which wins over note-taking vocabulary.
pub fn classify(query: &str) -> (Intent, f32) {
    let query = query.trim();
    if query.is_empty() {
        return (Intent::Quick, 0.0);
    }
    if STATUTE_RE.is_match(query) {
        return (Intent::LawFinder, LAWFINDER_CONFIDENCE);
    }
    if DRAFT_RE.is_match(query) {
        return (Intent::Draft, DRAFT_CONFIDENCE);
    }
    if MEMO_RE.is_match(query) {
        return (Intent::Memo, MEMO_CONFIDENCE);
    }
    (Intent::Quick, QUICK_CONFIDENCE)
}
