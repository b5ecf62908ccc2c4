//! Structured lookup plans produced by the LLM plan router.
//!
//! The model is asked for exactly one JSON object, but replies still arrive
//! wrapped in prose or code fences, with wrong casing, numbers where strings
//! belong, or malformed article codes. [`parse_plan`] locates the object and
//! [`sanitize_plan`] coerces it into a [`Plan`] whose fields are always present.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Maximum number of candidates kept after sanitation.
pub const MAX_CANDIDATES: usize = 3;

/// Raw model text preserved on a parse failure, in characters.
pub const RAW_PREVIEW_CHARS: usize = 2000;

/// Notes value marking a plan synthesised from unparseable model output.
pub const PARSE_ERROR_NOTE: &str = "parse_error";

/// What the user wants done with their query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanAction {
    /// Fetch the text of one specific article.
    GetArticle,
    /// Find which statute governs a topic.
    SearchLaw,
    /// Legal advice on a situation.
    Advice,
    /// Short general answer; also the fallback for anything unparseable.
    #[default]
    Quick,
}

impl PlanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetArticle => "GET_ARTICLE",
            Self::SearchLaw => "SEARCH_LAW",
            Self::Advice => "ADVICE",
            Self::Quick => "QUICK",
        }
    }

    /// Case-insensitive parse; `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET_ARTICLE" => Some(Self::GetArticle),
            "SEARCH_LAW" => Some(Self::SearchLaw),
            "ADVICE" => Some(Self::Advice),
            "QUICK" => Some(Self::Quick),
            _ => None,
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked (law, article) guess emitted alongside the primary target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub law_name: String,
    pub article_label: String,
    #[serde(default)]
    pub mst: String,
    #[serde(default)]
    pub jo: String,
}

/// Sanitised action plan for a single user query.
///
/// Every field is a (possibly empty) string after sanitation; `jo` is empty or
/// exactly 6 digits, `ef_yd` is empty or exactly 8 digits (YYYYMMDD), and
/// `candidates` holds at most [`MAX_CANDIDATES`] unique (law, article) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub action: PlanAction,
    pub law_name: String,
    pub mst: String,
    pub article_label: String,
    pub jo: String,
    #[serde(rename = "efYd")]
    pub ef_yd: String,
    pub notes: String,
    pub candidates: Vec<Candidate>,
    /// Leading model output kept for diagnostics when parsing failed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

impl Plan {
    /// Fallback plan for unparseable model output.
    pub fn parse_error(raw: &str) -> Self {
        Self {
            action: PlanAction::Quick,
            notes: PARSE_ERROR_NOTE.to_string(),
            raw: raw.chars().take(RAW_PREVIEW_CHARS).collect(),
            ..Self::default()
        }
    }

    pub fn is_parse_error(&self) -> bool {
        self.notes == PARSE_ERROR_NOTE
    }
}

/// Parse raw model output into a sanitised [`Plan`].
///
/// Never fails: output without a usable JSON object yields [`Plan::parse_error`].
pub fn parse_plan(raw: &str) -> Plan {
    match extract_json_object(raw) {
        Some(obj) => sanitize_plan(&obj),
        None => {
            warn!(len = raw.len(), "no JSON object in plan output, falling back to QUICK");
            Plan::parse_error(raw)
        }
    }
}

/// Coerce a loosely-shaped JSON object into a [`Plan`].
pub fn sanitize_plan(obj: &Map<String, Value>) -> Plan {
    let action_raw = string_field(obj, "action");
    let action = if action_raw.is_empty() {
        PlanAction::Quick
    } else {
        PlanAction::parse(&action_raw).unwrap_or_else(|| {
            warn!(action = %action_raw, "unknown plan action, using QUICK");
            PlanAction::Quick
        })
    };

    Plan {
        action,
        law_name: string_field(obj, "law_name"),
        mst: string_field(obj, "mst"),
        article_label: string_field(obj, "article_label"),
        jo: digits_or_empty(string_field(obj, "jo"), 6),
        ef_yd: digits_or_empty(string_field(obj, "efYd"), 8),
        notes: string_field(obj, "notes"),
        candidates: sanitize_candidates(obj.get("candidates")),
        raw: String::new(),
    }
}

fn sanitize_candidates(value: Option<&Value>) -> Vec<Candidate> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::with_capacity(MAX_CANDIDATES);
    for item in items {
        let Some(entry) = item.as_object() else {
            continue;
        };
        let candidate = Candidate {
            law_name: string_field(entry, "law_name"),
            article_label: string_field(entry, "article_label"),
            mst: string_field(entry, "mst"),
            jo: digits_or_empty(string_field(entry, "jo"), 6),
        };
        if candidate.law_name.is_empty() {
            continue;
        }
        let key = (candidate.law_name.clone(), candidate.article_label.clone());
        if !seen.insert(key) {
            continue;
        }
        out.push(candidate);
        if out.len() == MAX_CANDIDATES {
            break;
        }
    }
    out
}

/// Trimmed string value of `key`; numbers are stringified, anything else is empty.
fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn digits_or_empty(s: String, len: usize) -> String {
    if s.len() == len && s.bytes().all(|b| b.is_ascii_digit()) {
        s
    } else {
        String::new()
    }
}

/// Find the first balanced `{…}` span in `text` that deserialises to a JSON object.
///
/// Scans brace depth while skipping string literals (honouring `\` escapes),
/// so braces inside strings and stray braces in surrounding prose do not
/// derail the match. If a balanced span fails to parse, scanning resumes at
/// the next `{`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        if let Some(len) = balanced_span_len(&text.as_bytes()[start..])
            && let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&text[start..start + len])
        {
            return Some(obj);
        }
        from = start + 1;
    }
    None
}

/// Length of the balanced brace span starting at `bytes[0] == b'{'`.
///
/// Byte-level scanning is UTF-8 safe here: `{`, `}`, `"` and `\` never occur
/// inside multi-byte sequences.
fn balanced_span_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitizes_prose_wrapped_plan() {
        let raw = r#"here's your plan: {"action":"get_article","jo":"83조"}"#;
        let plan = parse_plan(raw);
        assert_eq!(plan.action, PlanAction::GetArticle);
        assert_eq!(plan.jo, "");
        assert_eq!(plan.law_name, "");
        assert_eq!(plan.mst, "");
        assert_eq!(plan.article_label, "");
        assert_eq!(plan.ef_yd, "");
        assert_eq!(plan.notes, "");
        assert!(plan.candidates.is_empty());
        assert!(!plan.is_parse_error());
    }

    #[test]
    fn unparseable_output_falls_back_to_quick() {
        let raw = "죄송합니다. 계획을 세울 수 없습니다.";
        let plan = parse_plan(raw);
        assert_eq!(plan.action, PlanAction::Quick);
        assert_eq!(plan.notes, PARSE_ERROR_NOTE);
        assert_eq!(plan.raw, raw);
    }

    #[test]
    fn parse_error_truncates_raw_text() {
        let raw = "가".repeat(RAW_PREVIEW_CHARS + 500);
        let plan = parse_plan(&raw);
        assert_eq!(plan.raw.chars().count(), RAW_PREVIEW_CHARS);
    }

    #[test]
    fn candidates_deduplicated_and_truncated() {
        let obj = json!({
            "action": "GET_ARTICLE",
            "candidates": [
                {"law_name": "민법", "article_label": "제839조의2"},
                {"law_name": "민법", "article_label": "제839조의2"},
                {"law_name": "민법", "article_label": "제843조"},
                {"law_name": "가사소송법", "article_label": "제2조"},
                {"law_name": "민법", "article_label": "제843조"}
            ]
        });
        let plan = sanitize_plan(obj.as_object().unwrap());
        let pairs: Vec<(&str, &str)> = plan
            .candidates
            .iter()
            .map(|c| (c.law_name.as_str(), c.article_label.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("민법", "제839조의2"), ("민법", "제843조"), ("가사소송법", "제2조")]
        );
    }

    #[test]
    fn malformed_candidates_are_dropped() {
        let obj = json!({
            "candidates": ["민법 제1조", 42, {"article_label": "제2조"}, {"law_name": " 형법 ", "jo": 25000}]
        });
        let plan = sanitize_plan(obj.as_object().unwrap());
        assert_eq!(plan.candidates.len(), 1);
        assert_eq!(plan.candidates[0].law_name, "형법");
        assert_eq!(plan.candidates[0].jo, "");
    }

    #[test]
    fn field_validation() {
        let obj = json!({
            "action": " search_law ",
            "law_name": "  민법 ",
            "mst": 123456,
            "jo": "083902",
            "efYd": "2024-01-01",
            "notes": null
        });
        let plan = sanitize_plan(obj.as_object().unwrap());
        assert_eq!(plan.action, PlanAction::SearchLaw);
        assert_eq!(plan.law_name, "민법");
        assert_eq!(plan.mst, "123456");
        assert_eq!(plan.jo, "083902");
        assert_eq!(plan.ef_yd, "");
        assert_eq!(plan.notes, "");
    }

    #[test]
    fn unknown_action_becomes_quick() {
        let obj = json!({"action": "summon_judge"});
        assert_eq!(sanitize_plan(obj.as_object().unwrap()).action, PlanAction::Quick);
    }

    #[test]
    fn valid_ef_yd_kept() {
        let obj = json!({"efYd": "20240101"});
        assert_eq!(sanitize_plan(obj.as_object().unwrap()).ef_yd, "20240101");
    }

    #[test]
    fn extract_skips_braces_in_prose_and_strings() {
        let text = r#"set {x} then ```json
{"action": "ADVICE", "notes": "use {braces} and \"quotes\""}
```"#;
        let obj = extract_json_object(text).unwrap();
        assert_eq!(obj["action"], "ADVICE");
        assert_eq!(obj["notes"], "use {braces} and \"quotes\"");
    }

    #[test]
    fn extract_handles_nested_objects() {
        let text = r#"{"action":"GET_ARTICLE","candidates":[{"law_name":"민법"}]} trailing }"#;
        let obj = extract_json_object(text).unwrap();
        assert!(obj["candidates"].is_array());
    }

    #[test]
    fn extract_none_for_unbalanced() {
        assert!(extract_json_object(r#"{"action": "QUICK""#).is_none());
        assert!(extract_json_object("no braces").is_none());
    }

    #[test]
    fn plan_serializes_with_ef_yd_key() {
        let plan = Plan {
            action: PlanAction::GetArticle,
            ef_yd: "20240101".into(),
            ..Plan::default()
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["action"], "GET_ARTICLE");
        assert_eq!(json["efYd"], "20240101");
        assert!(json.get("raw").is_none());
    }
}
