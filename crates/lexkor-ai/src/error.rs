//! LLM call errors.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("LLM request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The provider refused the prompt or the completion on policy grounds.
    #[error("blocked by content filter [{}]: {message}", categories.join(", "))]
    ContentFilter {
        categories: Vec<String>,
        message: String,
    },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl LlmError {
    /// Classify a non-2xx response, recognising content-filter rejections.
    pub fn from_status(status: u16, body: String) -> Self {
        match content_filter_categories(&body) {
            Some(categories) => LlmError::ContentFilter {
                message: error_message(&body).unwrap_or_else(|| body.clone()),
                categories,
            },
            None => LlmError::Http { status, body },
        }
    }

    pub fn is_content_filter(&self) -> bool {
        matches!(self, LlmError::ContentFilter { .. })
    }

    /// Rejection categories, if this is a content-filter error.
    pub fn content_filter_categories(&self) -> Option<&[String]> {
        match self {
            LlmError::ContentFilter { categories, .. } => Some(categories),
            _ => None,
        }
    }
}

/// Content-filter categories from an error body, or `None` if the body is
/// some other kind of error.
///
/// Recognises the OpenAI/Azure shape:
/// `{"error": {"code": "content_filter", "innererror": {"code":
/// "ResponsibleAIPolicyViolation", "content_filter_result": {"violence":
/// {"filtered": true, ...}, ...}}}}`. Non-JSON bodies that mention
/// `content_filter` count as a rejection with no known categories.
pub fn content_filter_categories(body: &str) -> Option<Vec<String>> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.contains("content_filter").then(Vec::new);
    };
    let err = value.get("error").unwrap_or(&value);
    let code = err.get("code").and_then(Value::as_str);
    let inner = err.get("innererror");
    let inner_code = inner.and_then(|i| i.get("code")).and_then(Value::as_str);

    let is_filter =
        code == Some("content_filter") || inner_code == Some("ResponsibleAIPolicyViolation");
    if !is_filter {
        return None;
    }

    Some(
        inner
            .and_then(|i| i.get("content_filter_result"))
            .map(filtered_categories)
            .unwrap_or_default(),
    )
}

/// Names of the categories marked `"filtered": true` in a filter result map.
pub(crate) fn filtered_categories(result: &Value) -> Vec<String> {
    let Some(map) = result.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| v.get("filtered").and_then(Value::as_bool).unwrap_or(false))
        .map(|(k, _)| k.clone())
        .collect()
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AZURE_FILTER_BODY: &str = r#"{
        "error": {
            "message": "The response was filtered due to the prompt triggering content management policy.",
            "code": "content_filter",
            "status": 400,
            "innererror": {
                "code": "ResponsibleAIPolicyViolation",
                "content_filter_result": {
                    "hate": {"filtered": false, "severity": "safe"},
                    "self_harm": {"filtered": false, "severity": "safe"},
                    "sexual": {"filtered": false, "severity": "safe"},
                    "violence": {"filtered": true, "severity": "medium"}
                }
            }
        }
    }"#;

    #[test]
    fn classifies_content_filter_body() {
        let err = LlmError::from_status(400, AZURE_FILTER_BODY.to_string());
        assert!(err.is_content_filter());
        assert_eq!(err.content_filter_categories(), Some(&["violence".to_string()][..]));
        assert!(err.to_string().contains("content management policy"));
    }

    #[test]
    fn other_errors_stay_http() {
        let err = LlmError::from_status(
            401,
            r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#.into(),
        );
        assert!(!err.is_content_filter());
        assert!(matches!(err, LlmError::Http { status: 401, .. }));
    }

    #[test]
    fn plain_text_mention_counts_as_filter() {
        assert_eq!(
            content_filter_categories("blocked: content_filter triggered"),
            Some(vec![])
        );
        assert_eq!(content_filter_categories("internal server error"), None);
    }
}
