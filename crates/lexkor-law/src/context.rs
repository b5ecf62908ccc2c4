//! Page fetch for use as model context.

use tracing::warn;
use url::Url;

use crate::client::LawClient;
use crate::error::LawError;
use crate::scrape::{html_to_text, readable_text};

/// Prefix of the string returned when a fetch fails.
pub const FETCH_ERROR_PREFIX: &str = "[fetch error]";

/// Readable text of `url`, at most `max_chars` characters.
///
/// Failures come back as a string starting with [`FETCH_ERROR_PREFIX`] so the
/// result can be dropped straight into a prompt.
pub async fn fetch_for_context(client: &LawClient, url: &str, max_chars: usize) -> String {
    match fetch_text(client, url).await {
        Ok(text) => text.chars().take(max_chars).collect(),
        Err(e) => {
            warn!(url = %url, error = %e, "context fetch failed");
            format!("{FETCH_ERROR_PREFIX} {e}")
        }
    }
}

async fn fetch_text(client: &LawClient, url: &str) -> Result<String, LawError> {
    let parsed = Url::parse(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LawError::Scheme(parsed.scheme().to_string()));
    }
    let html = client.get_text(parsed.as_str()).await?;
    Ok(readable_text(&html, url).unwrap_or_else(|| html_to_text(&html)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> LawClient {
        LawClient::new(Duration::from_secs(3)).unwrap()
    }

    #[tokio::test]
    async fn returns_truncated_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>판결</title></head><body><p>가나다라마바사아자차카타파하</p></body></html>",
            ))
            .mount(&server)
            .await;

        let text = fetch_for_context(&client(), &server.uri(), 5).await;
        assert_eq!(text.chars().count(), 5);
        assert!(!text.starts_with(FETCH_ERROR_PREFIX));
    }

    #[tokio::test]
    async fn failures_become_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let text = fetch_for_context(&client(), &server.uri(), 100).await;
        assert!(text.starts_with("[fetch error]"));
        assert!(text.contains("503"));

        assert!(fetch_for_context(&client(), "not a url", 100).await.starts_with("[fetch error]"));
        assert!(
            fetch_for_context(&client(), "ftp://example.com/x", 100)
                .await
                .starts_with("[fetch error] unsupported URL scheme")
        );
    }
}
