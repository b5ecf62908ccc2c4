//! Bounded-latency HTTP access to the statute site and DRF.

use std::time::Duration;

use tracing::debug;

use crate::error::LawError;

const USER_AGENT: &str = concat!("lexkor/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over `reqwest` with one fetch timeout for every call.
#[derive(Clone)]
pub struct LawClient {
    http: reqwest::Client,
}

impl LawClient {
    pub fn new(timeout: Duration) -> Result<Self, LawError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http })
    }

    /// GET `url` and return the body of a 2xx response as text.
    pub async fn get_text(&self, url: &str) -> Result<String, LawError> {
        self.get_with(url, &[], &[]).await
    }

    /// GET with query parameters and extra headers.
    ///
    /// Query values are not logged; they may carry the DRF service key.
    pub async fn get_with(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<String, LawError> {
        debug!(url = %url, params = query.len(), "GET");
        let mut request = self.http.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LawError::Server {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}
