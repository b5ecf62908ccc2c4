//! Article resolution: body text plus the best display link.
//!
//! One chain, short-circuiting on the first link found:
//!
//! 1. Deep link (`/법령/<law>/<article>`, native script) is fetched. A live
//!    page supplies both the article text and the link.
//! 2. DRF search for the statute's detail link, pointed at the article with
//!    `JO=` when the label has a code. Skipped silently if unconfigured.
//! 3. Percent-encoded article URL (statute page when there is no article).
//!
//! Every step failure is logged and swallowed.

use lexkor_core::{
    Settings, canonical_law_name, deep_link_url, jo_code, normalize_article_label, pretty_url,
    statute_main_url,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::LawClient;
use crate::drf::{DrfClient, with_jo};
use crate::error::LawError;
use crate::liveness::dead_link_marker;
use crate::scrape::extract_article_text;

/// Article body (possibly empty) and display link (empty only for a blank law name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedArticle {
    pub text: String,
    pub link: String,
}

pub struct ArticleResolver {
    client: LawClient,
    drf: DrfClient,
    law_base_url: String,
}

impl ArticleResolver {
    pub fn new(settings: &Settings) -> Result<Self, LawError> {
        let client = LawClient::new(settings.fetch_timeout)?;
        Ok(Self {
            drf: DrfClient::new(client.clone(), settings),
            client,
            law_base_url: settings.law_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The underlying HTTP client, for other fetches under the same timeout.
    pub fn client(&self) -> &LawClient {
        &self.client
    }

    /// Resolve article text and link. Never fails.
    pub async fn resolve(&self, law_name: &str, article_label: &str) -> ResolvedArticle {
        let Some((law, article)) = normalize_target(law_name, article_label) else {
            debug!("blank law name, nothing to resolve");
            return ResolvedArticle::default();
        };
        info!(law = %law, article = %article, "resolving article");

        let deep = deep_link_url(&self.law_base_url, &law, &article);
        let mut resolved = ResolvedArticle::default();
        match self.fetch_live(&deep).await {
            Ok(body) => {
                resolved.text = extract_article_text(&body, &deep);
                resolved.link = deep;
            }
            Err(e) => warn!(url = %deep, error = %e, "deep link unusable"),
        }

        if resolved.link.is_empty() {
            resolved.link = self.upgrade_link(&law, &article).await;
        }
        info!(
            link = %resolved.link,
            chars = resolved.text.chars().count(),
            "article resolved"
        );
        resolved
    }

    /// Link-only resolution: the deep link is kept only if its page is live.
    pub async fn resolve_article_url(&self, law_name: &str, article_label: &str) -> String {
        let Some((law, article)) = normalize_target(law_name, article_label) else {
            return String::new();
        };
        let deep = deep_link_url(&self.law_base_url, &law, &article);
        match self.fetch_live(&deep).await {
            Ok(_) => deep,
            Err(e) => {
                warn!(url = %deep, error = %e, "deep link failed liveness check");
                self.upgrade_link(&law, &article).await
            }
        }
    }

    /// DRF detail link, or `None` when unconfigured or the lookup failed.
    pub async fn drf_link(&self, law: &str, article: &str) -> Option<String> {
        if !self.drf.is_configured() {
            debug!("DRF lookup not configured, skipping");
            return None;
        }
        match self.drf.detail_link(law).await {
            Ok(link) => Some(match jo_code(article) {
                Some(jo) => with_jo(&link, &jo),
                None => link,
            }),
            Err(e) => {
                warn!(law = %law, error = %e, "DRF lookup failed");
                None
            }
        }
    }

    /// Last-resort link, built without any network access.
    pub fn fallback_link(&self, law: &str, article: &str) -> String {
        if article.is_empty() {
            statute_main_url(&self.law_base_url, law)
        } else {
            pretty_url(&self.law_base_url, law, article)
        }
    }

    async fn upgrade_link(&self, law: &str, article: &str) -> String {
        match self.drf_link(law, article).await {
            Some(link) => link,
            None => {
                debug!("using constructed fallback link");
                self.fallback_link(law, article)
            }
        }
    }

    async fn fetch_live(&self, url: &str) -> Result<String, LawError> {
        let body = self.client.get_text(url).await?;
        match dead_link_marker(&body) {
            Some(phrase) => Err(LawError::DeadLink { phrase }),
            None => Ok(body),
        }
    }
}

/// Canonical law name and article label; `None` when the law name is blank.
fn normalize_target(law_name: &str, article_label: &str) -> Option<(String, String)> {
    let law = canonical_law_name(law_name);
    if law.is_empty() {
        return None;
    }
    Some((law, normalize_article_label(article_label)))
}
