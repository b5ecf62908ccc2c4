use thiserror::Error;

/// Failure of a single statute-site or DRF step.
///
/// Resolution code logs these and moves on to the next step; they are not
/// returned from [`crate::ArticleResolver::resolve`] or
/// [`crate::PlanExecutor::execute`].
#[derive(Error, Debug)]
pub enum LawError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status} for {url}")]
    Server { status: u16, url: String },

    #[error("page reports the article as unavailable ({phrase})")]
    DeadLink { phrase: &'static str },

    #[error("DRF lookup not configured (no service key or proxy)")]
    NotConfigured,

    #[error("no detail link for {0} in DRF response")]
    NoDetailLink(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unsupported URL scheme: {0}")]
    Scheme(String),
}
