pub mod client;
pub mod context;
pub mod drf;
pub mod error;
pub mod executor;
pub mod liveness;
pub mod resolver;
pub mod scrape;

pub use client::LawClient;
pub use context::{FETCH_ERROR_PREFIX, fetch_for_context};
pub use error::LawError;
pub use executor::{ArticleResult, ExecutionResult, PlanExecutor};
pub use resolver::{ArticleResolver, ResolvedArticle};
