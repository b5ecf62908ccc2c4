pub mod alias;
pub mod article;
pub mod citation;
pub mod config;
pub mod links;
pub mod plan;

pub use alias::canonical_law_name;
pub use article::{ArticleNo, jo_code, normalize_article_label, parse_article_label};
pub use citation::{ArticleCitation, extract_citations};
pub use config::Settings;
pub use links::{LinkComposer, RELATED_LINKS_HEADING, deep_link_url, pretty_url, statute_main_url};
pub use plan::{Candidate, Plan, PlanAction, parse_plan, sanitize_plan};
