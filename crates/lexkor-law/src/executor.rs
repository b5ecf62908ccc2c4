//! Plan execution.
//!
//! Only GET_ARTICLE is carried out here. Every other action comes back as a
//! `noop` result for the caller to dispatch, without touching the network.

use lexkor_core::{Plan, PlanAction};
use serde::Serialize;
use tracing::{debug, info};

use crate::resolver::ArticleResolver;

/// Outcome of [`PlanExecutor::execute`], tagged by `type` when serialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionResult {
    Article(ArticleResult),
    Noop { action: PlanAction, message: String },
}

/// Resolved GET_ARTICLE target.
///
/// `mst`, `jo` and `efYd` are always empty: the output shape is kept for
/// consumers of the older API-backed format, but no authoritative value is
/// looked up for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleResult {
    pub law: String,
    pub article: String,
    pub text: String,
    pub link: String,
    pub mst: String,
    pub jo: String,
    #[serde(rename = "efYd")]
    pub ef_yd: String,
}

impl ExecutionResult {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionResult::Article(_) => "article",
            ExecutionResult::Noop { .. } => "noop",
        }
    }
}

pub struct PlanExecutor<'a> {
    resolver: &'a ArticleResolver,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(resolver: &'a ArticleResolver) -> Self {
        Self { resolver }
    }

    /// Execute a sanitised plan. Never fails.
    pub async fn execute(&self, plan: &Plan) -> ExecutionResult {
        if plan.action != PlanAction::GetArticle {
            debug!(action = %plan.action, "action not handled here");
            return ExecutionResult::Noop {
                action: plan.action,
                message: format!(
                    "{} 요청은 조문 조회 대상이 아니므로 상위 처리 단계에서 처리해야 합니다.",
                    plan.action
                ),
            };
        }

        let (law, article) = target(plan);
        info!(law = %law, article = %article, "executing GET_ARTICLE");
        let resolved = self.resolver.resolve(&law, &article).await;

        ExecutionResult::Article(ArticleResult {
            law,
            article,
            text: resolved.text,
            link: resolved.link,
            ..ArticleResult::default()
        })
    }
}

/// The plan's own target, or its first named candidate when the law name is empty.
fn target(plan: &Plan) -> (String, String) {
    if !plan.law_name.is_empty() {
        return (plan.law_name.clone(), plan.article_label.clone());
    }
    match plan.candidates.iter().find(|c| !c.law_name.is_empty()) {
        Some(c) => {
            debug!(law = %c.law_name, "using first candidate");
            (c.law_name.clone(), c.article_label.clone())
        }
        None => (String::new(), plan.article_label.clone()),
    }
}
