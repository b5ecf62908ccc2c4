//! End-to-end answer pipeline.
//!
//! classify → route → (LAWFINDER: plan → execute → article context) →
//! guarded completion → related-links merge.

use std::sync::Arc;

use futures::StreamExt;
use lexkor_ai::safe::{CompletionOptions, SafeOutcome, complete_safely};
use lexkor_ai::{ChatMessage, ChatModel, Intent, LlmError, PlanRouter, classify, prompt_for, route};
use lexkor_core::{LinkComposer, Plan, RELATED_LINKS_HEADING};
use lexkor_law::{ArticleResolver, ArticleResult, ExecutionResult, PlanExecutor};
use tracing::{info, warn};

/// Article text passed to the model as context, at most.
const MAX_CONTEXT_CHARS: usize = 6000;

/// What the pipeline produced for one query.
#[derive(Debug)]
pub struct Answer {
    pub intent: Intent,
    pub confidence: f32,
    pub mode: Intent,
    pub plan: Option<Plan>,
    pub execution: Option<ExecutionResult>,
    /// Final text, with the related-links block merged in unless blocked.
    pub text: String,
    /// The model output as produced, before link merging.
    pub raw_text: String,
    /// Content-filter categories when the completion was withheld.
    pub blocked: Option<Vec<String>>,
}

pub struct AnswerPipeline {
    model: Arc<dyn ChatModel>,
    model_name: String,
    planner: PlanRouter,
    resolver: ArticleResolver,
    composer: LinkComposer,
}

impl AnswerPipeline {
    pub fn new(
        model: Arc<dyn ChatModel>,
        model_name: impl Into<String>,
        resolver: ArticleResolver,
        composer: LinkComposer,
    ) -> Self {
        let model_name = model_name.into();
        Self {
            planner: PlanRouter::new(model.clone(), model_name.clone()),
            model,
            model_name,
            resolver,
            composer,
        }
    }

    /// Answer `query`. When `stream` is set, text chunks are passed to
    /// `on_chunk` as they arrive.
    pub async fn answer(
        &self,
        query: &str,
        brief: bool,
        stream: bool,
        on_chunk: &mut (dyn FnMut(&str) + Send),
    ) -> Result<Answer, LlmError> {
        let (intent, confidence) = classify(query);
        let mode = route(intent, confidence);
        info!(intent = %intent, confidence, mode = %mode, "query classified");

        let mut messages = vec![ChatMessage::system(prompt_for(mode, brief))];
        let mut plan = None;
        let mut execution = None;
        if mode == Intent::LawFinder {
            let p = self.planner.plan(query).await?;
            let result = PlanExecutor::new(&self.resolver).execute(&p).await;
            if let ExecutionResult::Article(article) = &result
                && let Some(context) = article_context(article)
            {
                messages.push(ChatMessage::system(context));
            }
            plan = Some(p);
            execution = Some(result);
        }
        messages.push(ChatMessage::user(query));

        let options = CompletionOptions {
            temperature: Some(0.2),
            ..CompletionOptions::default()
        };
        let outcome =
            complete_safely(self.model.as_ref(), &messages, &self.model_name, stream, true, &options)
                .await?;

        let (raw_text, blocked) = match outcome {
            SafeOutcome::Ok(resp) => (resp.content, None),
            SafeOutcome::Stream(mut deltas) => {
                let mut text = String::new();
                while let Some(delta) = deltas.next().await {
                    if let Some(chunk) = delta?.content {
                        on_chunk(&chunk);
                        text.push_str(&chunk);
                    }
                }
                (text, None)
            }
            SafeOutcome::Blocked { message, categories } => {
                warn!(categories = ?categories, "answer withheld");
                (message, Some(categories))
            }
        };

        let text = if blocked.is_some() {
            raw_text.clone()
        } else {
            self.composer.merge(&raw_text)
        };
        Ok(Answer {
            intent,
            confidence,
            mode,
            plan,
            execution,
            text,
            raw_text,
            blocked,
        })
    }
}

/// System message carrying a resolved article, or `None` if nothing was found.
fn article_context(article: &ArticleResult) -> Option<String> {
    if article.text.is_empty() && article.link.is_empty() {
        return None;
    }
    let mut context = format!(
        "참고 조문: {} {}\n",
        article.law, article.article
    );
    if !article.link.is_empty() {
        context.push_str(&format!("원문 링크: {}\n", article.link));
    }
    if article.text.is_empty() {
        context.push_str("조문 원문을 가져오지 못했습니다. 원문을 지어내지 마세요.");
    } else {
        let text: String = article.text.chars().take(MAX_CONTEXT_CHARS).collect();
        context.push_str("\n[조문 원문]\n");
        context.push_str(&text);
    }
    Some(context)
}

/// What to print after the streamed text: the part of `merged` that follows
/// it, or the whole links block when merging rewrote the streamed body.
pub fn streamed_suffix(merged: &str, streamed: &str) -> String {
    if let Some(rest) = merged.strip_prefix(streamed.trim_end()) {
        return rest.to_string();
    }
    match merged.rfind(RELATED_LINKS_HEADING) {
        Some(idx) => format!("\n\n{}", &merged[idx..]),
        None => String::new(),
    }
}
