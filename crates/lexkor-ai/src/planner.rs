//! LLM-backed query planning.
//!
//! One temperature-0 completion per query, instructed to emit a single JSON
//! plan object. The raw text is handed to [`lexkor_core::parse_plan`], which
//! never fails: unusable output becomes a QUICK plan tagged `parse_error`.

use std::sync::Arc;

use lexkor_core::{Plan, parse_plan};
use tracing::{debug, info};

use crate::error::LlmError;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};

const PLANNER_PROMPT: &str = "\
당신은 한국 법률 질의를 분석해 처리 계획을 세우는 라우터입니다.

사용자 질문을 읽고 아래 형식의 JSON 객체 하나만 출력하세요. 마크다운 코드 펜스, 설명, 앞뒤 문장 없이 JSON만 출력합니다:
{
  \"action\": \"GET_ARTICLE | SEARCH_LAW | ADVICE | QUICK\",
  \"law_name\": \"법령의 공식 명칭 (예: 민법, 근로기준법). 모르면 빈 문자열\",
  \"mst\": \"\",
  \"article_label\": \"조문 표기 (예: 제839조의2). 없으면 빈 문자열\",
  \"jo\": \"6자리 조문 코드 (예: 083902) 또는 빈 문자열\",
  \"efYd\": \"시행일 YYYYMMDD 또는 빈 문자열\",
  \"notes\": \"판단 근거를 한 문장으로\",
  \"candidates\": [
    {\"law_name\": \"...\", \"article_label\": \"...\", \"mst\": \"\", \"jo\": \"\"}
  ]
}

action 선택 기준:
- GET_ARTICLE: 특정 법령의 특정 조문을 찾거나 원문을 보려는 경우
- SEARCH_LAW: 어떤 법령이 적용되는지 찾으려는 경우
- ADVICE: 구체적 사실관계에 대한 법률 검토나 조언을 원하는 경우
- QUICK: 그 밖의 일반 질문

candidates에는 확신이 없을 때 가능성 높은 순서로 최대 3개의 (법령, 조문) 후보를 넣으세요. \
약칭은 공식 명칭으로 바꾸세요 (예: 형소법 → 형사소송법).";

/// Turns a free-text query into a sanitised [`Plan`].
pub struct PlanRouter {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl PlanRouter {
    pub fn new(model: Arc<dyn ChatModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    /// Plan a query.
    ///
    /// Errors from the completion call itself propagate; there is no retry.
    /// Malformed model output is not an error.
    pub async fn plan(&self, query: &str) -> Result<Plan, LlmError> {
        let request = ChatRequest::new(
            self.model_name.clone(),
            vec![ChatMessage::system(PLANNER_PROMPT), ChatMessage::user(query)],
        )
        .temperature(0.0);

        let response = self.model.create(request).await?.into_response().await?;
        debug!(len = response.content.len(), "planner output received");

        let plan = parse_plan(response.content());
        info!(
            action = %plan.action,
            law = %plan.law_name,
            article = %plan.article_label,
            candidates = plan.candidates.len(),
            parse_error = plan.is_parse_error(),
            "plan ready"
        );
        Ok(plan)
    }
}
