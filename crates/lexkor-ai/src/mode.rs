//! Confidence-gated mode selection and per-mode system prompts.

use crate::classifier::Intent;

const QUICK_PROMPT: &str = "당신은 한국 법률 상담을 돕는 어시스턴트입니다. \
질문에 정확하고 이해하기 쉽게 답하세요. 확실하지 않은 내용은 추측하지 말고 \
확인이 필요하다고 밝히세요. 관련 법령이 있으면 법령명과 조문(예: 민법 제750조)을 \
정확히 표기하세요. 구체적 사건은 변호사 상담을 권유하세요.";

const LAWFINDER_PROMPT: &str = "당신은 한국 법령 검색 도우미입니다. \
사용자가 찾는 법령과 조문을 특정하고, 제공된 조문 원문이 있으면 그것을 근거로 \
요지를 설명하세요. 법령명은 공식 명칭으로, 조문은 '제N조의M' 형식으로 표기하세요. \
원문이 제공되지 않았다면 조문 번호와 취지만 안내하고 원문을 지어내지 마세요.";

const MEMO_PROMPT: &str = "당신은 법률 메모 작성 도우미입니다. \
사용자가 제공한 내용을 사실관계, 쟁점, 관련 법령, 검토 의견, 추가 확인 사항 순서로 \
구조화하여 정리하세요. 원문에 없는 사실을 덧붙이지 마세요.";

const DRAFT_PROMPT: &str = "당신은 법률 문서 초안 작성 도우미입니다. \
요청된 문서(내용증명, 고소장, 계약서 등)의 표준 형식에 맞춰 초안을 작성하고, \
당사자 정보나 날짜처럼 사용자가 채워야 할 부분은 [ ]로 표시하세요. \
초안 끝에 검토가 필요한 법적 쟁점을 짧게 덧붙이세요.";

const BRIEF_SUFFIX: &str = "\n\n답변은 핵심만 3~5문장 이내로 간결하게 작성하세요.";

/// Keep `intent` only if `confidence` clears its threshold; otherwise QUICK.
pub fn route(intent: Intent, confidence: f32) -> Intent {
    if confidence >= intent.threshold() {
        intent
    } else {
        Intent::Quick
    }
}

/// System prompt for `mode`, with a be-concise suffix when `brief`.
pub fn prompt_for(mode: Intent, brief: bool) -> String {
    let base = match mode {
        Intent::Quick => QUICK_PROMPT,
        Intent::LawFinder => LAWFINDER_PROMPT,
        Intent::Memo => MEMO_PROMPT,
        Intent::Draft => DRAFT_PROMPT,
    };
    if brief {
        format!("{base}{BRIEF_SUFFIX}")
    } else {
        base.to_string()
    }
}
