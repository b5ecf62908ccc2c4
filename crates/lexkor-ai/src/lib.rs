pub mod classifier;
pub mod error;
pub mod llm;
pub mod mock;
pub mod mode;
pub mod openai;
pub mod planner;
pub mod safe;

pub use classifier::{Intent, classify};
pub use error::LlmError;
pub use llm::{ChatMessage, ChatModel, ChatRequest, ChatResponse, Delta, DeltaStream, LlmReply};
pub use mock::ScriptedModel;
pub use mode::{prompt_for, route};
pub use openai::OpenAiClient;
pub use planner::PlanRouter;
pub use safe::{CompletionOptions, SafeOutcome, complete_safely};
