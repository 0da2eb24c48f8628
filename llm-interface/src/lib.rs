//! Generative model calls with per-model retry, a fallback chain and
//! tolerant JSON extraction from the output.

pub mod backend;
pub mod caller;
pub mod fallback;
pub mod gemini;
pub mod parser;
pub mod retry;

pub use backend::{GenerationParams, GenerativeBackend};
pub use caller::ModelCaller;
pub use fallback::{aggregate_failure, FallbackOrchestrator, ALL_OVERLOADED_MESSAGE};
pub use gemini::GeminiBackend;
pub use parser::{parse_analysis, parse_json, parse_json_as, strip_code_fences, AnalysisPayload};
pub use retry::{RetryPolicy, RetryStrategy};
