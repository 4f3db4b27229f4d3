pub mod classify;
pub mod provider;
pub mod providers;

pub use classify::{ClassifyError, IntentFallback, LlmIntentClassifier};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
