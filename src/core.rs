pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use error::LlmError;
pub use traits::ChatCompleter;
pub use types::{ChatCompletion, ChatRole, Choice, ChoiceMessage, CompletionOptions, Message, Usage};
