use async_trait::async_trait;

use super::error::LlmError;
use super::types::{ChatCompletion, CompletionOptions, Message};

/// The seam between batch dispatch and an actual completion service.
///
/// Implementations issue exactly one request/response round trip per call
/// and hold no state that couples sibling calls; the dispatcher relies on
/// that independence when it fans a batch out concurrently.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Run one completion call for a single conversation.
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<ChatCompletion, LlmError>;
}
