use async_trait::async_trait;
use serde::Serialize;

use crate::core::{
    ChatCompleter, ChatCompletion, CompletionOptions, LlmError, Message,
    http::{HttpClient, HttpClientConfig},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Explicitly constructed client configuration.
///
/// There is no process-global client state: callers build a config, hand it
/// to [`CompletionClient::new`], and own the resulting client's lifecycle.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub extra_headers: Vec<(String, String)>,
    pub http: HttpClientConfig,
}

impl CompletionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            extra_headers: Vec::new(),
            http: HttpClientConfig::default(),
        }
    }

    /// Read the API key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV_VAR).map_err(|_| {
            LlmError::Configuration(format!("{API_KEY_ENV_VAR} is not set"))
        })?;
        Ok(Self::new(api_key))
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Attach an additional header to every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn http_config(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(flatten)]
    options: &'a CompletionOptions,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct CompletionClient {
    config: CompletionConfig,
    http: HttpClient,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, LlmError> {
        let user_agent = format!("llm-batch/{}", env!("CARGO_PKG_VERSION"));
        let http = HttpClient::new(config.http.clone(), Some(&user_agent))?;

        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatCompleter for CompletionClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<ChatCompletion, LlmError> {
        let request = ChatRequest {
            model,
            messages,
            options,
        };

        let mut headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.config.api_key),
        )];
        headers.extend(self.config.extra_headers.iter().cloned());

        self.http.post_json(&self.endpoint(), &headers, &request).await
    }
}
