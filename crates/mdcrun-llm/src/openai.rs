//! OpenAI / Azure OpenAI chat-completion provider (async-openai)

use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::error::{Error, Result};
use crate::message::{Message, MessageRole};
use crate::provider::LlmProvider;
use crate::util::{mask_api_key, sanitize_api_error};
use async_openai::{
    config::{AzureConfig, OpenAIConfig},
    types::chat::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
        CreateChatCompletionResponse, ResponseFormat,
    },
    Client,
};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default model for the public OpenAI API
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default Azure deployment name
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4";

/// Default Azure OpenAI API version
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which flavour of the chat-completion API to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiType {
    /// api.openai.com or a compatible proxy
    #[default]
    OpenAi,
    /// Azure OpenAI with an API key
    Azure,
}

impl FromStr for ApiType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "openai" | "open_ai" => Ok(Self::OpenAi),
            "azure" => Ok(Self::Azure),
            other => Err(Error::NotConfigured(format!("unsupported api type '{other}'"))),
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => f.write_str("openai"),
            Self::Azure => f.write_str("azure"),
        }
    }
}

/// Configuration for the OpenAI provider
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API flavour
    pub api_type: ApiType,
    /// API key for authentication
    pub api_key: String,
    /// Endpoint base (required for Azure, optional proxy for OpenAI)
    pub base_url: Option<String>,
    /// Azure API version
    pub api_version: String,
    /// Azure deployment id
    pub deployment: String,
    /// Default model for the public API
    pub default_model: String,
    /// Request timeout duration
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_type", &self.api_type)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Creates a new public-API configuration with the given key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_type: ApiType::OpenAi,
            api_key: api_key.into(),
            base_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates an Azure OpenAI configuration
    #[must_use]
    pub fn azure(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_type: ApiType::Azure,
            base_url: Some(endpoint.into()),
            ..Self::new(api_key)
        }
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// Returns error on an empty key or an Azure config without endpoint
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::NotConfigured("API key is empty".to_string()));
        }
        if self.api_type == ApiType::Azure && self.base_url.is_none() {
            return Err(Error::NotConfigured(
                "Azure OpenAI requires an endpoint base URL".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets a custom base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Sets the Azure deployment id
    #[must_use]
    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    /// Sets the Azure API version
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Model (public API) or deployment (Azure) requests are sent to
    pub fn effective_model(&self) -> &str {
        match self.api_type {
            ApiType::OpenAi => &self.default_model,
            ApiType::Azure => &self.deployment,
        }
    }
}

enum Backend {
    OpenAi(Client<OpenAIConfig>),
    Azure(Client<AzureConfig>),
}

/// OpenAI-compatible chat-completion provider
pub struct OpenAiProvider {
    backend: Backend,
    default_model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Creates a new provider with the given configuration
    ///
    /// # Errors
    /// Returns error if the configuration fails validation
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        config.validate()?;
        debug!(config = ?config, "Creating chat-completion provider");

        let backend = match config.api_type {
            ApiType::OpenAi => {
                let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
                if let Some(base_url) = &config.base_url {
                    openai_config = openai_config.with_api_base(base_url);
                }
                Backend::OpenAi(Client::with_config(openai_config))
            }
            ApiType::Azure => {
                let azure_config = AzureConfig::new()
                    .with_api_base(config.base_url.clone().unwrap_or_default())
                    .with_api_key(&config.api_key)
                    .with_api_version(&config.api_version)
                    .with_deployment_id(&config.deployment);
                Backend::Azure(Client::with_config(azure_config))
            }
        };

        Ok(Self {
            backend,
            default_model: config.effective_model().to_string(),
            timeout: config.timeout,
        })
    }

    fn convert_message(msg: &Message) -> ChatCompletionRequestMessage {
        match msg.role {
            MessageRole::System => ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                name: None,
            }
            .into(),
            MessageRole::User => ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }
            .into(),
            MessageRole::Assistant =>
            {
                #[allow(deprecated)]
                ChatCompletionRequestAssistantMessage {
                    content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                        msg.content.clone(),
                    )),
                    name: None,
                    tool_calls: None,
                    function_call: None,
                    refusal: None,
                    audio: None,
                }
                .into()
            }
        }
    }

    /// Azure API versions before `2024-09-01-preview` only know `max_tokens`,
    /// so the output limit is sent under the field each backend accepts.
    #[allow(deprecated)]
    fn build_request(&self, request: CompletionRequest) -> CreateChatCompletionRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };

        let mut openai_request = CreateChatCompletionRequest {
            model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            temperature: request.temperature,
            response_format: request.json_mode.then_some(ResponseFormat::JsonObject),
            ..Default::default()
        };
        match self.backend {
            Backend::OpenAi(_) => openai_request.max_completion_tokens = request.max_tokens,
            Backend::Azure(_) => openai_request.max_tokens = request.max_tokens,
        }
        openai_request
    }

    async fn send(
        &self,
        request: CreateChatCompletionRequest,
    ) -> std::result::Result<CreateChatCompletionResponse, async_openai::error::OpenAIError> {
        match &self.backend {
            Backend::OpenAi(client) => client.chat().create(request).await,
            Backend::Azure(client) => client.chat().create(request).await,
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        match self.backend {
            Backend::OpenAi(_) => "openai",
            Backend::Azure(_) => "azure",
        }
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let openai_request = self.build_request(request);
        debug!(provider = self.name(), "Sending chat completion request");

        let response = tokio::time::timeout(self.timeout, self.send(openai_request))
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| Error::Api(sanitize_api_error(&e.to_string())))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            content,
            usage,
            finish_reason: choice.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            model: response.model,
        })
    }
}
