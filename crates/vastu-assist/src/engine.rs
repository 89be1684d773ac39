//! Text-generation backends the interpreter can consult.

use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::json;
use vastu_core::{ai_configured, BackendKind, Settings};

use crate::error::BackendError;

/// What a probe found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub connected: bool,
    pub models: Vec<String>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs and status ("ollama", "openai", ...).
    fn name(&self) -> &str;

    async fn probe(&self) -> Result<Capabilities, BackendError>;

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, BackendError>;
}

/// Pick the backend the settings ask for. `None` means heuristics only.
pub fn from_settings(settings: &Settings) -> Option<Box<dyn Backend>> {
    match settings.backend {
        BackendKind::None => None,
        BackendKind::Ollama => Some(Box::new(OllamaBackend::new(&settings.ollama_url))),
        BackendKind::Provider => Some(Box::new(ProviderBackend::new(settings.clone()))),
    }
}

pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl Backend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn probe(&self) -> Result<Capabilities, BackendError> {
        let res = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(BackendError::Status(res.status().as_u16()));
        }
        let tags: TagsResponse = res.json().await?;
        Ok(Capabilities {
            connected: true,
            models: tags.models.into_iter().map(|m| m.name).collect(),
        })
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, BackendError> {
        let mut body = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": 0.7,
                "top_p": 0.9,
            },
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }

        let res = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(BackendError::Status(res.status().as_u16()));
        }
        let out: GenerateResponse = res.json().await?;
        if out.response.trim().is_empty() {
            return Err(BackendError::Empty);
        }
        Ok(out.response)
    }
}

/// Hosted providers through the `llm` crate.
pub struct ProviderBackend {
    settings: Settings,
}

impl ProviderBackend {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

fn map_backend(provider: &str) -> Result<LLMBackend, BackendError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(BackendError::UnknownProvider(other.to_string())),
    }
}

#[async_trait]
impl Backend for ProviderBackend {
    fn name(&self) -> &str {
        &self.settings.provider
    }

    /// No network round trip: hosted providers are taken as reachable once configured.
    async fn probe(&self) -> Result<Capabilities, BackendError> {
        if !ai_configured(&self.settings) {
            return Err(BackendError::NotConfigured);
        }
        map_backend(&self.settings.provider)?;
        Ok(Capabilities {
            connected: true,
            models: vec![self.settings.model.clone()],
        })
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, BackendError> {
        let backend = map_backend(&self.settings.provider)?;

        let mut builder = LLMBuilder::new().backend(backend).model(model);
        if let Some(system) = system {
            builder = builder.system(system);
        }
        if !self.settings.api_key.is_empty() {
            builder = builder.api_key(&self.settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| BackendError::Build(e.to_string()))?;

        let messages = vec![ChatMessage::user().content(prompt).build()];

        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| BackendError::Chat(e.to_string()))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(BackendError::Empty),
        }
    }
}
