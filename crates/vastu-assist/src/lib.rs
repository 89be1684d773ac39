pub mod engine;
mod error;
pub mod heuristic;
pub mod keywords;
mod parse;
pub mod prompt;
mod session;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vastu_core::{Command, DesignState, RuleCatalog};

pub use engine::{Backend, Capabilities};
pub use error::BackendError;
pub use parse::parse_response;
pub use session::{Outcome, Session};

/// How the remote strategy's response was turned into a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteParse {
    Structured,
    Keywords,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    Timeout,
    BackendError,
}

/// Which path produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Source {
    Heuristic,
    Remote { parse: RemoteParse },
    Fallback { reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub command: Command,
    pub source: Source,
}

/// Connection summary for callers and tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub connected: bool,
    pub backend: Option<String>,
    pub model: Option<String>,
    pub available_models: Vec<String>,
}

struct Remote {
    backend: Box<dyn Backend>,
    model: String,
    available: Vec<String>,
}

/// Turns utterances into commands. The remote strategy is chosen once, when
/// the interpreter is built; a failing call falls back for that call only.
pub struct Interpreter {
    catalog: Arc<RuleCatalog>,
    remote: Option<Remote>,
    timeout: Duration,
}

impl Interpreter {
    /// Heuristics only.
    pub fn offline(catalog: Arc<RuleCatalog>) -> Self {
        Self {
            catalog,
            remote: None,
            timeout: Duration::from_secs(vastu_core::settings::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Probe `backend` and keep it if it answers in time with a usable model.
    /// `model` is used when listed (or when the backend lists nothing), else
    /// the first listed model.
    pub async fn connect(
        catalog: Arc<RuleCatalog>,
        backend: Box<dyn Backend>,
        model: &str,
        timeout: Duration,
    ) -> Self {
        let mut interpreter = Self::offline(catalog);
        interpreter.timeout = timeout;

        let caps = match tokio::time::timeout(timeout, backend.probe()).await {
            Ok(Ok(caps)) => caps,
            Ok(Err(e)) => {
                warn!(backend = backend.name(), error = %e, "backend probe failed, using heuristics");
                return interpreter;
            }
            Err(_) => {
                warn!(backend = backend.name(), "backend probe timed out, using heuristics");
                return interpreter;
            }
        };
        if !caps.connected {
            info!(backend = backend.name(), "backend not connected, using heuristics");
            return interpreter;
        }

        let listed = caps.models.is_empty() || caps.models.iter().any(|m| m == model);
        let chosen = if !model.is_empty() && listed {
            Some(model.to_string())
        } else {
            caps.models.first().cloned()
        };
        let Some(chosen) = chosen else {
            warn!(backend = backend.name(), "backend lists no models, using heuristics");
            return interpreter;
        };

        info!(backend = backend.name(), model = %chosen, "using remote interpreter");
        interpreter.remote = Some(Remote {
            backend,
            model: chosen,
            available: caps.models,
        });
        interpreter
    }

    pub fn catalog(&self) -> &Arc<RuleCatalog> {
        &self.catalog
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn status(&self) -> BackendStatus {
        match &self.remote {
            Some(remote) => BackendStatus {
                connected: true,
                backend: Some(remote.backend.name().to_string()),
                model: Some(remote.model.clone()),
                available_models: remote.available.clone(),
            },
            None => BackendStatus {
                connected: false,
                backend: None,
                model: None,
                available_models: Vec::new(),
            },
        }
    }

    /// Never fails; every remote failure resolves to the heuristic command.
    pub async fn interpret(&self, text: &str, state: &DesignState) -> Interpretation {
        let Some(remote) = &self.remote else {
            return Interpretation {
                command: heuristic::interpret(text, state, &self.catalog),
                source: Source::Heuristic,
            };
        };

        let prompt = prompt::build(text, state, &self.catalog);
        let call = remote
            .backend
            .generate(&remote.model, &prompt, Some(prompt::SYSTEM));
        let reason = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => {
                debug!(len = raw.len(), "remote response received");
                let (command, parse) = parse_response(&raw, state, &self.catalog);
                return Interpretation {
                    command,
                    source: Source::Remote { parse },
                };
            }
            Ok(Err(e)) => {
                warn!(backend = remote.backend.name(), error = %e, "remote generation failed");
                FallbackReason::BackendError
            }
            Err(_) => {
                let e = BackendError::Timeout(self.timeout.as_secs());
                warn!(backend = remote.backend.name(), error = %e, "remote generation failed");
                FallbackReason::Timeout
            }
        };

        Interpretation {
            command: heuristic::interpret(text, state, &self.catalog),
            source: Source::Fallback { reason },
        }
    }
}
