// Per-request resolution: hosted model when a credential and a question are
// present, the local profile otherwise.

use crate::config::Config;
use crate::conversation::{Conversation, last_user_question};
use crate::error::Result;
use crate::llm::ModelDelegator;
use crate::profile::{self, ProfileRecord};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply used when routing fails in a way nothing else accounts for.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process that.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Local,
    Remote,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub text: String,
    pub source: ResponseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl ResponseEnvelope {
    pub fn local(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ResponseSource::Local,
            model_id: None,
        }
    }

    pub fn remote(text: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ResponseSource::Remote,
            model_id: Some(model_id.into()),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ResponseSource::Error,
            model_id: None,
        }
    }
}

#[derive(Clone)]
pub struct Router {
    profile: Arc<ProfileRecord>,
    credential: Option<String>,
    delegator: ModelDelegator,
    api_key_env: String,
}

impl Router {
    /// `credential` is injected by the caller; the router never reads the
    /// environment itself.
    pub fn new(
        profile: Arc<ProfileRecord>,
        credential: Option<String>,
        delegator: ModelDelegator,
    ) -> Self {
        Self {
            profile,
            credential,
            delegator,
            api_key_env: crate::config::default_api_key_env(),
        }
    }

    pub fn from_config(
        config: &Config,
        profile: Arc<ProfileRecord>,
        credential: Option<String>,
    ) -> Result<Self> {
        let delegator = ModelDelegator::from_config(&config.llm)?;
        Ok(Self::new(profile, credential, delegator).with_api_key_env(&config.llm.api_key_env))
    }

    /// Name of the variable mentioned in the setup-failure apology.
    pub fn with_api_key_env(mut self, name: &str) -> Self {
        self.api_key_env = name.to_string();
        self
    }

    pub fn profile(&self) -> &ProfileRecord {
        &self.profile
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Drop the credential so every question is answered locally.
    pub fn local_only(mut self) -> Self {
        self.credential = None;
        self
    }

    /// Resolve one turn. Takes the conversation by value and keeps nothing
    /// once it returns. Always produces an envelope.
    pub async fn route(&self, conversation: Conversation) -> ResponseEnvelope {
        let router = self.clone();
        run_guarded(async move { router.resolve(conversation).await }).await
    }

    async fn resolve(&self, conversation: Conversation) -> ResponseEnvelope {
        let question = last_user_question(&conversation);

        match self.credential.as_deref() {
            Some(key) if !question.is_empty() => {
                match self.delegator.delegate(&conversation, &self.profile, key).await {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("hosted model setup failed: {e}");
                        ResponseEnvelope::error(self.setup_failure_text())
                    }
                }
            }
            _ => {
                debug!(has_question = !question.is_empty(), "answering from profile");
                ResponseEnvelope::local(profile::respond(question, &self.profile))
            }
        }
    }

    fn setup_failure_text(&self) -> String {
        format!(
            "I couldn't reach the AI provider. Please verify {} and network connectivity.",
            self.api_key_env
        )
    }
}

/// Run `work` on its own task; a panic becomes the fallback envelope.
async fn run_guarded<F>(work: F) -> ResponseEnvelope
where
    F: Future<Output = ResponseEnvelope> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("routing task failed: {e}");
            ResponseEnvelope::local(FALLBACK_REPLY)
        }
    }
}
