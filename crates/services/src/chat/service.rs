use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;

use tutor_core::model::Locale;

use super::config::{BasicAuth, ChatConfig};
use super::reply::{error_message, extract_reply};
use crate::error::{ChatConfigError, ChatError};

pub const GENERIC_FAILURE: &str = "Failed to reach AI service";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Prefixes a reply-language instruction for non-English locales.
#[must_use]
pub fn localized_prompt(locale: Locale, message: &str) -> String {
    match locale {
        Locale::En => message.to_string(),
        Locale::Ru => format!("Отвечай, пожалуйста, на русском языке.\n\n{message}"),
        Locale::Uz => format!("Iltimos, javoblarni o'zbek tilida yozing.\n\n{message}"),
    }
}

/// Stateless client for the tutor chat endpoint.
#[derive(Clone, Debug)]
pub struct ChatTutorService {
    client: Client,
    config: ChatConfig,
}

impl ChatTutorService {
    /// # Errors
    ///
    /// Returns `ChatConfigError` when the environment holds an unusable setting.
    pub fn from_env() -> Result<Self, ChatConfigError> {
        Ok(Self::new(ChatConfig::from_env()?))
    }

    #[must_use]
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Sends one learner message and returns the tutor's reply text.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` for blank input, `ChatError::Timeout`
    /// when the configured timeout elapses, `ChatError::Http` for a non-success
    /// status and `ChatError::UnrecognizedSchema` when no reply shape matches.
    pub async fn ask(&self, locale: Locale, message: &str) -> Result<String, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let payload = localized_prompt(locale, message);

        let mut request = self
            .client
            .post(self.config.endpoint.clone())
            .timeout(self.config.timeout)
            .json(&ChatRequest { message: &payload });
        request = match &self.config.basic_auth {
            Some(BasicAuth::Encoded(token)) => request.header(AUTHORIZATION, format!("Basic {token}")),
            Some(BasicAuth::Credentials { user, password }) => request.basic_auth(user, Some(password)),
            None => request,
        };

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let raw = response.text().await.map_err(classify)?;

        if !status.is_success() {
            let message = error_message(&raw).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            tracing::warn!(%status, %message, "chat request rejected");
            return Err(ChatError::Http { status, message });
        }

        let body: Value = serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(error = %e, "chat reply is not JSON");
            ChatError::UnrecognizedSchema
        })?;
        match extract_reply(&body) {
            Some((schema, reply)) => {
                tracing::debug!(?schema, "chat reply received");
                Ok(reply)
            }
            None => {
                tracing::warn!("chat reply matched no known schema");
                Err(ChatError::UnrecognizedSchema)
            }
        }
    }
}

fn classify(err: reqwest::Error) -> ChatError {
    if err.is_timeout() {
        tracing::warn!(error = %err, "chat request timed out");
        ChatError::Timeout
    } else {
        tracing::warn!(error = %err, "chat transport failure");
        ChatError::Transport(err)
    }
}
