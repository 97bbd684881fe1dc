use std::sync::Arc;

use tutor_core::Clock;
use tutor_core::model::{ChatMessage, ChatTranscript, Locale};

use super::service::ChatTutorService;
use crate::error::ChatError;

#[must_use]
pub fn welcome_message(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Hi! I'm your AI tutor. Ask me anything about this lesson.",
        Locale::Ru => "Привет! Я ваш ИИ-наставник. Задайте любой вопрос по этому уроку.",
        Locale::Uz => "Salom! Men sizning AI ustozingizman. Ushbu dars bo'yicha istalgan savolni bering.",
    }
}

/// One conversation with the tutor. Lives for the lesson view only.
pub struct ChatSession {
    service: Arc<ChatTutorService>,
    clock: Clock,
    locale: Locale,
    transcript: ChatTranscript,
    last_error: Option<String>,
}

impl ChatSession {
    #[must_use]
    pub fn new(service: Arc<ChatTutorService>, clock: Clock, locale: Locale) -> Self {
        Self {
            transcript: ChatTranscript::with_welcome(welcome_message(locale), clock.now()),
            service,
            clock,
            locale,
            last_error: None,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    /// Message to show under the conversation after a failed send.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Later messages carry the new locale's reply-language instruction.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Appends the learner's message, asks the tutor and appends the reply.
    ///
    /// On failure the learner's message stays in the transcript and
    /// `last_error` holds the text to display.
    ///
    /// # Errors
    ///
    /// Returns the `ChatError` from the tutor service, or
    /// `ChatError::EmptyMessage` for blank input (nothing is appended).
    pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.transcript.push_user(text, self.clock.now());
        self.last_error = None;

        match self.service.ask(self.locale, text).await {
            Ok(reply) => {
                self.transcript.push_assistant(reply.clone(), self.clock.now());
                Ok(reply)
            }
            Err(e) => {
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
