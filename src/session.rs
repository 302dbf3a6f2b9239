use crate::conversation::{Conversation, Message};
use crate::profile;
use crate::router::{ResponseEnvelope, ResponseSource, Router};
use crate::speech::SpeechOutput;

/// Shown ahead of the reply when the hosted model could not answer.
pub const ERROR_NOTE: &str = "(AI error, showing diagnostic reply)";

/// Client-side conversation manager: owns the displayed history and hands a
/// snapshot of it to the router on every turn.
pub struct ChatSession<S: SpeechOutput> {
    router: Router,
    history: Conversation,
    speaker: S,
    last_source: Option<ResponseSource>,
}

impl<S: SpeechOutput> ChatSession<S> {
    /// Starts with the canned greeting already in the history.
    pub fn new(router: Router, speaker: S) -> Self {
        let greeting = profile::greeting(router.profile());
        Self {
            router,
            history: vec![Message::assistant(greeting)],
            speaker,
            last_source: None,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn last_source(&self) -> Option<ResponseSource> {
        self.last_source
    }

    pub fn speaker(&self) -> &S {
        &self.speaker
    }

    /// Send one user turn. Blank input is ignored and returns `None`.
    pub async fn send(&mut self, input: &str) -> Option<ResponseEnvelope> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }

        self.history.push(Message::user(prompt));
        let envelope = self.router.route(self.history.clone()).await;

        if envelope.source == ResponseSource::Error {
            self.history.push(Message::assistant(ERROR_NOTE));
        }
        self.history.push(Message::assistant(envelope.text.clone()));
        self.last_source = Some(envelope.source);

        self.speaker.cancel();
        self.speaker.speak(&envelope.text);
        Some(envelope)
    }
}
