use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

fn null_as_empty<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Ordered chat history, oldest first.
pub type Conversation = Vec<Message>;

// Widget boilerplate: the canned greeting starts with "hi " and the
// onboarding copy lists the topics.
const GREETING_PREFIX: &str = "hi ";
const ONBOARDING_PHRASES: &[&str] = &["ask about", "skills, projects, goals, hobbies"];

/// Content of the newest user message, or "" when there is none.
pub fn last_user_question(conversation: &[Message]) -> &str {
    conversation
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// Whether `message` is the widget's own greeting/onboarding text.
pub fn is_boilerplate(message: &Message) -> bool {
    if message.role != Role::Assistant {
        return false;
    }
    let c = message.content.to_lowercase();
    c.starts_with(GREETING_PREFIX) || ONBOARDING_PHRASES.iter().any(|p| c.contains(p))
}

/// Drop boilerplate, then keep only the newest `window` messages in their
/// original order.
pub fn model_context(conversation: &[Message], window: usize) -> Vec<&Message> {
    let filtered: Vec<&Message> = conversation.iter().filter(|m| !is_boilerplate(m)).collect();
    let skip = filtered.len().saturating_sub(window);
    filtered.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_user_question_scans_from_newest() {
        let convo = vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
            Message::assistant("another reply"),
        ];
        assert_eq!(last_user_question(&convo), "second");
    }

    #[test]
    fn last_user_question_empty_without_user() {
        assert_eq!(last_user_question(&[]), "");
        assert_eq!(last_user_question(&[Message::assistant("hello")]), "");
    }

    #[test]
    fn greeting_and_onboarding_are_boilerplate() {
        assert!(is_boilerplate(&Message::assistant("Hi 👋 I'm here")));
        assert!(is_boilerplate(&Message::assistant(
            "You can ASK ABOUT anything"
        )));
        assert!(is_boilerplate(&Message::assistant(
            "I know his skills, projects, goals, hobbies and more"
        )));
        assert!(!is_boilerplate(&Message::assistant("High-level answer")));
    }

    #[test]
    fn user_messages_are_never_boilerplate() {
        assert!(!is_boilerplate(&Message::user("hi there")));
    }

    #[test]
    fn window_keeps_newest_in_order() {
        let convo: Vec<Message> = (0..20).map(|i| Message::user(format!("m{i}"))).collect();
        let ctx = model_context(&convo, 12);
        assert_eq!(ctx.len(), 12);
        assert_eq!(ctx[0].content, "m8");
        assert_eq!(ctx[11].content, "m19");
    }

    #[test]
    fn window_applies_after_filtering() {
        let mut convo = vec![Message::assistant("Hi 👋 welcome")];
        convo.extend((0..3).map(|i| Message::user(format!("q{i}"))));
        let ctx = model_context(&convo, 12);
        assert_eq!(ctx.len(), 3);
        assert!(ctx.iter().all(|m| m.role == Role::User));
    }

    #[test]
    fn null_content_reads_as_empty() {
        let m: Message = serde_json::from_str(r#"{"role":"assistant","content":null}"#).unwrap();
        assert_eq!(m, Message::assistant(""));
        let m: Message = serde_json::from_str(r#"{"role":"user"}"#).unwrap();
        assert_eq!(m, Message::user(""));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::system("x")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"x"}"#);
    }
}
