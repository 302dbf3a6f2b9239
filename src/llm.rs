use crate::config::LlmConfig;
use crate::conversation::{self, Message, Role};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::profile::{ASSISTANT_NAME, ProfileRecord};
use crate::router::ResponseEnvelope;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on the exhaustion diagnostic, ellipsis included.
pub const DIAGNOSTIC_LIMIT: usize = 500;
const RAW_BODY_LIMIT: usize = 200;

// -- OpenAI-compatible format --

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: &'a [WireMessage<'a>],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// One failed candidate. Only the most recent one is kept for the
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationAttempt {
    pub model_id: String,
    /// 0 when the call never produced an HTTP response.
    pub http_status: u16,
    pub raw_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl DelegationAttempt {
    fn new(model_id: &str, http_status: u16, raw_body: &str, parse_error: Option<String>) -> Self {
        Self {
            model_id: model_id.to_string(),
            http_status,
            raw_body: truncate_chars(raw_body, RAW_BODY_LIMIT),
            parse_error,
        }
    }
}

/// Sends the conversation to a hosted model, walking an ordered list of
/// candidate models until one produces a reply.
#[derive(Clone)]
pub struct ModelDelegator {
    http: HttpClient,
    endpoint: String,
    models: Vec<String>,
    temperature: f32,
    max_tokens: u32,
    history_window: usize,
}

impl ModelDelegator {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = HttpClient::new(
            concat!("folio-chat/", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            models: config.models.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            history_window: config.history_window,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Try each candidate in order and return the first usable reply.
    ///
    /// Per-candidate failures (transport error, non-2xx status, unparseable
    /// or empty body) are recorded and the next candidate is tried at once.
    /// When every candidate fails the result is an error envelope carrying
    /// a bounded diagnostic. `Err` is reserved for failures that stop any
    /// request from being issued.
    pub async fn delegate(
        &self,
        conversation: &[Message],
        profile: &ProfileRecord,
        credential: &str,
    ) -> Result<ResponseEnvelope> {
        let system = system_instruction(profile)?;
        let payload = outgoing_messages(&system, conversation, self.history_window);
        debug!(
            messages = payload.len(),
            candidates = self.models.len(),
            "delegating to hosted model"
        );

        let mut last_failure: Option<DelegationAttempt> = None;

        for model in &self.models {
            let request = CompletionRequest {
                model,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                messages: &payload,
            };

            let resp = match self.http.post_json(&self.endpoint, credential, &request).await {
                Ok(resp) => resp,
                Err(e) if e.is_structural() => return Err(e),
                Err(e) => {
                    warn!(model = %model, "candidate unreachable: {e}");
                    last_failure = Some(DelegationAttempt::new(model, 0, &e.to_string(), None));
                    continue;
                }
            };

            if !resp.is_success() {
                warn!(model = %model, status = resp.status, "candidate rejected request");
                last_failure = Some(DelegationAttempt::new(model, resp.status, &resp.body, None));
                continue;
            }

            match extract_reply(&resp.body) {
                Ok(Some(reply)) => {
                    info!(model = %model, "hosted model replied");
                    return Ok(ResponseEnvelope::remote(reply, model.clone()));
                }
                Ok(None) => {
                    warn!(model = %model, "candidate returned no content");
                    last_failure = Some(DelegationAttempt::new(model, resp.status, &resp.body, None));
                }
                Err(e) => {
                    warn!(model = %model, "candidate reply unparseable: {e}");
                    last_failure = Some(DelegationAttempt::new(
                        model,
                        resp.status,
                        &resp.body,
                        Some(e.to_string()),
                    ));
                }
            }
        }

        warn!(candidates = self.models.len(), "all candidates failed");
        Ok(ResponseEnvelope::error(exhaustion_diagnostic(
            self.models.len(),
            last_failure.as_ref(),
        )))
    }
}

/// System instruction: answer profile questions strictly from the embedded
/// record, everything else from general knowledge.
pub fn system_instruction(profile: &ProfileRecord) -> Result<String> {
    let profile_json = profile.to_pretty_json()?;
    Ok([
        format!("You are {ASSISTANT_NAME}, a helpful AI."),
        "You have two behaviors:".to_string(),
        format!(
            "1) If the user asks about {name}, you MUST ground your answer ONLY in the provided profile JSON. If a detail is missing, say: '{missing}' Do not invent details.",
            name = profile.name,
            missing = not_in_profile(profile),
        ),
        "2) If the user asks about anything else (general knowledge), answer normally using your knowledge.".to_string(),
        "Keep answers concise, clear, and friendly.".to_string(),
        "--- PROFILE JSON ---".to_string(),
        profile_json,
    ]
    .join("\n"))
}

/// Fixed refusal for details the profile does not contain.
pub fn not_in_profile(profile: &ProfileRecord) -> String {
    format!("This detail isn't in {}'s profile.", profile.name)
}

fn outgoing_messages<'a>(
    system: &'a str,
    conversation: &'a [Message],
    window: usize,
) -> Vec<WireMessage<'a>> {
    std::iter::once(WireMessage {
        role: Role::System,
        content: system,
    })
    .chain(
        conversation::model_context(conversation, window)
            .into_iter()
            .map(|m| WireMessage {
                role: m.role,
                content: &m.content,
            }),
    )
    .collect()
}

/// `choices[0].message.content`, or `None` when absent or empty.
fn extract_reply(body: &str) -> Result<Option<String>> {
    let resp: CompletionResponse =
        serde_json::from_str(body).map_err(|e| Error::parse(format!("completion JSON: {e}")))?;
    Ok(resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty()))
}

fn exhaustion_diagnostic(candidates: usize, last: Option<&DelegationAttempt>) -> String {
    let detail = last
        .and_then(|a| serde_json::to_string(a).ok())
        .unwrap_or_else(|| "null".into());
    truncate_chars(
        &format!("AI provider error. Tried {candidates} models. Last error: {detail}"),
        DIAGNOSTIC_LIMIT,
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_extracted_from_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        assert_eq!(extract_reply(body).unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn null_or_empty_content_is_no_reply() {
        assert!(extract_reply(r#"{"choices":[{"message":{"content":null}}]}"#)
            .unwrap()
            .is_none());
        assert!(extract_reply(r#"{"choices":[{"message":{"content":""}}]}"#)
            .unwrap()
            .is_none());
        assert!(extract_reply(r#"{"choices":[]}"#).unwrap().is_none());
        assert!(extract_reply("{}").unwrap().is_none());
    }

    #[test]
    fn whitespace_content_is_a_reply() {
        assert_eq!(
            extract_reply(r#"{"choices":[{"message":{"content":"  "}}]}"#)
                .unwrap()
                .as_deref(),
            Some("  ")
        );
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(extract_reply("<html>"), Err(Error::Parse(_))));
    }

    #[test]
    fn diagnostic_is_bounded_and_counts_candidates() {
        let attempt = DelegationAttempt {
            model_id: "m".into(),
            http_status: 500,
            raw_body: "x".repeat(2000),
            parse_error: None,
        };
        let text = exhaustion_diagnostic(5, Some(&attempt));
        assert!(text.chars().count() <= DIAGNOSTIC_LIMIT);
        assert!(text.contains("Tried 5 models"));
        assert!(text.ends_with('…'));
    }

    #[test]
    fn short_diagnostic_is_untouched() {
        let text = exhaustion_diagnostic(2, None);
        assert_eq!(text, "AI provider error. Tried 2 models. Last error: null");
    }

    #[test]
    fn attempt_serializes_camel_case() {
        let attempt = DelegationAttempt::new("m1", 404, "nope", Some("bad".into()));
        let json = serde_json::to_string(&attempt).unwrap();
        assert!(json.contains(r#""modelId":"m1""#));
        assert!(json.contains(r#""httpStatus":404"#));
        assert!(json.contains(r#""parseError":"bad""#));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(10);
        let cut = truncate_chars(&text, 4);
        assert_eq!(cut.chars().count(), 4);
        assert_eq!(cut, "ééé…");
    }

    #[test]
    fn system_message_comes_first() {
        let convo = vec![Message::user("hi there"), Message::assistant("Hi 👋 welcome")];
        let payload = outgoing_messages("SYS", &convo, 12);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].role, Role::System);
        assert_eq!(payload[0].content, "SYS");
        assert_eq!(payload[1].content, "hi there");
    }

    #[test]
    fn instruction_embeds_profile() {
        let profile = ProfileRecord::bundled().unwrap();
        let system = system_instruction(&profile).unwrap();
        assert!(system.contains("--- PROFILE JSON ---"));
        assert!(system.contains(&profile.contact.email));
        assert!(system.contains(&not_in_profile(&profile)));
    }
}
