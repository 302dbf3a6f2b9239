#![allow(dead_code)]

use folio_chat::config::LlmConfig;
use folio_chat::llm::ModelDelegator;
use folio_chat::profile::ProfileRecord;
use folio_chat::router::Router;
use std::sync::Arc;

pub const MODELS: [&str; 5] = ["m-one", "m-two", "m-three", "m-four", "m-five"];

pub fn llm_config(base_url: &str, models: &[&str]) -> LlmConfig {
    LlmConfig {
        base_url: base_url.into(),
        models: models.iter().map(|m| m.to_string()).collect(),
        timeout_secs: 5,
        ..LlmConfig::default()
    }
}

pub fn delegator(base_url: &str, models: &[&str]) -> ModelDelegator {
    ModelDelegator::from_config(&llm_config(base_url, models)).unwrap()
}

pub fn profile() -> ProfileRecord {
    ProfileRecord::bundled().unwrap()
}

pub fn router(base_url: &str, models: &[&str], credential: Option<&str>) -> Router {
    Router::new(
        Arc::new(profile()),
        credential.map(String::from),
        delegator(base_url, models),
    )
}

pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}
