// Static profile record: loaded once, shared read-only by every request.

mod responder;

pub use responder::{greeting, respond};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persona the widget speaks as. Shared by the local greeting and the
/// hosted-model system instruction.
pub const ASSISTANT_NAME: &str = "Li Wang Zhang Liu Yang Zhao Huang Wu";

const BUNDLED_PROFILE: &str = include_str!("../../data/profile.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
    pub goals: Vec<String>,
    pub hobbies: Vec<String>,
    pub contact: Contact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub github: String,
    pub linkedin: String,
}

impl ProfileRecord {
    /// The profile compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_PROFILE)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read profile {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Use `path` when given, the bundled profile otherwise.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::bundled(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::parse(format!("profile JSON: {e}")))
    }

    /// Pretty JSON, in field declaration order. Embedded verbatim in the
    /// hosted-model system instruction.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::parse(format!("serialize profile: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_profile_parses() {
        let profile = ProfileRecord::bundled().unwrap();
        assert_eq!(profile.name, "Muhammad Bakhat Nasar");
        assert!(profile.skills.len() >= 3);
        assert!(!profile.projects.is_empty());
        assert!(profile.contact.email.contains('@'));
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = ProfileRecord::from_json(r#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = ProfileRecord::load(Path::new("nope/profile.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn pretty_json_keeps_field_order() {
        let profile = ProfileRecord::bundled().unwrap();
        let json = profile.to_pretty_json().unwrap();
        let name_at = json.find("\"name\"").unwrap();
        let contact_at = json.find("\"contact\"").unwrap();
        assert!(name_at < contact_at);
        assert!(json.contains('\n'));
    }
}
