//! Model identity and respondent value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a model as known to the model registry (Value Object)
///
/// This is an opaque key chosen by the user (e.g. `gpt`, `local-llama`),
/// not the provider-side model name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A model participating in a turn, resolved from the registry.
///
/// Immutable for the duration of a turn.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
    pub model_id: ModelId,
    pub base_url: String,
    pub model_name: String,
    pub api_key: String,
    pub display_name: String,
}

impl Respondent {
    pub fn new(
        model_id: impl Into<ModelId>,
        base_url: impl Into<String>,
        model_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let model_name = model_name.into();
        Self {
            model_id: model_id.into(),
            base_url: base_url.into(),
            display_name: model_name.clone(),
            model_name,
            api_key: api_key.into(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

// The api key must never end up in logs.
impl fmt::Debug for Respondent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Respondent")
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("api_key", &"***")
            .field("display_name", &self.display_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_display() {
        let id = ModelId::new("gpt");
        assert_eq!(id.to_string(), "gpt");
        assert_eq!(id.as_str(), "gpt");
    }

    #[test]
    fn test_model_id_serde_transparent() {
        let id = ModelId::new("local");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"local\"");
    }

    #[test]
    fn test_respondent_display_name_defaults_to_model_name() {
        let r = Respondent::new("gpt", "https://api.example.com/v1", "gpt-4o", "key");
        assert_eq!(r.display_name, "gpt-4o");
        let r = r.with_display_name("GPT-4o");
        assert_eq!(r.display_name, "GPT-4o");
    }

    #[test]
    fn test_respondent_debug_hides_api_key() {
        let r = Respondent::new("gpt", "url", "gpt-4o", "secret-key");
        let debug = format!("{:?}", r);
        assert!(!debug.contains("secret-key"));
    }
}
