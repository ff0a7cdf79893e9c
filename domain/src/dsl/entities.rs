//! Phase script entities.
//!
//! A [`DslConversation`] arrives already validated; the engine never
//! re-checks its structure.

use crate::dsl::selector::{ContextRule, ModelSelector};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::HashMap;

fn default_wait() -> bool {
    true
}

/// Role map keyed by 1-based position. Keys may be numbers or numeric
/// strings (`2: Skeptic` and `"2": Skeptic` are the same entry).
fn position_map<'de, D>(deserializer: D) -> Result<HashMap<usize, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize, PartialEq, Eq, Hash)]
    #[serde(untagged)]
    enum PositionKey {
        Number(usize),
        Text(String),
    }

    HashMap::<PositionKey, String>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, role)| {
            let position = match key {
                PositionKey::Number(position) => position,
                PositionKey::Text(text) => text.trim().parse().map_err(|_| {
                    de::Error::custom(format!("role position '{text}' is not a number"))
                })?,
            };
            Ok((position, role))
        })
        .collect()
}

/// One step of a phase script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DslPhase {
    pub name: String,
    /// Which candidates respond
    #[serde(default, alias = "model")]
    pub models: ModelSelector,
    /// What the respondents see
    #[serde(default)]
    pub context: ContextRule,
    /// Replaces the user's text for this phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Role per 1-based candidate position
    #[serde(
        default,
        alias = "role",
        deserialize_with = "position_map",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub roles: HashMap<usize, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default = "default_wait")]
    pub wait_for_completion: bool,
}

impl DslPhase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            models: ModelSelector::All,
            context: ContextRule::AllPrevious,
            prompt: None,
            roles: HashMap::new(),
            temperature: None,
            wait_for_completion: true,
        }
    }

    pub fn with_models(mut self, models: impl Into<ModelSelector>) -> Self {
        self.models = models.into();
        self
    }

    pub fn with_context(mut self, context: ContextRule) -> Self {
        self.context = context;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_role(mut self, position: usize, role: impl Into<String>) -> Self {
        self.roles.insert(position, role.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn without_wait(mut self) -> Self {
        self.wait_for_completion = false;
        self
    }
}

/// A phase script: ordered phases plus optional global prompt and roles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DslConversation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub phases: Vec<DslPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_prompt: Option<String>,
    /// Role per 1-based candidate position, used when a phase has none
    #[serde(
        default,
        alias = "global_role",
        deserialize_with = "position_map",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub global_roles: HashMap<usize, String>,
}

impl DslConversation {
    pub fn new(name: impl Into<String>, phases: Vec<DslPhase>) -> Self {
        Self {
            name: name.into(),
            description: None,
            phases,
            global_prompt: None,
            global_roles: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_global_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.global_prompt = Some(prompt.into());
        self
    }

    pub fn with_global_role(mut self, position: usize, role: impl Into<String>) -> Self {
        self.global_roles.insert(position, role.into());
        self
    }

    /// Role of the candidate at 0-based `index` during `phase`.
    ///
    /// The phase's own role map wins over the global one.
    pub fn role_for<'a>(&'a self, phase: &'a DslPhase, index: usize) -> Option<&'a str> {
        let position = index + 1;
        phase
            .roles
            .get(&position)
            .or_else(|| self.global_roles.get(&position))
            .map(String::as_str)
    }
}
