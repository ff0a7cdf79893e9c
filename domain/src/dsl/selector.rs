//! Phase selectors: which models answer, and what they see.

use crate::conversation::entities::{Message, MessageId};
use crate::core::model::ModelId;
use crate::dsl::execution::ExecutionContext;
use crate::orchestration::policy::{DisplayNames, attribute};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Respondent selector of a phase.
///
/// Written in scripts as `all`, `first`, `last`, `random`, or a comma
/// separated list of 1-based candidate positions such as `1,3`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelSelector {
    #[default]
    All,
    First,
    Last,
    Random,
    /// 1-based candidate positions
    Indices(Vec<usize>),
    /// Anything else; resolves like `All`
    Unrecognized(String),
}

impl ModelSelector {
    pub fn parse(spec: &str) -> Self {
        let normalized = spec.trim().to_lowercase();
        match normalized.as_str() {
            "all" => return ModelSelector::All,
            "first" => return ModelSelector::First,
            "last" => return ModelSelector::Last,
            "random" => return ModelSelector::Random,
            _ => {}
        }

        let indices: Result<Vec<usize>, _> = normalized
            .split(',')
            .map(|part| part.trim().parse::<usize>())
            .collect();
        match indices {
            Ok(indices) if !indices.is_empty() => ModelSelector::Indices(indices),
            _ => ModelSelector::Unrecognized(spec.to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ModelSelector::Unrecognized(_))
    }

    /// Resolve against the turn's candidates, preserving candidate order for
    /// `all` and list order for explicit positions. Out-of-range positions
    /// are dropped.
    pub fn resolve<R: Rng>(&self, candidates: &[ModelId], rng: &mut R) -> Vec<ModelId> {
        match self {
            ModelSelector::All | ModelSelector::Unrecognized(_) => candidates.to_vec(),
            ModelSelector::First => candidates.first().cloned().into_iter().collect(),
            ModelSelector::Last => candidates.last().cloned().into_iter().collect(),
            ModelSelector::Random => {
                if candidates.is_empty() {
                    Vec::new()
                } else {
                    vec![candidates[rng.gen_range(0..candidates.len())].clone()]
                }
            }
            ModelSelector::Indices(indices) => {
                let mut resolved: Vec<ModelId> = Vec::new();
                for position in indices {
                    let Some(model) = position
                        .checked_sub(1)
                        .and_then(|i| candidates.get(i))
                    else {
                        continue;
                    };
                    if !resolved.contains(model) {
                        resolved.push(model.clone());
                    }
                }
                resolved
            }
        }
    }
}

impl From<String> for ModelSelector {
    fn from(s: String) -> Self {
        ModelSelector::parse(&s)
    }
}

impl From<&str> for ModelSelector {
    fn from(s: &str) -> Self {
        ModelSelector::parse(s)
    }
}

impl From<ModelSelector> for String {
    fn from(selector: ModelSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelector::All => f.write_str("all"),
            ModelSelector::First => f.write_str("first"),
            ModelSelector::Last => f.write_str("last"),
            ModelSelector::Random => f.write_str("random"),
            ModelSelector::Indices(indices) => {
                let parts: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                f.write_str(&parts.join(","))
            }
            ModelSelector::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// Context visibility rule of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextRule {
    /// Only user-sent messages
    UserOnly,
    /// User messages plus replies from every earlier phase of this turn
    #[default]
    AllPrevious,
    /// User messages plus replies from the immediately preceding phase
    PhasePrevious,
}

impl ContextRule {
    /// Messages visible under this rule; replies are attributed.
    pub fn filter(
        &self,
        messages: &[Message],
        context: &ExecutionContext,
        exclude: Option<&MessageId>,
        names: &DisplayNames,
    ) -> Vec<Message> {
        let allowed: Vec<&MessageId> = match self {
            ContextRule::UserOnly => Vec::new(),
            ContextRule::AllPrevious => context.all_phase_messages().collect(),
            ContextRule::PhasePrevious => context
                .previous_phase_messages()
                .map(|ids| ids.iter().collect())
                .unwrap_or_default(),
        };

        messages
            .iter()
            .filter(|m| exclude != Some(&m.id))
            .filter(|m| m.is_user() || (!m.content.is_empty() && allowed.contains(&&m.id)))
            .map(|m| attribute(m, names))
            .collect()
    }
}

impl fmt::Display for ContextRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextRule::UserOnly => f.write_str("user_only"),
            ContextRule::AllPrevious => f.write_str("all_previous"),
            ContextRule::PhasePrevious => f.write_str("phase_previous"),
        }
    }
}
