//! YAML phase script loader
//!
//! ```yaml
//! name: review
//! description: Draft, critique, merge
//! global_prompt: Be concise.
//! phases:
//!   - name: draft
//!     models: all
//!     context: user_only
//!   - name: critique
//!     models: "2,3"
//!     context: phase_previous
//!     roles:
//!       2: Find factual errors.
//!   - name: merge
//!     models: first
//!     temperature: 0.2
//! ```

use chorus_domain::DslConversation;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors from loading a phase script
#[derive(Error, Debug)]
pub enum DslLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid phase script:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// Reads and validates phase scripts
pub struct DslLoader;

impl DslLoader {
    pub fn load(path: &Path) -> Result<DslConversation, DslLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| DslLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<DslConversation, DslLoadError> {
        let script: DslConversation = serde_yaml::from_str(text)?;
        let issues = Self::validate(&script);
        if issues.is_empty() {
            Ok(script)
        } else {
            Err(DslLoadError::Invalid(issues))
        }
    }

    /// Every structural problem in `script`, in document order
    pub fn validate(script: &DslConversation) -> Vec<String> {
        let mut issues = Vec::new();

        if script.name.trim().is_empty() {
            issues.push("name cannot be empty".to_string());
        }
        if script.phases.is_empty() {
            issues.push("at least one phase is required".to_string());
        }
        if script.global_roles.contains_key(&0) {
            issues.push("global_roles: positions start at 1".to_string());
        }

        let mut seen = HashSet::new();
        for (i, phase) in script.phases.iter().enumerate() {
            let label = if phase.name.trim().is_empty() {
                issues.push(format!("phases[{}]: name cannot be empty", i));
                format!("phases[{}]", i)
            } else {
                if !seen.insert(phase.name.as_str()) {
                    issues.push(format!("phases[{}]: duplicate name '{}'", i, phase.name));
                }
                format!("phase '{}'", phase.name)
            };

            if !phase.models.is_recognized() {
                issues.push(format!("{}: unrecognized models '{}'", label, phase.models));
            }
            if let Some(t) = phase.temperature
                && !(0.0..=2.0).contains(&t)
            {
                issues.push(format!("{}: temperature {} is outside 0.0..=2.0", label, t));
            }
            if phase.roles.contains_key(&0) {
                issues.push(format!("{}: role positions start at 1", label));
            }
        }

        issues
    }
}
