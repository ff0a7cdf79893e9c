//! Model registry built from `[[models]]` config entries

use crate::config::FileModelConfig;
use chorus_application::ModelRegistry;
use chorus_domain::{ModelId, Respondent};
use tracing::warn;

/// [`ModelRegistry`] over a fixed list of respondents, in config order.
///
/// API keys are resolved once, when the registry is built.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredModelRegistry {
    respondents: Vec<Respondent>,
}

impl ConfiguredModelRegistry {
    pub fn new(respondents: Vec<Respondent>) -> Self {
        Self { respondents }
    }

    /// Build from config, reading `api_key_env` variables from the process
    /// environment.
    pub fn from_config(models: &[FileModelConfig]) -> Self {
        Self::from_config_with(models, |name| std::env::var(name).ok())
    }

    /// Build from config with a custom environment lookup
    pub fn from_config_with<F>(models: &[FileModelConfig], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let respondents = models
            .iter()
            .map(|model| {
                let api_key = resolve_api_key(model, &lookup);
                let respondent = Respondent::new(
                    model.id.as_str(),
                    model.base_url.as_str(),
                    model.model_name(),
                    api_key,
                );
                match &model.display_name {
                    Some(name) => respondent.with_display_name(name.as_str()),
                    None => respondent,
                }
            })
            .collect();
        Self { respondents }
    }

    pub fn is_empty(&self) -> bool {
        self.respondents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.respondents.len()
    }
}

fn resolve_api_key<F>(model: &FileModelConfig, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = &model.api_key {
        return key.clone();
    }
    let Some(var) = &model.api_key_env else {
        return String::new();
    };
    lookup(var).unwrap_or_else(|| {
        warn!(
            "Environment variable {} for model '{}' is not set; sending requests without a key",
            var, model.id
        );
        String::new()
    })
}

impl ModelRegistry for ConfiguredModelRegistry {
    fn resolve(&self, id: &ModelId) -> Option<Respondent> {
        self.respondents.iter().find(|r| &r.model_id == id).cloned()
    }

    fn model_ids(&self) -> Vec<ModelId> {
        self.respondents.iter().map(|r| r.model_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str) -> FileModelConfig {
        FileModelConfig {
            id: id.to_string(),
            base_url: "http://localhost:8080/v1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolves_in_config_order() {
        let registry =
            ConfiguredModelRegistry::from_config_with(&[model("a"), model("b")], |_| None);

        assert_eq!(
            registry.model_ids(),
            vec![ModelId::new("a"), ModelId::new("b")]
        );
        assert!(registry.resolve(&ModelId::new("missing")).is_none());
    }

    #[test]
    fn test_model_name_and_display_name_fallbacks() {
        let mut named = model("gpt");
        named.model_name = Some("gpt-4o".to_string());
        named.display_name = Some("GPT-4o".to_string());
        let registry =
            ConfiguredModelRegistry::from_config_with(&[named, model("local")], |_| None);

        let gpt = registry.resolve(&ModelId::new("gpt")).unwrap();
        assert_eq!(gpt.model_name, "gpt-4o");
        assert_eq!(gpt.display_name, "GPT-4o");

        let local = registry.resolve(&ModelId::new("local")).unwrap();
        assert_eq!(local.model_name, "local");
        assert_eq!(local.display_name, "local");

        let names = registry.display_names();
        assert_eq!(names.name_for(&ModelId::new("gpt")), "GPT-4o");
    }

    #[test]
    fn test_api_key_sources() {
        let mut inline = model("inline");
        inline.api_key = Some("sk-inline".to_string());
        inline.api_key_env = Some("IGNORED".to_string());
        let mut env = model("env");
        env.api_key_env = Some("TEST_KEY".to_string());
        let mut unset = model("unset");
        unset.api_key_env = Some("NOT_SET".to_string());

        let registry = ConfiguredModelRegistry::from_config_with(
            &[inline, env, unset, model("none")],
            |name| (name == "TEST_KEY").then(|| "sk-env".to_string()),
        );

        let key = |id: &str| registry.resolve(&ModelId::new(id)).unwrap().api_key;
        assert_eq!(key("inline"), "sk-inline");
        assert_eq!(key("env"), "sk-env");
        assert_eq!(key("unset"), "");
        assert_eq!(key("none"), "");
    }
}
