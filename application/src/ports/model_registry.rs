//! Model registry port

use chorus_domain::{DisplayNames, ModelId, Respondent};

/// Resolves model ids to connection details.
pub trait ModelRegistry: Send + Sync {
    /// `None` for an unknown id.
    fn resolve(&self, id: &ModelId) -> Option<Respondent>;

    /// All registered ids, in registration order
    fn model_ids(&self) -> Vec<ModelId>;

    /// Display names for attribution tags
    fn display_names(&self) -> DisplayNames {
        self.model_ids()
            .into_iter()
            .filter_map(|id| self.resolve(&id).map(|r| (id, r.display_name)))
            .collect()
    }
}
