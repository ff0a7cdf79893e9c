//! Prompt construction: templates and role tables

pub mod roles;
pub mod template;

pub use template::PromptTemplate;
