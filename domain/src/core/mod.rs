//! Core domain concepts
//!
//! - [`model::ModelId`] / [`model::Respondent`] - model identity
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod model;
