//! Summary generator adapters

mod transcript;

pub use transcript::TranscriptSummaryGenerator;
