// CIN Census pipeline: parse, degrade, clean and flatten

pub mod pipeline;
pub mod processing;

pub use pipeline::{FileReport, Pipeline, PipelineOutput, PipelineResult};
pub use processing::parser;
