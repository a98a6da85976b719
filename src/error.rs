use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CinError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing failed: {0}")]
    XmlRead(#[from] xml::reader::Error),

    #[error("XML writing failed: {0}")]
    XmlWrite(#[from] xml::writer::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required element <{element}> in {context}")]
    MissingElement { element: String, context: String },

    #[error("No root element found in {}", .0.display())]
    NoRootElement(PathBuf),
}

pub type Result<T> = std::result::Result<T, CinError>;
