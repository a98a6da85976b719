pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

// Record tree shared by every stage
pub mod domain;

pub use config::AppConfig;
pub use error::{CinError, Result};
