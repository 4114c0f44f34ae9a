//! Tenderd core library
//!
//! Domain models, patch/merge types, error taxonomy, and configuration shared
//! across all tenderd components.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::AppError;
