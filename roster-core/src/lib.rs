//! Roster Core - shared domain types, store traits and process-wide setup
//!
//! This crate defines the records and contracts the web service is built on,
//! together with configuration loading and logging initialisation.

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
