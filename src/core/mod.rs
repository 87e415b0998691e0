//! Core domain types and shared infrastructure.
//!
//! This module contains the identifier types, error taxonomy, configuration
//! handling and diagnostics counters used by every other part of the engine.

#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{init_logging, Config, ConfigBuilder, EngineConfig, LoggingConfig};
pub use diagnostics::{DiagnosticsSnapshot, EvalDiagnostics};
pub use error::{Result, StatError};
pub use types::{Alias, Discriminator, RequesterId, StatKind, StatisticId, SubjectId};
