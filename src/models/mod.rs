// src/models/mod.rs

//! Domain models.
//!
//! Jurisdictions and the tree they form, the records decoded from their
//! reports, and application configuration.

mod config;
mod jurisdiction;
mod result;
mod tree;

// Re-export all public types
pub use config::{CacheConfig, Config, HttpConfig, OutputConfig, OutputFormat};
pub use jurisdiction::{Jurisdiction, Level, LevelName, ReportFormat, infer_levels};
pub use result::{ElectionInfo, ReportingUnit, ResultRecord, Turnout, VoteType};
pub use tree::{JurisdictionId, JurisdictionTree};
