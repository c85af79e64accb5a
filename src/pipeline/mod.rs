//! Pipeline entry points.
//!
//! - `Ingestor`: discover jurisdictions and stream their results
//! - `run_results` / `run_jurisdictions`: write them out as CSV or JSON

pub mod export;
pub mod ingest;

pub use export::{ColumnPlan, ExportSummary, run_jurisdictions, run_results};
pub use ingest::{Ingestor, ResultStream};
