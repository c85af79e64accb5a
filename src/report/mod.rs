//! Clarity report decoding.
//!
//! - `schema`: tells the two report layouts apart
//! - `rows`: leaf counts for each layout
//! - `decoder`: the streaming state machine over a whole document

mod decoder;
mod rows;
mod schema;

pub use decoder::ReportDecoder;
pub use schema::Schema;

/// Name of the report entry inside a detail archive.
pub const DETAIL_ENTRY: &str = "detail.xml";
