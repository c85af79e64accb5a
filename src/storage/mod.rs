//! Report archive storage.
//!
//! - `cache`: on-disk archive cache keyed by source URL
//! - `archive`: extraction of the report document from a downloaded zip

pub mod archive;
pub mod cache;

pub use archive::{extract_document, extract_entry};
pub use cache::ArchiveCache;
