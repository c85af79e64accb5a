//! Utility functions and helpers.

pub mod http;
pub mod url;

pub use http::{Fetcher, HttpFetcher};
