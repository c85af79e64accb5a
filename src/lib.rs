// src/lib.rs

//! Clarity election results library
//!
//! Discovers the jurisdictions of a Clarity election-night reporting site
//! and decodes their detail reports into result records.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod services;
pub mod storage;
pub mod utils;
