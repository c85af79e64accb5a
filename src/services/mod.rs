//! Service layer for jurisdiction discovery.
//!
//! - Listing scrape and tree construction (`SubjurisdictionCrawler`)
//! - County landing-page redirects (`RedirectStrategy`)

pub mod redirect;
pub mod subjurisdictions;

pub use redirect::{RedirectStrategy, resolve_segment};
pub use subjurisdictions::{ListingEntry, SubjurisdictionCrawler, scrape_listing};
