//! Listing aggregation: pulls property listings from the MLS aggregator API
//! and the local listings database, maps both onto one canonical model, and
//! merges records that describe the same property.

pub mod aggregator;
pub mod config;
pub mod db;
pub mod dedupe;
pub mod domain;
pub mod errors;
pub mod inventory;
pub mod mappers;
pub mod service;
pub mod sources;

pub use config::{DedupeSettings, ServiceConfig};
pub use domain::{CanonicalListing, CanonicalStatus, ListingSource, PropertyType};
pub use errors::{ConfigError, SourceError};
pub use service::{CanonicalListingService, DedupeReport, FetchResult, SearchParams};

#[cfg(test)]
mod tests;
