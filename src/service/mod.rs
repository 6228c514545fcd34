pub mod cache;
pub mod listing_service;
pub mod params;
pub mod report;

pub use cache::TtlCache;
pub use listing_service::CanonicalListingService;
pub use params::SearchParams;
pub use report::{DedupeReport, DedupeStats, FetchResult};
