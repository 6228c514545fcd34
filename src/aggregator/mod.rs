pub mod client;
pub mod lenient;
pub mod models;

pub use client::HttpAggregatorClient;
pub use models::{AggregatorListing, AggregatorQuery, AggregatorSearchResponse};
