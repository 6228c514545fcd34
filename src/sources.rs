//! Collaborator contracts. The listing service only sees these traits, so
//! the HTTP client and SQLite store can be swapped for fakes in tests.

use crate::aggregator::models::{AggregatorQuery, AggregatorSearchResponse};
use crate::db::listings::{DbFilters, DbListingRecord};
use crate::errors::SourceError;

/// Live MLS aggregator. Returns provider-native listings.
pub trait AggregatorClient: Send + Sync {
    fn search_listings(&self, query: &AggregatorQuery)
        -> Result<AggregatorSearchResponse, SourceError>;
}

/// Local database of historical and closed listings.
pub trait ListingStore: Send + Sync {
    fn search_properties(&self, filters: &DbFilters) -> Result<Vec<DbListingRecord>, SourceError>;

    fn get_property_by_listing_id(&self, listing_id: &str)
        -> Result<Option<DbListingRecord>, SourceError>;

    fn get_property_by_mls_number(&self, mls_number: &str)
        -> Result<Option<DbListingRecord>, SourceError>;

    /// Row with no listing id, addressed by its table row id.
    fn get_property_by_row_id(&self, row_id: i64) -> Result<Option<DbListingRecord>, SourceError>;

    /// Raw sub-type strings with their row counts, for inventory tallies.
    fn count_by_sub_type(&self, filters: &DbFilters)
        -> Result<Vec<(Option<String>, i64)>, SourceError>;
}
