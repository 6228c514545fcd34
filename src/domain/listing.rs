// src/domain/listing.rs

use crate::domain::property_type::PropertyType;
use crate::domain::status::CanonicalStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Placeholder used when a provider record carries no usable street address.
pub const UNKNOWN_ADDRESS: &str = "Address Unknown";

/// An upstream system supplying listing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    /// Live MLS aggregator API.
    Aggregator,
    /// Local database of historical and closed listings.
    Database,
}

/// Merge priority, highest first. Every place that needs to pick a winning
/// source reads this list; nothing relies on map or vector ordering.
pub const SOURCE_PRIORITY: &[ListingSource] = &[ListingSource::Aggregator, ListingSource::Database];

impl ListingSource {
    /// Position in [`SOURCE_PRIORITY`]; lower wins.
    pub fn priority(self) -> usize {
        SOURCE_PRIORITY
            .iter()
            .position(|s| *s == self)
            .unwrap_or(SOURCE_PRIORITY.len())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListingSource::Aggregator => "aggregator",
            ListingSource::Database => "database",
        }
    }

    /// Human label used for `data_source`.
    pub fn label(self) -> &'static str {
        match self {
            ListingSource::Aggregator => "MLS Aggregator",
            ListingSource::Database => "Listing Database",
        }
    }

    /// Highest-priority member of `sources`, if any.
    pub fn highest_priority<'a>(
        sources: impl IntoIterator<Item = &'a ListingSource>,
    ) -> Option<ListingSource> {
        sources.into_iter().copied().min_by_key(|s| s.priority())
    }
}

impl fmt::Display for ListingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalAddress {
    pub line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Lower-cased, delimiter-joined key. Primary dedup signal.
    pub normalized_key: String,
}

/// The unified, source-agnostic representation of one property listing.
///
/// Built fresh on every fetch. The only way a listing changes after
/// construction is [`crate::dedupe::merge_listings`], which returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalListing {
    // === Identity ===
    pub id: String,
    pub source_ids: BTreeMap<ListingSource, String>,
    pub sources: BTreeSet<ListingSource>,
    pub primary_source: ListingSource,

    pub standard_status: CanonicalStatus,

    // === Pricing (whole dollars) ===
    pub list_price: Option<i64>,
    pub close_price: Option<i64>,
    pub original_price: Option<i64>,

    pub address: CanonicalAddress,

    // === Physical attributes ===
    pub beds: Option<u32>,
    pub baths: Option<f64>,
    pub living_area_sqft: Option<f64>,
    pub lot_size_sqft: Option<f64>,
    pub lot_size_acres: Option<f64>,
    pub year_built: Option<i32>,
    /// Provider's broad class, e.g. "Residential".
    pub property_type: Option<String>,
    pub property_sub_type: Option<PropertyType>,
    pub garage_spaces: Option<f64>,
    pub pool_features: Option<String>,

    // === Location context ===
    pub subdivision: Option<String>,
    pub neighborhood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elementary_school: Option<String>,
    pub middle_school: Option<String>,
    pub high_school: Option<String>,

    // === Market timing ===
    pub mls_number: Option<String>,
    pub listing_id: Option<String>,
    pub list_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub days_on_market: Option<i64>,

    pub photos: Vec<String>,

    // === Provenance ===
    pub last_updated: Option<DateTime<Utc>>,
    pub data_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<BTreeMap<ListingSource, Value>>,
}

impl CanonicalListing {
    /// An empty listing attributed to a single source. Mappers start here and
    /// fill in whatever their provider record carries.
    pub fn new(id: String, source: ListingSource, source_id: Option<String>) -> Self {
        let mut source_ids = BTreeMap::new();
        if let Some(sid) = source_id {
            source_ids.insert(source, sid);
        }

        Self {
            id,
            source_ids,
            sources: BTreeSet::from([source]),
            primary_source: source,
            standard_status: CanonicalStatus::Active,
            list_price: None,
            close_price: None,
            original_price: None,
            address: CanonicalAddress::default(),
            beds: None,
            baths: None,
            living_area_sqft: None,
            lot_size_sqft: None,
            lot_size_acres: None,
            year_built: None,
            property_type: None,
            property_sub_type: None,
            garage_spaces: None,
            pool_features: None,
            subdivision: None,
            neighborhood: None,
            latitude: None,
            longitude: None,
            elementary_school: None,
            middle_school: None,
            high_school: None,
            mls_number: None,
            listing_id: None,
            list_date: None,
            close_date: None,
            days_on_market: None,
            photos: Vec::new(),
            last_updated: None,
            data_source: source.label().to_string(),
            raw: None,
        }
    }

    /// Trimmed, lower-cased MLS number, or `None` when absent or blank.
    pub fn mls_key(&self) -> Option<String> {
        self.mls_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Price used for similarity: list price, else close price.
    pub fn comparable_price(&self) -> Option<i64> {
        self.list_price.or(self.close_price)
    }
}

/// Label for a set of contributing sources, in priority order.
pub fn data_source_label(sources: &BTreeSet<ListingSource>) -> String {
    SOURCE_PRIORITY
        .iter()
        .filter(|s| sources.contains(s))
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregator_outranks_database() {
        assert!(ListingSource::Aggregator.priority() < ListingSource::Database.priority());
        let both = [ListingSource::Database, ListingSource::Aggregator];
        assert_eq!(
            ListingSource::highest_priority(both.iter()),
            Some(ListingSource::Aggregator)
        );
    }

    #[test]
    fn mls_key_ignores_case_and_blank() {
        let mut l = CanonicalListing::new("x".into(), ListingSource::Database, None);
        assert_eq!(l.mls_key(), None);
        l.mls_number = Some("   ".into());
        assert_eq!(l.mls_key(), None);
        l.mls_number = Some(" 123ABC ".into());
        assert_eq!(l.mls_key().as_deref(), Some("123abc"));
    }

    #[test]
    fn serializes_camel_case_and_source_keys() {
        let l = CanonicalListing::new("mls-1".into(), ListingSource::Aggregator, Some("1".into()));
        let v = serde_json::to_value(&l).unwrap();
        assert_eq!(v["primarySource"], "aggregator");
        assert_eq!(v["sourceIds"]["aggregator"], "1");
        assert_eq!(v["standardStatus"], "Active");
        assert!(v.get("raw").is_none());
    }

    #[test]
    fn label_follows_priority_order() {
        let sources = BTreeSet::from([ListingSource::Database, ListingSource::Aggregator]);
        assert_eq!(data_source_label(&sources), "MLS Aggregator + Listing Database");
    }
}
