// src/tests/utils.rs
use crate::aggregator::models::{AggregatorQuery, AggregatorSearchResponse};
use crate::db::connection::Database;
use crate::db::listings::{DbFilters, DbListingRecord, DEFAULT_DB_LIMIT};
use crate::errors::SourceError;
use crate::sources::{AggregatorClient, ListingStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Fresh on-disk database with the production schema. Keep the `TempDir`
/// alive for as long as the database is used.
pub fn init_test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
    let path = dir.path().join("listings.sqlite3");
    let db = Database::new(path.to_string_lossy().into_owned());
    db.init_schema()
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    (dir, db)
}

pub enum FakeBehavior {
    Listings(Vec<Value>),
    Fail(String),
    Panic,
}

/// Aggregator stand-in that returns canned records or a canned failure.
pub struct FakeAggregator {
    behavior: FakeBehavior,
    calls: AtomicUsize,
    last_query: Mutex<Option<AggregatorQuery>>,
}

impl FakeAggregator {
    pub fn returning(listings: Vec<Value>) -> Self {
        Self::with(FakeBehavior::Listings(listings))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(FakeBehavior::Fail(message.to_string()))
    }

    pub fn panicking() -> Self {
        Self::with(FakeBehavior::Panic)
    }

    fn with(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<AggregatorQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

impl AggregatorClient for FakeAggregator {
    fn search_listings(&self, query: &AggregatorQuery) -> Result<AggregatorSearchResponse, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        match &self.behavior {
            FakeBehavior::Listings(listings) => {
                let per_page = query.results_per_page.unwrap_or(listings.len()).max(1);
                let page_num = query.page_num.unwrap_or(1).max(1);
                Ok(AggregatorSearchResponse {
                    listings: listings
                        .iter()
                        .skip((page_num - 1) * per_page)
                        .take(per_page)
                        .cloned()
                        .collect(),
                    num_results: Some(listings.len() as u64),
                    num_pages: Some(listings.len().div_ceil(per_page).max(1) as u64),
                })
            }
            FakeBehavior::Fail(message) => Err(SourceError::Http {
                status: 503,
                body: message.clone(),
            }),
            FakeBehavior::Panic => panic!("aggregator fake blew up"),
        }
    }
}

/// In-memory [`ListingStore`]. Honours `limit` and `offset` in the order the
/// rows were given; ignores the other filters.
#[derive(Default)]
pub struct FakeStore {
    rows: Vec<DbListingRecord>,
    fail: Option<String>,
    calls: AtomicUsize,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<DbListingRecord>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail {
            Some(message) => Err(SourceError::Other(message.clone())),
            None => Ok(()),
        }
    }

    fn find<F>(&self, pred: F) -> Result<Option<DbListingRecord>, SourceError>
    where
        F: Fn(&DbListingRecord) -> bool,
    {
        self.check()?;
        Ok(self.rows.iter().find(|r| pred(r)).cloned())
    }
}

fn eq_nocase(a: &Option<String>, b: &str) -> bool {
    a.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(b.trim()))
}

impl ListingStore for FakeStore {
    fn search_properties(&self, filters: &DbFilters) -> Result<Vec<DbListingRecord>, SourceError> {
        self.check()?;
        Ok(self
            .rows
            .iter()
            .skip(filters.offset.unwrap_or(0))
            .take(filters.limit.unwrap_or(DEFAULT_DB_LIMIT))
            .cloned()
            .collect())
    }

    fn get_property_by_listing_id(&self, listing_id: &str) -> Result<Option<DbListingRecord>, SourceError> {
        self.find(|r| eq_nocase(&r.listing_id, listing_id))
    }

    fn get_property_by_mls_number(&self, mls_number: &str) -> Result<Option<DbListingRecord>, SourceError> {
        self.find(|r| eq_nocase(&r.mls_number, mls_number))
    }

    fn get_property_by_row_id(&self, row_id: i64) -> Result<Option<DbListingRecord>, SourceError> {
        self.find(|r| r.id == row_id)
    }

    fn count_by_sub_type(&self, _filters: &DbFilters) -> Result<Vec<(Option<String>, i64)>, SourceError> {
        self.check()?;
        let mut counts: Vec<(Option<String>, i64)> = Vec::new();
        for r in &self.rows {
            match counts.iter_mut().find(|(t, _)| *t == r.property_sub_type) {
                Some((_, n)) => *n += 1,
                None => counts.push((r.property_sub_type.clone(), 1)),
            }
        }
        Ok(counts)
    }
}

/// Aggregator record in the provider's nested shape.
pub fn aggregator_record(mls: &str, street_number: &str, street_name: &str, city: &str, price: i64) -> Value {
    json!({
        "mlsNumber": mls,
        "status": "A",
        "class": "ResidentialProperty",
        "listPrice": price,
        "address": {
            "streetNumber": street_number,
            "streetName": street_name,
            "city": city,
            "state": "TX",
            "zip": "78701"
        },
        "details": { "numBedrooms": 3, "numBathrooms": 2, "propertyType": "Single Family Residence" },
        "images": ["IMG-1.jpg"]
    })
}

/// Database row with an unparsed address only.
pub fn db_row(id: i64, listing_id: &str, unparsed: &str, price: i64, beds: i64) -> DbListingRecord {
    DbListingRecord {
        id,
        listing_id: Some(listing_id.to_string()),
        standard_status: Some("Active".to_string()),
        list_price: Some(price),
        unparsed_address: Some(unparsed.to_string()),
        bedrooms_total: Some(beds),
        property_sub_type: Some("Single Family Residence".to_string()),
        ..Default::default()
    }
}
