use crate::aggregator::models::AggregatorQuery;
use crate::db::listings::{DbFilters, DEFAULT_DB_LIMIT};
use crate::domain::listing::{CanonicalListing, ListingSource};
use crate::domain::property_type::PropertyType;
use crate::domain::status::CanonicalStatus;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Page size when the caller does not give one.
pub const DEFAULT_LIMIT: usize = DEFAULT_DB_LIMIT;

/// Accepts `"Closed"` as well as `["Closed", "Pending"]`.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(v)) => vec![v],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// Search request accepted by the listing service. Empty lists mean "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub subdivision: Option<String>,
    pub neighborhood: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub status: Vec<CanonicalStatus>,
    #[serde(deserialize_with = "one_or_many")]
    pub property_type: Vec<PropertyType>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_beds: Option<u32>,
    pub max_beds: Option<u32>,
    pub min_baths: Option<f64>,
    pub max_baths: Option<f64>,
    pub min_sqft: Option<u32>,
    pub max_sqft: Option<u32>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub include_raw: bool,
    /// Sources to query. Empty queries all of them.
    #[serde(deserialize_with = "one_or_many")]
    pub sources: Vec<ListingSource>,
}

fn trimmed(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl SearchParams {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn wants(&self, source: ListingSource) -> bool {
        self.sources.is_empty() || self.sources.contains(&source)
    }

    /// Location and numeric bounds for SQL. Paging is left to the caller,
    /// which reads the source page by page.
    pub fn to_db_filters(&self) -> DbFilters {
        DbFilters {
            city: trimmed(&self.city),
            postal_code: trimmed(&self.postal_code),
            subdivision: trimmed(&self.subdivision),
            neighborhood: trimmed(&self.neighborhood),
            min_price: self.min_price,
            max_price: self.max_price,
            min_beds: self.min_beds,
            max_beds: self.max_beds,
            min_baths: self.min_baths,
            max_baths: self.max_baths,
            min_sqft: self.min_sqft,
            max_sqft: self.max_sqft,
            limit: None,
            offset: None,
        }
    }

    /// Aggregator status codes: `A` is on the market, `U` is off it, and
    /// `lastStatus=Sld` narrows off-market to sold. A mix of closed and open
    /// statuses is not expressible, so no status is sent and the canonical
    /// filter does the work. Property types are never sent: the provider's
    /// type vocabulary is not ours, so they are filtered after mapping.
    pub fn to_aggregator_query(&self) -> AggregatorQuery {
        let closed = self.status.iter().filter(|s| **s == CanonicalStatus::Closed).count();
        let (status, last_status) = match (closed, self.status.len()) {
            (_, 0) => (None, None),
            (c, n) if c == n => (Some("U".to_string()), Some("Sld".to_string())),
            (0, _) => (Some("A".to_string()), None),
            _ => (None, None),
        };

        AggregatorQuery {
            status,
            last_status,
            city: trimmed(&self.city),
            zip: trimmed(&self.postal_code),
            neighborhood: trimmed(&self.neighborhood),
            min_price: self.min_price,
            max_price: self.max_price,
            min_beds: self.min_beds,
            max_beds: self.max_beds,
            min_baths: self.min_baths,
            max_baths: self.max_baths,
            min_sqft: self.min_sqft,
            max_sqft: self.max_sqft,
            results_per_page: None,
            page_num: None,
        }
    }

    /// Canonical filters applied after mapping, identically for every source.
    pub fn matches(&self, listing: &CanonicalListing) -> bool {
        if !self.status.is_empty() && !self.status.contains(&listing.standard_status) {
            return false;
        }
        if !self.property_type.is_empty() {
            let bucket = listing.property_sub_type.unwrap_or(PropertyType::Other);
            if !self.property_type.contains(&bucket) {
                return false;
            }
        }
        true
    }

    /// Request signature for the cache. Parameters that differ only in list
    /// order, duplicates, or surrounding whitespace hash the same.
    pub fn cache_key(&self) -> String {
        let mut canonical = self.clone();
        canonical.status.sort();
        canonical.status.dedup();
        canonical.property_type.sort();
        canonical.property_type.dedup();
        canonical.sources.sort();
        canonical.sources.dedup();
        canonical.city = trimmed(&self.city).map(|c| c.to_lowercase());
        canonical.postal_code = trimmed(&self.postal_code);
        canonical.subdivision = trimmed(&self.subdivision).map(|s| s.to_lowercase());
        canonical.neighborhood = trimmed(&self.neighborhood).map(|n| n.to_lowercase());
        canonical.limit = Some(self.limit());
        canonical.offset = Some(self.offset());

        // Plain data with string keys; serializing cannot fail.
        let json = serde_json::to_string(&canonical).unwrap_or_default();
        let digest = Sha256::digest(json.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_accepts_string_or_array() {
        let one: SearchParams = serde_json::from_value(json!({ "status": "Closed" })).unwrap();
        assert_eq!(one.status, vec![CanonicalStatus::Closed]);

        let many: SearchParams =
            serde_json::from_value(json!({ "status": ["Pending", "Active Under Contract"] }))
                .unwrap();
        assert_eq!(
            many.status,
            vec![CanonicalStatus::Pending, CanonicalStatus::ActiveUnderContract]
        );

        let none: SearchParams = serde_json::from_value(json!({ "city": "Austin" })).unwrap();
        assert!(none.status.is_empty());
        assert_eq!(none.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn closed_maps_to_sold() {
        let p = SearchParams {
            status: vec![CanonicalStatus::Closed],
            ..Default::default()
        };
        let q = p.to_aggregator_query();
        assert_eq!(q.status.as_deref(), Some("U"));
        assert_eq!(q.last_status.as_deref(), Some("Sld"));

        let p = SearchParams {
            status: vec![CanonicalStatus::Active, CanonicalStatus::Pending],
            ..Default::default()
        };
        assert_eq!(p.to_aggregator_query().status.as_deref(), Some("A"));

        let p = SearchParams {
            status: vec![CanonicalStatus::Active, CanonicalStatus::Closed],
            ..Default::default()
        };
        assert_eq!(p.to_aggregator_query().status, None);
    }

    #[test]
    fn source_queries_leave_paging_to_the_service() {
        let p = SearchParams {
            city: Some("  Austin ".into()),
            limit: Some(20),
            offset: Some(40),
            ..Default::default()
        };
        let f = p.to_db_filters();
        assert_eq!(f.city.as_deref(), Some("Austin"));
        assert_eq!(f.limit, None);
        assert_eq!(f.offset, None);
        let q = p.to_aggregator_query();
        assert_eq!(q.results_per_page, None);
        assert_eq!(q.page_num, None);
    }

    #[test]
    fn property_type_is_not_sent_to_the_aggregator() {
        let p = SearchParams {
            property_type: vec![PropertyType::Condominium],
            city: Some("Austin".into()),
            ..Default::default()
        };
        let sent = serde_json::to_value(p.to_aggregator_query()).unwrap();
        assert_eq!(sent, json!({ "city": "Austin" }));
    }

    #[test]
    fn cache_key_ignores_order_and_case() {
        let a = SearchParams {
            city: Some("Austin".into()),
            status: vec![CanonicalStatus::Closed, CanonicalStatus::Pending],
            ..Default::default()
        };
        let b = SearchParams {
            city: Some(" austin".into()),
            status: vec![
                CanonicalStatus::Pending,
                CanonicalStatus::Closed,
                CanonicalStatus::Pending,
            ],
            limit: Some(DEFAULT_LIMIT),
            ..Default::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key().len(), 64);

        let c = SearchParams {
            city: Some("Dallas".into()),
            ..a.clone()
        };
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn source_selection() {
        let p = SearchParams {
            sources: vec![ListingSource::Database],
            ..Default::default()
        };
        assert!(!p.wants(ListingSource::Aggregator));
        assert!(p.wants(ListingSource::Database));
        assert!(SearchParams::default().wants(ListingSource::Aggregator));
    }
}
