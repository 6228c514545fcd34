// src/inventory.rs
use crate::domain::listing::CanonicalListing;
use crate::domain::property_type::{normalize_property_type, PropertyType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Listing counts per property-type bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCounts {
    pub total: u64,
    pub by_type: BTreeMap<PropertyType, u64>,
}

impl InventoryCounts {
    fn add(&mut self, bucket: PropertyType, n: u64) {
        if n == 0 {
            return;
        }
        *self.by_type.entry(bucket).or_insert(0) += n;
        self.total += n;
    }

    /// Listings with no sub type count as [`PropertyType::Other`].
    pub fn from_listings(listings: &[CanonicalListing]) -> Self {
        let mut counts = Self::default();
        for l in listings {
            counts.add(l.property_sub_type.unwrap_or(PropertyType::Other), 1);
        }
        counts
    }

    /// From `(raw sub type, row count)` pairs as the store groups them.
    /// Several raw spellings fold into one bucket; negative counts are ignored.
    pub fn from_sub_type_rows(rows: &[(Option<String>, i64)]) -> Self {
        let mut counts = Self::default();
        for (raw, n) in rows {
            let n = u64::try_from(*n).unwrap_or(0);
            counts.add(normalize_property_type(raw.as_deref()), n);
        }
        counts
    }

    pub fn get(&self, bucket: PropertyType) -> u64 {
        self.by_type.get(&bucket).copied().unwrap_or(0)
    }
}
