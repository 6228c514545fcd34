use crate::config::DedupeSettings;
use crate::dedupe::merge::merge_listings;
use crate::dedupe::score::calculate_duplicate_score;
use crate::domain::address::is_substantial_key;
use crate::domain::listing::{CanonicalListing, ListingSource};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A set of input listings that collapsed into one output listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedGroup {
    pub id: String,
    pub mls_number: Option<String>,
    pub address_key: String,
    pub sources: BTreeSet<ListingSource>,
    pub constituent_ids: Vec<String>,
}

/// Two listings sharing an address key whose score landed in
/// `[possible_duplicate_floor, duplicate_threshold)`. Both are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleDuplicate {
    pub left_id: String,
    pub right_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DedupeOutcome {
    /// Order is not meaningful.
    pub listings: Vec<CanonicalListing>,
    pub merged_groups: Vec<MergedGroup>,
    pub possible_duplicates: Vec<PossibleDuplicate>,
}

/// Running merge plus the ids of everything folded into it.
struct Accumulator {
    listing: CanonicalListing,
    constituents: Vec<String>,
}

impl Accumulator {
    fn start(listing: CanonicalListing) -> Self {
        let constituents = vec![listing.id.clone()];
        Self { listing, constituents }
    }

    fn absorb(&mut self, other: &CanonicalListing) {
        self.listing = merge_listings(&self.listing, other);
        self.constituents.push(other.id.clone());
    }

    fn finish(self, out: &mut DedupeOutcome) {
        if self.constituents.len() > 1 {
            out.merged_groups.push(MergedGroup {
                id: self.listing.id.clone(),
                mls_number: self.listing.mls_number.clone(),
                address_key: self.listing.address.normalized_key.clone(),
                sources: self.listing.sources.clone(),
                constituent_ids: self.constituents,
            });
        }
        out.listings.push(self.listing);
    }
}

fn sort_by_source_priority(group: &mut [CanonicalListing]) {
    // Stable: listings from the same source keep their input order.
    group.sort_by_key(|l| l.primary_source.priority());
}

/// Groups and merges listings that describe the same property.
///
/// Listings with an MLS number are bucketed by its lower-cased form and each
/// bucket is folded into one listing. Listings without one are grouped only
/// when they share a substantial address key; within such a group a
/// candidate is merged into the running listing only if their duplicate
/// score reaches `settings.duplicate_threshold`. Listings with a weak or
/// missing address key are never merged.
pub fn deduplicate(listings: Vec<CanonicalListing>, settings: &DedupeSettings) -> DedupeOutcome {
    let before = listings.len();
    let mut out = DedupeOutcome::default();

    let mut by_mls: BTreeMap<String, Vec<CanonicalListing>> = BTreeMap::new();
    let mut by_address: BTreeMap<String, Vec<CanonicalListing>> = BTreeMap::new();

    for listing in listings {
        if let Some(mls) = listing.mls_key() {
            by_mls.entry(mls).or_default().push(listing);
        } else if is_substantial_key(&listing.address.normalized_key) {
            by_address
                .entry(listing.address.normalized_key.clone())
                .or_default()
                .push(listing);
        } else {
            out.listings.push(listing);
        }
    }

    for (_, mut bucket) in by_mls {
        sort_by_source_priority(&mut bucket);
        let mut rest = bucket.into_iter();
        let Some(first) = rest.next() else { continue };
        let mut acc = Accumulator::start(first);
        for next in rest {
            acc.absorb(&next);
        }
        acc.finish(&mut out);
    }

    for (key, mut group) in by_address {
        sort_by_source_priority(&mut group);
        let mut rest = group.into_iter();
        let Some(first) = rest.next() else { continue };
        let mut acc = Accumulator::start(first);
        for candidate in rest {
            let score = calculate_duplicate_score(&acc.listing, &candidate);
            if score >= settings.duplicate_threshold {
                acc.absorb(&candidate);
                continue;
            }
            debug!(address_key = %key, score, left = %acc.listing.id, right = %candidate.id, "address match below threshold, kept apart");
            if score >= settings.possible_duplicate_floor {
                out.possible_duplicates.push(PossibleDuplicate {
                    left_id: acc.listing.id.clone(),
                    right_id: candidate.id.clone(),
                    score,
                });
            }
            out.listings.push(candidate);
        }
        acc.finish(&mut out);
    }

    debug!(
        before,
        after = out.listings.len(),
        merged_groups = out.merged_groups.len(),
        "deduplicated listings"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn listing(id: &str, source: ListingSource) -> CanonicalListing {
        CanonicalListing::new(id.to_string(), source, Some(id.to_string()))
    }

    fn ids(out: &DedupeOutcome) -> HashSet<&str> {
        out.listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn mls_numbers_bucket_case_insensitively() {
        let mut a = listing("mls-123abc", ListingSource::Database);
        a.mls_number = Some("123abc".into());
        a.close_price = Some(480_000);
        let mut b = listing("mls-123abc", ListingSource::Aggregator);
        b.mls_number = Some("123ABC".into());
        b.list_price = Some(500_000);
        let mut c = listing("mls-999", ListingSource::Aggregator);
        c.mls_number = Some("999".into());

        let out = deduplicate(vec![a, b, c], &DedupeSettings::default());
        assert_eq!(out.listings.len(), 2);
        assert_eq!(out.merged_groups.len(), 1);

        let merged = out.listings.iter().find(|l| l.id == "mls-123abc").unwrap();
        assert_eq!(merged.sources.len(), 2);
        assert_eq!(merged.primary_source, ListingSource::Aggregator);
        // Aggregator sorts first so its MLS spelling wins.
        assert_eq!(merged.mls_number.as_deref(), Some("123ABC"));
        assert_eq!(merged.list_price, Some(500_000));
        assert_eq!(merged.close_price, Some(480_000));
        assert_eq!(out.merged_groups[0].constituent_ids.len(), 2);
    }

    #[test]
    fn weak_keys_never_merge() {
        let mut a = listing("src-1", ListingSource::Database);
        a.address.normalized_key = "tx|78701".into();
        a.list_price = Some(100);
        let mut b = a.clone();
        b.id = "src-2".into();
        let c = listing("src-3", ListingSource::Database);
        let d = listing("src-4", ListingSource::Database);

        let out = deduplicate(vec![a, b, c, d], &DedupeSettings::default());
        assert_eq!(out.listings.len(), 4);
        assert!(out.merged_groups.is_empty());
    }

    #[test]
    fn address_collision_below_threshold_stays_apart() {
        let key = "12|oak ave|reno|nv|89501";
        let mut a = listing("lid-a", ListingSource::Database);
        a.address.normalized_key = key.into();
        a.list_price = Some(300_000);
        a.beds = Some(2);
        a.baths = Some(1.0);
        a.living_area_sqft = Some(900.0);
        let mut b = listing("lid-b", ListingSource::Database);
        b.address.normalized_key = key.into();
        b.list_price = Some(650_000);
        b.beds = Some(4);
        b.baths = Some(3.0);
        b.living_area_sqft = Some(2400.0);

        let out = deduplicate(vec![a, b], &DedupeSettings::default());
        assert_eq!(ids(&out), HashSet::from(["lid-a", "lid-b"]));
        assert!(out.possible_duplicates.is_empty());
    }

    #[test]
    fn borderline_pair_is_reported_not_merged() {
        let key = "12|oak ave|reno|nv|89501";
        let mut a = listing("lid-a", ListingSource::Database);
        a.address.normalized_key = key.into();
        a.list_price = Some(300_000);
        a.beds = Some(2);
        let mut b = a.clone();
        b.id = "lid-b".into();
        b.list_price = Some(340_000);
        b.beds = Some(3);
        // address 0.45, price 0.0, beds 0.0 -> 0.45 / 0.75 = 0.6
        let out = deduplicate(vec![a, b], &DedupeSettings::default());
        assert_eq!(out.listings.len(), 2);
        assert_eq!(out.possible_duplicates.len(), 1);
        let pair = &out.possible_duplicates[0];
        assert!((pair.score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn counts_are_preserved() {
        let mut input = Vec::new();
        for i in 0..5 {
            let mut l = listing(&format!("mls-{i}"), ListingSource::Aggregator);
            l.mls_number = Some(format!("M{}", i % 2));
            input.push(l);
        }
        let out = deduplicate(input, &DedupeSettings::default());
        assert_eq!(out.listings.len(), 2);
        let absorbed: usize = out
            .merged_groups
            .iter()
            .map(|g| g.constituent_ids.len() - 1)
            .sum();
        assert_eq!(absorbed, 3);
    }
}
