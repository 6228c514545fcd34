use crate::dedupe::{MergedGroup, PossibleDuplicate};
use crate::domain::listing::{CanonicalListing, ListingSource};
use crate::inventory::InventoryCounts;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupeStats {
    pub before_dedupe: usize,
    pub after_dedupe: usize,
    pub duplicates_removed: usize,
    /// Mapped listings per source, before deduplication.
    pub source_breakdown: BTreeMap<ListingSource, usize>,
}

/// Outbound search result. Field names are part of the consumer contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    pub listings: Vec<CanonicalListing>,
    /// Matching listings after deduplication, before pagination.
    pub total: usize,
    pub dedupe_stats: DedupeStats,
    /// One `"<source>: <message>"` entry per failed source.
    pub errors: Vec<String>,
}

/// Diagnostics over one run of the search pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupeReport {
    pub sample_size: usize,
    pub stats: DedupeStats,
    pub merged_groups: Vec<MergedGroup>,
    pub possible_duplicates: Vec<PossibleDuplicate>,
    pub inventory: InventoryCounts,
    pub errors: Vec<String>,
}
