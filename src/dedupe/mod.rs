//! Duplicate scoring, pairwise merging and the grouping pass that uses both.

pub mod engine;
pub mod merge;
pub mod score;

pub use engine::{deduplicate, DedupeOutcome, MergedGroup, PossibleDuplicate};
pub use merge::merge_listings;
pub use score::calculate_duplicate_score;
