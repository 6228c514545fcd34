// src/domain/property_type.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed taxonomy every provider sub-type is folded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "Single Family Residence")]
    SingleFamilyResidence,
    #[serde(rename = "Condominium")]
    Condominium,
    #[serde(rename = "Townhouse")]
    Townhouse,
    #[serde(rename = "Multi-Family")]
    MultiFamily,
    #[serde(rename = "Manufactured Home")]
    ManufacturedHome,
    #[serde(rename = "Ranch")]
    Ranch,
    #[serde(rename = "Unimproved Land")]
    UnimprovedLand,
    #[serde(rename = "Multiple Lots (Adjacent)")]
    MultipleLotsAdjacent,
    #[serde(rename = "Other")]
    Other,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::SingleFamilyResidence => "Single Family Residence",
            PropertyType::Condominium => "Condominium",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::MultiFamily => "Multi-Family",
            PropertyType::ManufacturedHome => "Manufactured Home",
            PropertyType::Ranch => "Ranch",
            PropertyType::UnimprovedLand => "Unimproved Land",
            PropertyType::MultipleLotsAdjacent => "Multiple Lots (Adjacent)",
            PropertyType::Other => "Other",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword groups in evaluation order. The first group with a keyword that
/// occurs in the input wins, so specific kinds sit above the generic ones:
/// "Manufactured Home on Land" must not land in Unimproved Land, and
/// "Townhouse" must not be caught by the single-family "house".
///
/// This is the only classification table in the crate. Listing mapping and
/// inventory counting both go through [`normalize_property_type`].
const KEYWORD_GROUPS: &[(PropertyType, &[&str])] = &[
    (PropertyType::ManufacturedHome, &["manufactured", "mobile", "modular"]),
    (PropertyType::Condominium, &["condo", "apartment", "co-op", "coop", "stacked flat"]),
    (PropertyType::Townhouse, &["townhouse", "townhome", "town house", "rowhouse", "row house"]),
    (
        PropertyType::MultiFamily,
        &["multi-family", "multi family", "multifamily", "duplex", "triplex", "fourplex", "quadplex", "2-4 units"],
    ),
    (PropertyType::MultipleLotsAdjacent, &["multiple lots", "adjacent lots", "lots (adjacent)"]),
    (PropertyType::Ranch, &["ranch", "farm"]),
    (PropertyType::UnimprovedLand, &["land", "lot", "vacant", "acreage", "unimproved"]),
    (
        PropertyType::SingleFamilyResidence,
        &["single family", "single-family", "sfr", "detached", "residential", "house", "cabin"],
    ),
];

/// Folds free-text sub-type strings onto [`PropertyType`]. Empty or
/// unmatched input is [`PropertyType::Other`].
pub fn normalize_property_type(raw_sub_type: Option<&str>) -> PropertyType {
    let needle = match raw_sub_type.map(|s| s.trim().to_lowercase()) {
        Some(s) if !s.is_empty() => s,
        _ => return PropertyType::Other,
    };

    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| needle.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(PropertyType::Other)
}
