// src/domain/status.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four-value standard status every listing resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalStatus {
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "Active Under Contract")]
    ActiveUnderContract,
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Closed")]
    Closed,
}

impl CanonicalStatus {
    pub const ALL: [CanonicalStatus; 4] = [
        CanonicalStatus::Active,
        CanonicalStatus::ActiveUnderContract,
        CanonicalStatus::Pending,
        CanonicalStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalStatus::Active => "Active",
            CanonicalStatus::ActiveUnderContract => "Active Under Contract",
            CanonicalStatus::Pending => "Pending",
            CanonicalStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse of a canonical name, ignoring case and `_`/`-` separators.
/// Unlike [`normalize_status`], anything else is an error.
impl FromStr for CanonicalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s);
        CanonicalStatus::ALL
            .into_iter()
            .find(|status| fold(status.as_str()) == wanted)
            .ok_or_else(|| {
                format!("unknown status {s:?}, expected Active, Active Under Contract, Pending or Closed")
            })
    }
}

/// Lower-case, treat `_`/`-` as spaces, collapse whitespace.
fn fold(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Last status" codes that settle the question on their own. Anything else
/// (price change, extension, new, ...) says nothing about the lifecycle.
fn definitive_last_status(folded: &str) -> Option<CanonicalStatus> {
    match folded {
        "sld" | "sold" | "lsd" | "leased" | "closed" | "cls" => Some(CanonicalStatus::Closed),
        "sc" | "sce" | "auc" | "under contract" | "active under contract" => {
            Some(CanonicalStatus::ActiveUnderContract)
        }
        "pnd" | "pend" | "pending" => Some(CanonicalStatus::Pending),
        _ => None,
    }
}

/// Letter codes, abbreviations and full-text variants seen across providers.
fn lookup_status(folded: &str) -> Option<CanonicalStatus> {
    match folded {
        "a" | "act" | "active" | "new" | "for sale" | "ready to build" | "coming soon" | "cs"
        | "for rent" => Some(CanonicalStatus::Active),

        "auc" | "uc" | "u/c" | "sc" | "under contract" | "active under contract"
        | "contingent" | "active contingent" | "backup" | "active backup"
        | "active with contract" => Some(CanonicalStatus::ActiveUnderContract),

        "p" | "pnd" | "pend" | "pending" | "pending sale" | "under agreement" => {
            Some(CanonicalStatus::Pending)
        }

        "s" | "sld" | "sold" | "closed" | "cls" | "leased" | "lsd" | "rented" => {
            Some(CanonicalStatus::Closed)
        }

        _ => None,
    }
}

/// Resolves any provider status onto the four canonical values.
///
/// A definitive `last_status` wins over the primary status, so an aggregator
/// record with status `U` and last status `Sld` reads as closed. Unrecognized
/// input falls back to [`CanonicalStatus::Active`]; this never fails.
pub fn normalize_status(raw_status: Option<&str>, last_status: Option<&str>) -> CanonicalStatus {
    if let Some(status) = last_status.map(fold).as_deref().and_then(definitive_last_status) {
        return status;
    }

    raw_status
        .map(fold)
        .as_deref()
        .and_then(lookup_status)
        .unwrap_or(CanonicalStatus::Active)
}
