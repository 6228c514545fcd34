//! Provider record → [`CanonicalListing`]. One mapper per source; both share
//! the address, date and identifier helpers below so the two sources cannot
//! drift apart on how a key or id is built.

pub mod aggregator;
pub mod database;

pub use aggregator::AggregatorMapper;
pub use database::DatabaseMapper;

use crate::domain::address::{create_address_key, create_address_key_from_string, key_part_count};
use crate::domain::listing::{CanonicalAddress, CanonicalListing, ListingSource, UNKNOWN_ADDRESS};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

pub trait SourceMapper {
    type Record;

    fn source(&self) -> ListingSource;

    /// Never fails. Missing fields stay `None`; a record with no usable
    /// address gets the [`UNKNOWN_ADDRESS`] placeholder.
    fn map_to_canonical(&self, record: &Self::Record, include_raw: bool) -> CanonicalListing;

    /// One output per input, in input order.
    fn map_batch(&self, records: &[Self::Record], include_raw: bool) -> Vec<CanonicalListing> {
        records
            .iter()
            .map(|r| self.map_to_canonical(r, include_raw))
            .collect()
    }
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn owned(s: Option<&str>) -> Option<String> {
    non_empty(s).map(str::to_string)
}

/// Accepts `YYYY-MM-DD`, RFC 3339, `YYYY-MM-DD HH:MM:SS` and `MM/DD/YYYY`.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let s = non_empty(raw)?;
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some(ts) = parse_timestamp(Some(s)) {
        return Some(ts.date_naive());
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y").ok()
}

/// Timestamps without a zone are read as UTC.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let s = non_empty(raw)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub(crate) fn whole_count(n: Option<f64>) -> Option<u32> {
    n.filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32)
}

/// Address fields as a mapper found them, before normalization.
#[derive(Debug, Default)]
pub(crate) struct AddressParts<'a> {
    pub street_number: Option<&'a str>,
    pub street_name: Option<String>,
    pub unit: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub unparsed: Option<&'a str>,
}

impl AddressParts<'_> {
    /// Builds the canonical address. Components come first; the unparsed
    /// string is used for the key when components give fewer than two parts,
    /// and for the display line when there is no street.
    pub fn build(&self) -> CanonicalAddress {
        let mut key = create_address_key(
            self.street_number,
            self.street_name.as_deref(),
            self.unit,
            self.city,
            self.state,
            self.postal_code,
        );

        if key_part_count(&key) < 2 && non_empty(self.unparsed).is_some() {
            let from_string =
                create_address_key_from_string(self.unparsed, self.city, self.state, self.postal_code);
            if key_part_count(&from_string) > key_part_count(&key) {
                key = from_string;
            }
        }

        let street_line = [non_empty(self.street_number), non_empty(self.street_name.as_deref())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        let line1 = if !street_line.is_empty() {
            street_line
        } else if let Some(first) = non_empty(self.unparsed)
            .and_then(|u| u.split(',').next())
            .and_then(|s| non_empty(Some(s)))
        {
            first.to_string()
        } else {
            debug!(normalized_key = %key, "no street address, using placeholder");
            UNKNOWN_ADDRESS.to_string()
        };

        CanonicalAddress {
            line1,
            city: non_empty(self.city).unwrap_or_default().to_string(),
            state: non_empty(self.state).unwrap_or_default().to_uppercase(),
            postal_code: non_empty(self.postal_code).unwrap_or_default().to_string(),
            unit: owned(self.unit),
            normalized_key: key,
        }
    }
}

/// Attaches the untouched provider record under `raw[source]`.
pub(crate) fn attach_raw(listing: &mut CanonicalListing, source: ListingSource, raw: serde_json::Value) {
    listing
        .raw
        .get_or_insert_with(BTreeMap::new)
        .insert(source, raw);
}
