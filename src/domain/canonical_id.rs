// src/domain/canonical_id.rs

use sha2::{Digest, Sha256};

pub const MLS_TAG: &str = "mls-";
pub const LISTING_ID_TAG: &str = "lid-";
pub const SOURCE_ID_TAG: &str = "src-";
pub const ADDRESS_TAG: &str = "addr-";

/// Id given to a record that carries no identifier at all.
pub const UNKNOWN_ID: &str = "unknown";

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|v| !v.is_empty())
}

/// Trim + lower-case so case differences between providers do not split
/// one listing into two.
fn scoped(tag: &str, raw: &str) -> String {
    format!("{tag}{}", raw.trim().to_lowercase())
}

/// Address keys contain spaces and delimiters; hash them into a short, stable token.
fn address_token(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Deterministic id from whichever identifier is available, in priority
/// order: MLS number, listing id, source-specific id, address key.
///
/// The prefix records which kind of identifier was used, so an MLS number
/// and a listing id with the same text never collide.
pub fn generate_canonical_id(
    mls_number: Option<&str>,
    listing_id: Option<&str>,
    source_specific_id: Option<&str>,
    address_key: Option<&str>,
) -> String {
    if let Some(mls) = non_empty(mls_number) {
        return scoped(MLS_TAG, mls);
    }
    if let Some(lid) = non_empty(listing_id) {
        return scoped(LISTING_ID_TAG, lid);
    }
    if let Some(sid) = non_empty(source_specific_id) {
        return scoped(SOURCE_ID_TAG, sid);
    }
    if let Some(key) = non_empty(address_key) {
        return format!("{ADDRESS_TAG}{}", address_token(key));
    }
    UNKNOWN_ID.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_id() {
        let a = generate_canonical_id(Some("123ABC"), Some("L1"), None, Some("100|main st"));
        let b = generate_canonical_id(Some("123ABC"), Some("L1"), None, Some("100|main st"));
        assert_eq!(a, b);
        assert_eq!(a, "mls-123abc");
    }

    #[test]
    fn priority_order() {
        assert_eq!(generate_canonical_id(None, Some("L1"), Some("9"), Some("k")), "lid-l1");
        assert_eq!(generate_canonical_id(Some(" "), None, Some("9"), Some("k")), "src-9");
        let addr = generate_canonical_id(None, None, None, Some("100|main st|austin"));
        assert!(addr.starts_with(ADDRESS_TAG));
        assert_eq!(addr.len(), ADDRESS_TAG.len() + 16);
        assert_eq!(generate_canonical_id(None, None, None, None), UNKNOWN_ID);
    }

    #[test]
    fn id_tracks_presence_of_the_winning_field() {
        // Lower-priority fields do not leak into the id once an MLS number is present.
        let with_mls = generate_canonical_id(Some("X1"), Some("L1"), None, Some("key"));
        let other_listing = generate_canonical_id(Some("X1"), Some("L2"), None, Some("other"));
        assert_eq!(with_mls, other_listing);

        // Dropping the MLS number changes which field wins, and therefore the id.
        let without_mls = generate_canonical_id(None, Some("L1"), None, Some("key"));
        assert_ne!(with_mls, without_mls);

        // A different MLS number is a different id.
        assert_ne!(with_mls, generate_canonical_id(Some("X2"), Some("L1"), None, Some("key")));
    }
}
