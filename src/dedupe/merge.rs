use crate::domain::canonical_id::UNKNOWN_ID;
use crate::domain::listing::{
    data_source_label, CanonicalAddress, CanonicalListing, ListingSource, UNKNOWN_ADDRESS,
};

fn has_address(a: &CanonicalAddress) -> bool {
    a.line1 != UNKNOWN_ADDRESS || !a.normalized_key.is_empty()
}

fn fill_text(primary: &str, secondary: &str) -> String {
    if primary.trim().is_empty() {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}

fn merge_address(primary: &CanonicalAddress, secondary: &CanonicalAddress) -> CanonicalAddress {
    // A placeholder address is replaced as a whole so the parts stay consistent.
    if !has_address(primary) && has_address(secondary) {
        return secondary.clone();
    }
    let line1 = if primary.line1 == UNKNOWN_ADDRESS {
        secondary.line1.clone()
    } else {
        fill_text(&primary.line1, &secondary.line1)
    };
    CanonicalAddress {
        line1,
        city: fill_text(&primary.city, &secondary.city),
        state: fill_text(&primary.state, &secondary.state),
        postal_code: fill_text(&primary.postal_code, &secondary.postal_code),
        unit: primary.unit.clone().or_else(|| secondary.unit.clone()),
        normalized_key: fill_text(&primary.normalized_key, &secondary.normalized_key),
    }
}

/// Merges two listings describing the same property.
///
/// Every field comes from `primary` unless it is absent there, in which case
/// `secondary` fills it. `sources` and `source_ids` are unions (on an id
/// conflict for one source, `primary` wins). `primary_source` is recomputed
/// from [`crate::domain::listing::SOURCE_PRIORITY`], not inherited from the
/// argument order, so callers sort by source priority before folding.
///
/// Not commutative: swapping the arguments swaps which side wins conflicts.
pub fn merge_listings(primary: &CanonicalListing, secondary: &CanonicalListing) -> CanonicalListing {
    let mut merged = primary.clone();

    macro_rules! fill {
        ($($field:ident),+ $(,)?) => {
            $(
                if merged.$field.is_none() {
                    merged.$field = secondary.$field.clone();
                }
            )+
        };
    }

    fill!(
        list_price,
        close_price,
        original_price,
        beds,
        baths,
        living_area_sqft,
        lot_size_sqft,
        lot_size_acres,
        year_built,
        property_type,
        property_sub_type,
        garage_spaces,
        pool_features,
        subdivision,
        neighborhood,
        latitude,
        longitude,
        elementary_school,
        middle_school,
        high_school,
        mls_number,
        listing_id,
        list_date,
        close_date,
        days_on_market,
        last_updated,
    );

    if merged.id == UNKNOWN_ID {
        merged.id = secondary.id.clone();
    }

    merged.address = merge_address(&primary.address, &secondary.address);

    if merged.photos.is_empty() {
        merged.photos = secondary.photos.clone();
    }

    merged.sources.extend(secondary.sources.iter().copied());
    for (source, id) in &secondary.source_ids {
        merged.source_ids.entry(*source).or_insert_with(|| id.clone());
    }

    if let Some(raw) = &secondary.raw {
        let bag = merged.raw.get_or_insert_with(Default::default);
        for (source, value) in raw {
            bag.entry(*source).or_insert_with(|| value.clone());
        }
    }

    merged.primary_source =
        ListingSource::highest_priority(merged.sources.iter()).unwrap_or(primary.primary_source);
    merged.data_source = data_source_label(&merged.sources);

    merged
}
