use crate::db::listings::DbListingRecord;
use crate::domain::canonical_id::generate_canonical_id;
use crate::domain::listing::{CanonicalListing, ListingSource};
use crate::domain::property_type::normalize_property_type;
use crate::domain::status::normalize_status;
use crate::mappers::{
    attach_raw, non_empty, owned, parse_date, parse_timestamp, whole_count, AddressParts,
    SourceMapper,
};
use tracing::warn;

/// Maps rows of the historical listings table onto canonical listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseMapper;

/// Photo column holds a JSON array, or a comma-separated list from older imports.
fn parse_photos(raw: Option<&str>) -> Vec<String> {
    let Some(text) = non_empty(raw) else {
        return Vec::new();
    };

    if text.starts_with('[') {
        if let Ok(urls) = serde_json::from_str::<Vec<serde_json::Value>>(text) {
            return urls
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| owned(Some(s)))
                .collect();
        }
    }

    text.split(',').filter_map(|s| owned(Some(s))).collect()
}

impl SourceMapper for DatabaseMapper {
    type Record = DbListingRecord;

    fn source(&self) -> ListingSource {
        ListingSource::Database
    }

    fn map_to_canonical(&self, r: &DbListingRecord, include_raw: bool) -> CanonicalListing {
        let address = AddressParts {
            street_number: non_empty(r.street_number.as_deref()),
            street_name: owned(r.street_name.as_deref()),
            unit: non_empty(r.unit_number.as_deref()),
            city: non_empty(r.city.as_deref()),
            state: non_empty(r.state_or_province.as_deref()),
            postal_code: non_empty(r.postal_code.as_deref()),
            unparsed: non_empty(r.unparsed_address.as_deref()),
        }
        .build();

        let mls_number = owned(r.mls_number.as_deref());
        let listing_id = owned(r.listing_id.as_deref());
        let row_id = r.id.to_string();

        let id = generate_canonical_id(
            mls_number.as_deref(),
            listing_id.as_deref(),
            Some(row_id.as_str()),
            Some(address.normalized_key.as_str()),
        );
        let source_id = listing_id.clone().unwrap_or(row_id);

        let mut listing = CanonicalListing::new(id, ListingSource::Database, Some(source_id));

        listing.standard_status =
            normalize_status(r.standard_status.as_deref(), r.mls_status.as_deref());

        listing.list_price = r.list_price;
        listing.close_price = r.close_price;
        listing.original_price = r.original_list_price;

        listing.address = address;

        listing.beds = whole_count(r.bedrooms_total.map(|b| b as f64));
        listing.baths = r.bathrooms_total;
        listing.living_area_sqft = r.living_area;
        listing.lot_size_sqft = r.lot_size_square_feet;
        listing.lot_size_acres = r.lot_size_acres;
        listing.year_built = r.year_built.and_then(|y| i32::try_from(y).ok());
        listing.property_type = owned(r.property_type.as_deref());
        listing.property_sub_type = non_empty(r.property_sub_type.as_deref())
            .map(|s| normalize_property_type(Some(s)));
        listing.garage_spaces = r.garage_spaces;
        listing.pool_features = owned(r.pool_features.as_deref());

        listing.subdivision = owned(r.subdivision_name.as_deref());
        listing.neighborhood = owned(r.neighborhood.as_deref());
        listing.latitude = r.latitude;
        listing.longitude = r.longitude;
        listing.elementary_school = owned(r.elementary_school.as_deref());
        listing.middle_school = owned(r.middle_school.as_deref());
        listing.high_school = owned(r.high_school.as_deref());

        listing.mls_number = mls_number;
        listing.listing_id = listing_id;
        listing.list_date = parse_date(r.listing_contract_date.as_deref());
        listing.close_date = parse_date(r.close_date.as_deref());
        listing.days_on_market = r.days_on_market;

        listing.photos = parse_photos(r.photos.as_deref());
        listing.last_updated = parse_timestamp(r.modification_timestamp.as_deref());

        if include_raw {
            match serde_json::to_value(r) {
                Ok(raw) => attach_raw(&mut listing, ListingSource::Database, raw),
                Err(e) => warn!(row = r.id, error = %e, "could not serialize database row"),
            }
        }

        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::UNKNOWN_ADDRESS;
    use crate::domain::property_type::PropertyType;
    use crate::domain::status::CanonicalStatus;

    fn row() -> DbListingRecord {
        DbListingRecord {
            id: 42,
            listing_id: Some("ACT-9001".into()),
            mls_number: None,
            standard_status: Some("S".into()),
            list_price: Some(410000),
            close_price: Some(402500),
            street_number: Some("77".into()),
            street_name: Some("Sunset Boulevard".into()),
            unit_number: Some("Unit 2".into()),
            city: Some("Boise".into()),
            state_or_province: Some("ID".into()),
            postal_code: Some("83702".into()),
            bedrooms_total: Some(2),
            bathrooms_total: Some(2.0),
            living_area: Some(1180.0),
            property_sub_type: Some("Condo/Townhome".into()),
            close_date: Some("2023-11-30".into()),
            photos: Some(r#"["https://img.test/1.jpg", 5, " "]"#.into()),
            ..Default::default()
        }
    }

    #[test]
    fn maps_row() {
        let l = DatabaseMapper.map_to_canonical(&row(), false);
        assert_eq!(l.id, "lid-act-9001");
        assert_eq!(l.source_ids.get(&ListingSource::Database).map(String::as_str), Some("ACT-9001"));
        assert_eq!(l.primary_source, ListingSource::Database);
        assert_eq!(l.standard_status, CanonicalStatus::Closed);
        assert_eq!(l.address.line1, "77 Sunset Boulevard");
        assert_eq!(l.address.unit.as_deref(), Some("Unit 2"));
        assert_eq!(l.address.normalized_key, "77|sunset blvd|unit 2|boise|id|83702");
        assert_eq!(l.property_sub_type, Some(PropertyType::Condominium));
        assert_eq!(l.close_date, chrono::NaiveDate::from_ymd_opt(2023, 11, 30));
        assert_eq!(l.photos, vec!["https://img.test/1.jpg"]);
        assert_eq!(l.last_updated, None);
        assert_eq!(l.data_source, "Listing Database");
    }

    #[test]
    fn mls_status_disambiguates() {
        let mut r = row();
        r.standard_status = Some("Active".into());
        r.mls_status = Some("Under Contract".into());
        let l = DatabaseMapper.map_to_canonical(&r, false);
        assert_eq!(l.standard_status, CanonicalStatus::ActiveUnderContract);
    }

    #[test]
    fn comma_separated_photos() {
        assert_eq!(
            parse_photos(Some("a.jpg, b.jpg,,")),
            vec!["a.jpg".to_string(), "b.jpg".to_string()]
        );
        assert!(parse_photos(None).is_empty());
    }

    #[test]
    fn raw_row_is_attached() {
        let l = DatabaseMapper.map_to_canonical(&row(), true);
        let raw = l.raw.unwrap();
        let db = raw.get(&ListingSource::Database).unwrap();
        assert_eq!(db["listing_id"], "ACT-9001");
        assert_eq!(db["photos"], r#"["https://img.test/1.jpg", 5, " "]"#);
    }

    #[test]
    fn empty_row_uses_row_id_and_placeholder() {
        let r = DbListingRecord {
            id: 7,
            ..Default::default()
        };
        let l = DatabaseMapper.map_to_canonical(&r, false);
        assert_eq!(l.id, "src-7");
        assert_eq!(l.address.line1, UNKNOWN_ADDRESS);
        assert_eq!(l.standard_status, CanonicalStatus::Active);
        assert_eq!(l.property_sub_type, None);
    }

    #[test]
    fn batch_is_one_to_one() {
        let rows = vec![row(), DbListingRecord::default(), row()];
        assert_eq!(DatabaseMapper.map_batch(&rows, false).len(), 3);
    }
}
