use crate::aggregator::models::{AggregatorAddress, AggregatorListing};
use crate::config::DEFAULT_IMAGE_BASE_URL;
use crate::domain::canonical_id::generate_canonical_id;
use crate::domain::listing::{CanonicalListing, ListingSource};
use crate::domain::property_type::normalize_property_type;
use crate::domain::status::normalize_status;
use crate::mappers::{
    attach_raw, non_empty, owned, parse_date, parse_timestamp, whole_count, AddressParts,
    SourceMapper,
};
use serde_json::Value;
use tracing::warn;

/// Maps aggregator search results (kept as raw JSON) onto canonical listings.
#[derive(Debug, Clone)]
pub struct AggregatorMapper {
    image_base_url: String,
}

impl Default for AggregatorMapper {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_BASE_URL)
    }
}

impl AggregatorMapper {
    pub fn new(image_base_url: impl Into<String>) -> Self {
        Self {
            image_base_url: image_base_url.into(),
        }
    }

    /// Aggregator images are CDN-relative paths; absolute URLs pass through.
    fn photo_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.image_base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }

    fn decode(record: &Value) -> AggregatorListing {
        // Derived struct decoding would accept a JSON array positionally.
        if !record.is_object() {
            warn!("aggregator record is not an object, mapping as empty");
            return AggregatorListing::default();
        }
        match serde_json::from_value::<AggregatorListing>(record.clone()) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %e, "aggregator record not decodable, mapping as empty");
                AggregatorListing::default()
            }
        }
    }
}

fn street_name(addr: &AggregatorAddress) -> Option<String> {
    let joined = [
        non_empty(addr.street_direction.as_deref()),
        non_empty(addr.street_name.as_deref()),
        non_empty(addr.street_suffix.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
    (!joined.is_empty()).then_some(joined)
}

impl SourceMapper for AggregatorMapper {
    type Record = Value;

    fn source(&self) -> ListingSource {
        ListingSource::Aggregator
    }

    fn map_to_canonical(&self, record: &Value, include_raw: bool) -> CanonicalListing {
        let l = Self::decode(record);
        let addr = l.address.as_ref();
        let raw = l.raw.as_ref();
        let details = l.details.as_ref();

        // Nested address first, RESO raw fields as the fallback.
        let parts = AddressParts {
            street_number: addr.and_then(|a| non_empty(a.street_number.as_deref())),
            street_name: addr.and_then(street_name),
            unit: addr.and_then(|a| non_empty(a.unit_number.as_deref())),
            city: addr
                .and_then(|a| non_empty(a.city.as_deref()))
                .or_else(|| raw.and_then(|r| non_empty(r.city.as_deref()))),
            state: addr
                .and_then(|a| non_empty(a.state.as_deref()))
                .or_else(|| raw.and_then(|r| non_empty(r.state_or_province.as_deref()))),
            postal_code: addr
                .and_then(|a| non_empty(a.zip.as_deref()))
                .or_else(|| raw.and_then(|r| non_empty(r.postal_code.as_deref()))),
            unparsed: raw.and_then(|r| non_empty(r.unparsed_address.as_deref())),
        };
        let address = parts.build();

        let mls_number = owned(l.mls_number.as_deref());
        let listing_id = raw.and_then(|r| owned(r.listing_id.as_deref()));
        let listing_key = raw.and_then(|r| owned(r.listing_key.as_deref()));

        let id = generate_canonical_id(
            mls_number.as_deref(),
            listing_id.as_deref(),
            listing_key.as_deref(),
            Some(address.normalized_key.as_str()),
        );
        let source_id = mls_number
            .clone()
            .or_else(|| listing_key.clone())
            .or_else(|| listing_id.clone());

        let mut listing = CanonicalListing::new(id, ListingSource::Aggregator, source_id);

        let primary_status = raw
            .and_then(|r| non_empty(r.standard_status.as_deref()))
            .or_else(|| non_empty(l.status.as_deref()));
        listing.standard_status = normalize_status(primary_status, l.last_status.as_deref());

        listing.list_price = l.list_price;
        listing.close_price = l.sold_price;
        listing.original_price = l.original_price;

        listing.address = address;

        listing.beds = whole_count(details.and_then(|d| d.num_bedrooms));
        listing.baths = details.and_then(|d| d.num_bathrooms);
        listing.living_area_sqft = details.and_then(|d| d.sqft);
        listing.lot_size_sqft = l.lot.as_ref().and_then(|lot| lot.square_feet);
        listing.lot_size_acres = l.lot.as_ref().and_then(|lot| lot.acres);
        listing.year_built = details
            .and_then(|d| d.year_built)
            .and_then(|y| i32::try_from(y).ok());
        listing.property_type = owned(l.class.as_deref());

        let sub_type = raw
            .and_then(|r| non_empty(r.property_sub_type.as_deref()))
            .or_else(|| details.and_then(|d| non_empty(d.property_type.as_deref())))
            .or_else(|| details.and_then(|d| non_empty(d.style.as_deref())));
        listing.property_sub_type = sub_type.map(|s| normalize_property_type(Some(s)));

        listing.garage_spaces = details.and_then(|d| d.num_garage_spaces);
        listing.pool_features = details
            .and_then(|d| owned(d.swimming_pool.as_deref()))
            .or_else(|| raw.and_then(|r| owned(r.pool_features.as_deref())));

        listing.subdivision = raw.and_then(|r| owned(r.subdivision_name.as_deref()));
        listing.neighborhood = addr.and_then(|a| {
            owned(a.neighborhood.as_deref()).or_else(|| owned(a.area.as_deref()))
        });
        listing.latitude = l.map.as_ref().and_then(|m| m.latitude);
        listing.longitude = l.map.as_ref().and_then(|m| m.longitude);
        listing.elementary_school = raw.and_then(|r| owned(r.elementary_school.as_deref()));
        listing.middle_school = raw.and_then(|r| owned(r.middle_or_junior_school.as_deref()));
        listing.high_school = raw.and_then(|r| owned(r.high_school.as_deref()));

        listing.mls_number = mls_number;
        listing.listing_id = listing_id;
        listing.list_date = parse_date(l.list_date.as_deref());
        listing.close_date = parse_date(l.sold_date.as_deref());
        listing.days_on_market = l.days_on_market;

        listing.photos = l
            .images
            .iter()
            .filter_map(|p| non_empty(Some(p.as_str())))
            .map(|p| self.photo_url(p))
            .collect();

        listing.last_updated = parse_timestamp(l.updated_on.as_deref())
            .or_else(|| raw.and_then(|r| parse_timestamp(r.modification_timestamp.as_deref())));

        if include_raw {
            attach_raw(&mut listing, ListingSource::Aggregator, record.clone());
        }

        listing
    }
}
