use crate::aggregator::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// listing
//  ├── mlsNumber
//  ├── status / lastStatus / class / type
//  ├── listPrice / soldPrice / originalPrice
//  ├── listDate / soldDate / updatedOn / daysOnMarket
//  ├── address
//  │    ├── streetNumber / streetDirection / streetName / streetSuffix
//  │    ├── unitNumber
//  │    ├── city / state / zip
//  │    └── neighborhood / area
//  ├── map
//  │    ├── latitude
//  │    └── longitude
//  ├── details
//  │    ├── numBedrooms / numBathrooms / sqft / yearBuilt
//  │    ├── propertyType / style
//  │    └── numGarageSpaces / swimmingPool
//  ├── lot
//  │    ├── acres
//  │    └── squareFeet
//  ├── images []
//  └── raw (RESO field names, used as fallbacks)
//       ├── UnparsedAddress / City / StateOrProvince / PostalCode
//       ├── ListingKey / ListingId
//       ├── PropertySubType / StandardStatus
//       ├── SubdivisionName
//       ├── ElementarySchool / MiddleOrJuniorSchool / HighSchool
//       ├── PoolFeatures
//       └── ModificationTimestamp

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorListing {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub mls_number: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub last_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub class: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub list_price: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub sold_price: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub original_price: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub list_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sold_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub updated_on: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub days_on_market: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub address: Option<AggregatorAddress>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub map: Option<AggregatorMap>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub details: Option<AggregatorDetails>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub lot: Option<AggregatorLot>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub images: Vec<String>,

    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub raw: Option<AggregatorRawFields>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorAddress {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub street_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub street_direction: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub street_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub street_suffix: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub unit_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub neighborhood: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub area: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AggregatorMap {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorDetails {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub num_bedrooms: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub num_bathrooms: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub sqft: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub year_built: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub property_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub num_garage_spaces: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub swimming_pool: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorLot {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub acres: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub square_feet: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AggregatorRawFields {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub unparsed_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub state_or_province: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub listing_key: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub listing_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub property_sub_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub standard_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub subdivision_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub elementary_school: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub middle_or_junior_school: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub high_school: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub pool_features: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub modification_timestamp: Option<String>,
}

/// Page of results as the aggregator returns it. Listings stay as untouched
/// JSON so they can be attached verbatim under `raw`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorSearchResponse {
    #[serde(default)]
    pub listings: Vec<Value>,
    #[serde(default, alias = "count")]
    pub num_results: Option<u64>,
    #[serde(default)]
    pub num_pages: Option<u64>,
}

/// Query sent to the aggregator, already translated from `SearchParams`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_beds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_beds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_baths: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_baths: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_sqft: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sqft: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_per_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_num: Option<usize>,
}
