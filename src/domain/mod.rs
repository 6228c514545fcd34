pub mod address;
pub mod canonical_id;
pub mod listing;
pub mod property_type;
pub mod status;

pub use address::{create_address_key, create_address_key_from_string};
pub use canonical_id::generate_canonical_id;
pub use listing::{CanonicalAddress, CanonicalListing, ListingSource, SOURCE_PRIORITY};
pub use property_type::{normalize_property_type, PropertyType};
pub use status::{normalize_status, CanonicalStatus};
