pub mod connection;
pub mod listings;

pub use connection::Database;
pub use listings::{DbFilters, DbListingRecord, SqliteListingStore};
