use crate::db::connection::Database;
use crate::errors::SourceError;
use crate::sources::ListingStore;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_DB_LIMIT: usize = 100;

const SELECT_COLUMNS: &str = r#"
    id, listing_id, mls_number,
    standard_status, mls_status,
    list_price, close_price, original_list_price,
    unparsed_address, street_number, street_name, unit_number,
    city, state_or_province, postal_code,
    bedrooms_total, bathrooms_total, living_area,
    lot_size_square_feet, lot_size_acres, year_built,
    property_type, property_sub_type, garage_spaces, pool_features,
    subdivision_name, neighborhood, latitude, longitude,
    elementary_school, middle_school, high_school,
    listing_contract_date, close_date, days_on_market,
    photos, modification_timestamp
"#;

/// One row of `mls_listings`, exactly as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DbListingRecord {
    pub id: i64,
    pub listing_id: Option<String>,
    pub mls_number: Option<String>,

    pub standard_status: Option<String>,
    pub mls_status: Option<String>,

    pub list_price: Option<i64>,
    pub close_price: Option<i64>,
    pub original_list_price: Option<i64>,

    pub unparsed_address: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub unit_number: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,

    pub bedrooms_total: Option<i64>,
    pub bathrooms_total: Option<f64>,
    pub living_area: Option<f64>,
    pub lot_size_square_feet: Option<f64>,
    pub lot_size_acres: Option<f64>,
    pub year_built: Option<i64>,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,
    pub garage_spaces: Option<f64>,
    pub pool_features: Option<String>,

    pub subdivision_name: Option<String>,
    pub neighborhood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elementary_school: Option<String>,
    pub middle_school: Option<String>,
    pub high_school: Option<String>,

    pub listing_contract_date: Option<String>,
    pub close_date: Option<String>,
    pub days_on_market: Option<i64>,

    pub photos: Option<String>,
    pub modification_timestamp: Option<String>,
}

/// Location and numeric bounds pushed down into SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbFilters {
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub subdivision: Option<String>,
    pub neighborhood: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_beds: Option<u32>,
    pub max_beds: Option<u32>,
    pub min_baths: Option<f64>,
    pub max_baths: Option<f64>,
    pub min_sqft: Option<u32>,
    pub max_sqft: Option<u32>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl DbFilters {
    /// `WHERE ...` clause (or empty) plus its bound values.
    fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        let mut text = |clause: &'static str, v: &Option<String>| {
            if let Some(v) = v.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                clauses.push(clause);
                values.push(SqlValue::Text(v.to_string()));
            }
        };
        text("city = ? COLLATE NOCASE", &self.city);
        text("postal_code = ?", &self.postal_code);
        text("subdivision_name = ? COLLATE NOCASE", &self.subdivision);
        text("neighborhood = ? COLLATE NOCASE", &self.neighborhood);

        let mut int = |clause: &'static str, v: Option<i64>| {
            if let Some(v) = v {
                clauses.push(clause);
                values.push(SqlValue::Integer(v));
            }
        };
        int("COALESCE(close_price, list_price) >= ?", self.min_price);
        int("COALESCE(close_price, list_price) <= ?", self.max_price);
        int("bedrooms_total >= ?", self.min_beds.map(i64::from));
        int("bedrooms_total <= ?", self.max_beds.map(i64::from));
        int("living_area >= ?", self.min_sqft.map(i64::from));
        int("living_area <= ?", self.max_sqft.map(i64::from));

        let mut real = |clause: &'static str, v: Option<f64>| {
            if let Some(v) = v {
                clauses.push(clause);
                values.push(SqlValue::Real(v));
            }
        };
        real("bathrooms_total >= ?", self.min_baths);
        real("bathrooms_total <= ?", self.max_baths);

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

// SQLite is loosely typed and imports are messy: a price stored as text or
// a year stored as a float must not fail the whole query.

fn lenient_text(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(col)? {
        ValueRef::Text(t) => {
            let s = String::from_utf8_lossy(t).trim().to_string();
            (!s.is_empty()).then_some(s)
        }
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

fn lenient_f64(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(col)? {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(t) => crate::aggregator::lenient::parse_number(&String::from_utf8_lossy(t)),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

fn lenient_i64(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<i64>> {
    Ok(lenient_f64(row, col)?.map(|f| f.round() as i64))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DbListingRecord> {
    Ok(DbListingRecord {
        id: row.get("id")?,
        listing_id: lenient_text(row, "listing_id")?,
        mls_number: lenient_text(row, "mls_number")?,

        standard_status: lenient_text(row, "standard_status")?,
        mls_status: lenient_text(row, "mls_status")?,

        list_price: lenient_i64(row, "list_price")?,
        close_price: lenient_i64(row, "close_price")?,
        original_list_price: lenient_i64(row, "original_list_price")?,

        unparsed_address: lenient_text(row, "unparsed_address")?,
        street_number: lenient_text(row, "street_number")?,
        street_name: lenient_text(row, "street_name")?,
        unit_number: lenient_text(row, "unit_number")?,
        city: lenient_text(row, "city")?,
        state_or_province: lenient_text(row, "state_or_province")?,
        postal_code: lenient_text(row, "postal_code")?,

        bedrooms_total: lenient_i64(row, "bedrooms_total")?,
        bathrooms_total: lenient_f64(row, "bathrooms_total")?,
        living_area: lenient_f64(row, "living_area")?,
        lot_size_square_feet: lenient_f64(row, "lot_size_square_feet")?,
        lot_size_acres: lenient_f64(row, "lot_size_acres")?,
        year_built: lenient_i64(row, "year_built")?,
        property_type: lenient_text(row, "property_type")?,
        property_sub_type: lenient_text(row, "property_sub_type")?,
        garage_spaces: lenient_f64(row, "garage_spaces")?,
        pool_features: lenient_text(row, "pool_features")?,

        subdivision_name: lenient_text(row, "subdivision_name")?,
        neighborhood: lenient_text(row, "neighborhood")?,
        latitude: lenient_f64(row, "latitude")?,
        longitude: lenient_f64(row, "longitude")?,
        elementary_school: lenient_text(row, "elementary_school")?,
        middle_school: lenient_text(row, "middle_school")?,
        high_school: lenient_text(row, "high_school")?,

        listing_contract_date: lenient_text(row, "listing_contract_date")?,
        close_date: lenient_text(row, "close_date")?,
        days_on_market: lenient_i64(row, "days_on_market")?,

        photos: lenient_text(row, "photos")?,
        modification_timestamp: lenient_text(row, "modification_timestamp")?,
    })
}

/// [`ListingStore`] over the SQLite `mls_listings` table.
#[derive(Clone, Debug)]
pub struct SqliteListingStore {
    db: Database,
}

impl SqliteListingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<DbListingRecord>, SourceError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM mls_listings WHERE {column} = ?1 COLLATE NOCASE LIMIT 1"
        );
        self.db.with_conn(|conn| {
            let record = conn
                .query_row(&sql, params![value.trim()], record_from_row)
                .optional()?;
            Ok(record)
        })
    }

    /// Inserts or replaces a row keyed on `listing_id`. Used by imports and tests.
    pub fn upsert(&self, r: &DbListingRecord) -> Result<(), SourceError> {
        self.db.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO mls_listings (
                    listing_id, mls_number, standard_status, mls_status,
                    list_price, close_price, original_list_price,
                    unparsed_address, street_number, street_name, unit_number,
                    city, state_or_province, postal_code,
                    bedrooms_total, bathrooms_total, living_area,
                    lot_size_square_feet, lot_size_acres, year_built,
                    property_type, property_sub_type, garage_spaces, pool_features,
                    subdivision_name, neighborhood, latitude, longitude,
                    elementary_school, middle_school, high_school,
                    listing_contract_date, close_date, days_on_market,
                    photos, modification_timestamp
                ) VALUES (
                    ?1, ?2, ?3, ?4,
                    ?5, ?6, ?7,
                    ?8, ?9, ?10, ?11,
                    ?12, ?13, ?14,
                    ?15, ?16, ?17,
                    ?18, ?19, ?20,
                    ?21, ?22, ?23, ?24,
                    ?25, ?26, ?27, ?28,
                    ?29, ?30, ?31,
                    ?32, ?33, ?34,
                    ?35, ?36
                )
                ON CONFLICT(listing_id) DO UPDATE SET
                    mls_number = excluded.mls_number,
                    standard_status = excluded.standard_status,
                    mls_status = excluded.mls_status,
                    list_price = excluded.list_price,
                    close_price = excluded.close_price,
                    original_list_price = excluded.original_list_price,
                    unparsed_address = excluded.unparsed_address,
                    street_number = excluded.street_number,
                    street_name = excluded.street_name,
                    unit_number = excluded.unit_number,
                    city = excluded.city,
                    state_or_province = excluded.state_or_province,
                    postal_code = excluded.postal_code,
                    bedrooms_total = excluded.bedrooms_total,
                    bathrooms_total = excluded.bathrooms_total,
                    living_area = excluded.living_area,
                    lot_size_square_feet = excluded.lot_size_square_feet,
                    lot_size_acres = excluded.lot_size_acres,
                    year_built = excluded.year_built,
                    property_type = excluded.property_type,
                    property_sub_type = excluded.property_sub_type,
                    garage_spaces = excluded.garage_spaces,
                    pool_features = excluded.pool_features,
                    subdivision_name = excluded.subdivision_name,
                    neighborhood = excluded.neighborhood,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude,
                    elementary_school = excluded.elementary_school,
                    middle_school = excluded.middle_school,
                    high_school = excluded.high_school,
                    listing_contract_date = excluded.listing_contract_date,
                    close_date = excluded.close_date,
                    days_on_market = excluded.days_on_market,
                    photos = excluded.photos,
                    modification_timestamp = excluded.modification_timestamp
                "#,
                params![
                    r.listing_id,
                    r.mls_number,
                    r.standard_status,
                    r.mls_status,
                    r.list_price,
                    r.close_price,
                    r.original_list_price,
                    r.unparsed_address,
                    r.street_number,
                    r.street_name,
                    r.unit_number,
                    r.city,
                    r.state_or_province,
                    r.postal_code,
                    r.bedrooms_total,
                    r.bathrooms_total,
                    r.living_area,
                    r.lot_size_square_feet,
                    r.lot_size_acres,
                    r.year_built,
                    r.property_type,
                    r.property_sub_type,
                    r.garage_spaces,
                    r.pool_features,
                    r.subdivision_name,
                    r.neighborhood,
                    r.latitude,
                    r.longitude,
                    r.elementary_school,
                    r.middle_school,
                    r.high_school,
                    r.listing_contract_date,
                    r.close_date,
                    r.days_on_market,
                    r.photos,
                    r.modification_timestamp,
                ],
            )?;
            Ok(())
        })
    }
}

impl ListingStore for SqliteListingStore {
    fn search_properties(&self, filters: &DbFilters) -> Result<Vec<DbListingRecord>, SourceError> {
        let (where_sql, mut values) = filters.where_clause();
        values.push(SqlValue::Integer(filters.limit.unwrap_or(DEFAULT_DB_LIMIT) as i64));
        values.push(SqlValue::Integer(filters.offset.unwrap_or(0) as i64));

        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM mls_listings {where_sql} \
             ORDER BY COALESCE(close_date, listing_contract_date) DESC, id LIMIT ? OFFSET ?"
        );

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), record_from_row)?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            debug!(rows = out.len(), "database search complete");
            Ok(out)
        })
    }

    fn get_property_by_listing_id(
        &self,
        listing_id: &str,
    ) -> Result<Option<DbListingRecord>, SourceError> {
        self.find_one("listing_id", listing_id)
    }

    fn get_property_by_mls_number(
        &self,
        mls_number: &str,
    ) -> Result<Option<DbListingRecord>, SourceError> {
        self.find_one("mls_number", mls_number)
    }

    fn get_property_by_row_id(&self, row_id: i64) -> Result<Option<DbListingRecord>, SourceError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM mls_listings WHERE id = ?1");
        self.db.with_conn(|conn| {
            let record = conn.query_row(&sql, params![row_id], record_from_row).optional()?;
            Ok(record)
        })
    }

    fn count_by_sub_type(
        &self,
        filters: &DbFilters,
    ) -> Result<Vec<(Option<String>, i64)>, SourceError> {
        let (where_sql, values) = filters.where_clause();
        let sql = format!(
            "SELECT property_sub_type, COUNT(*) AS n FROM mls_listings {where_sql} \
             GROUP BY property_sub_type ORDER BY n DESC"
        );

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    lenient_text(row, "property_sub_type")?, // sub-type, as imported
                    row.get::<_, i64>("n")?,
                ))
            })?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_have_no_where() {
        let (sql, values) = DbFilters::default().where_clause();
        assert!(sql.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn filters_bind_in_order() {
        let filters = DbFilters {
            city: Some("Austin".into()),
            postal_code: Some("  ".into()),
            min_price: Some(100),
            min_baths: Some(2.0),
            ..Default::default()
        };
        let (sql, values) = filters.where_clause();
        assert_eq!(
            sql,
            "WHERE city = ? COLLATE NOCASE AND COALESCE(close_price, list_price) >= ? AND bathrooms_total >= ?"
        );
        assert_eq!(
            values,
            vec![SqlValue::Text("Austin".into()), SqlValue::Integer(100), SqlValue::Real(2.0)]
        );
    }
}
