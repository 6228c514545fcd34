// src/service/listing_service.rs
use crate::aggregator::HttpAggregatorClient;
use crate::config::{DedupeSettings, ServiceConfig, DEFAULT_MAX_SOURCE_ROWS, DEFAULT_SOURCE_PAGE_SIZE};
use crate::db::{Database, SqliteListingStore};
use crate::dedupe::{deduplicate, DedupeOutcome};
use crate::domain::canonical_id::{LISTING_ID_TAG, MLS_TAG, SOURCE_ID_TAG};
use crate::domain::listing::{CanonicalListing, ListingSource};
use crate::errors::{ConfigError, SourceError};
use crate::inventory::InventoryCounts;
use crate::mappers::{AggregatorMapper, DatabaseMapper, SourceMapper};
use crate::service::cache::TtlCache;
use crate::service::params::SearchParams;
use crate::service::report::{DedupeReport, DedupeStats, FetchResult};
use crate::sources::{AggregatorClient, ListingStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

type SourceOutcome = (ListingSource, Result<Vec<CanonicalListing>, SourceError>);

/// Everything one pipeline run produces. `FetchResult` is the public slice.
struct PipelineRun {
    result: FetchResult,
    outcome: DedupeOutcome,
}

/// Fetches from every configured source, maps to canonical listings,
/// deduplicates, and reports per-source failures without failing the call.
pub struct CanonicalListingService {
    aggregator: Option<Arc<dyn AggregatorClient>>,
    store: Arc<dyn ListingStore>,
    aggregator_mapper: AggregatorMapper,
    database_mapper: DatabaseMapper,
    cache: Option<TtlCache<FetchResult>>,
    dedupe: DedupeSettings,
    page_size: usize,
    max_source_rows: usize,
}

impl CanonicalListingService {
    /// Database-only service with no cache and default dedupe settings.
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self {
            aggregator: None,
            store,
            aggregator_mapper: AggregatorMapper::default(),
            database_mapper: DatabaseMapper,
            cache: None,
            dedupe: DedupeSettings::default(),
            page_size: DEFAULT_SOURCE_PAGE_SIZE,
            max_source_rows: DEFAULT_MAX_SOURCE_ROWS,
        }
    }

    pub fn with_aggregator(mut self, client: Arc<dyn AggregatorClient>) -> Self {
        self.aggregator = Some(client);
        self
    }

    pub fn with_aggregator_mapper(mut self, mapper: AggregatorMapper) -> Self {
        self.aggregator_mapper = mapper;
        self
    }

    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(TtlCache::new(ttl));
        self
    }

    pub fn with_dedupe_settings(mut self, settings: DedupeSettings) -> Self {
        self.dedupe = settings;
        self
    }

    /// Sources are read `page_size` rows at a time until exhausted or until
    /// `max_rows` rows have been read from one source.
    pub fn with_source_paging(mut self, page_size: usize, max_rows: usize) -> Self {
        self.page_size = page_size.max(1);
        self.max_source_rows = max_rows;
        self
    }

    /// Wires the SQLite store, the HTTP aggregator client (when an API key is
    /// configured) and the cache from `cfg`.
    pub fn from_config(cfg: &ServiceConfig) -> Result<Self, ConfigError> {
        let store = SqliteListingStore::new(Database::new(cfg.database_path.clone()));
        let mut service = Self::new(Arc::new(store))
            .with_aggregator_mapper(AggregatorMapper::new(cfg.image_base_url.clone()))
            .with_dedupe_settings(cfg.dedupe)
            .with_source_paging(cfg.source_page_size, cfg.max_source_rows);

        match &cfg.aggregator {
            Some(agg) => {
                let client = HttpAggregatorClient::new(agg)?;
                info!(url = %client.listings_url(), "aggregator source enabled");
                service = service.with_aggregator(Arc::new(client));
            }
            None => info!("no aggregator API key, database source only"),
        }

        if let Some(ttl) = cfg.cache_ttl {
            service = service.with_cache(ttl);
        }
        Ok(service)
    }

    pub fn has_aggregator(&self) -> bool {
        self.aggregator.is_some()
    }

    fn fetch_aggregator(
        &self,
        client: &dyn AggregatorClient,
        params: &SearchParams,
        max_rows: usize,
    ) -> Result<Vec<CanonicalListing>, SourceError> {
        let start = Instant::now();
        let per_page = self.page_size.min(max_rows);
        let mut query = params.to_aggregator_query();
        query.results_per_page = Some(per_page);

        let mut records = Vec::new();
        let mut page_num = 1;
        while records.len() < max_rows {
            query.page_num = Some(page_num);
            let page = client.search_listings(&query)?;
            let returned = page.listings.len();
            records.extend(page.listings);

            let last_page = page.num_pages.is_some_and(|n| page_num as u64 >= n);
            if returned < per_page || last_page {
                break;
            }
            page_num += 1;
        }
        if max_rows > 0 && records.len() >= max_rows {
            warn!(max_rows, "aggregator row cap reached, search may be incomplete");
        }
        records.truncate(max_rows);

        debug!(
            returned = records.len(),
            pages = page_num,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "aggregator search done"
        );
        Ok(self.aggregator_mapper.map_batch(&records, params.include_raw))
    }

    fn fetch_database(
        &self,
        params: &SearchParams,
        max_rows: usize,
    ) -> Result<Vec<CanonicalListing>, SourceError> {
        let start = Instant::now();
        let mut filters = params.to_db_filters();
        let mut rows = Vec::new();
        let mut pages = 0;

        while rows.len() < max_rows {
            let want = self.page_size.min(max_rows - rows.len());
            filters.limit = Some(want);
            filters.offset = Some(rows.len());
            let page = self.store.search_properties(&filters)?;
            pages += 1;
            let returned = page.len();
            rows.extend(page);
            if returned < want {
                break;
            }
        }
        if max_rows > 0 && rows.len() >= max_rows {
            warn!(max_rows, "database row cap reached, search may be incomplete");
        }

        debug!(
            returned = rows.len(),
            pages,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "database search done"
        );
        Ok(self.database_mapper.map_batch(&rows, params.include_raw))
    }

    /// Runs both source fetches concurrently and waits for both.
    fn collect(&self, params: &SearchParams, max_rows: usize) -> Vec<SourceOutcome> {
        let mut outcomes = Vec::with_capacity(2);

        let client = if params.wants(ListingSource::Aggregator) {
            let client = self.aggregator.as_deref();
            // Only an explicit request for the aggregator is an error.
            if client.is_none() && params.sources.contains(&ListingSource::Aggregator) {
                outcomes.push((
                    ListingSource::Aggregator,
                    Err(SourceError::Other("not configured".to_string())),
                ));
            }
            client
        } else {
            None
        };

        thread::scope(|s| {
            let agg_handle =
                client.map(|c| s.spawn(move || self.fetch_aggregator(c, params, max_rows)));
            let db_handle = params
                .wants(ListingSource::Database)
                .then(|| s.spawn(move || self.fetch_database(params, max_rows)));

            if let Some(h) = agg_handle {
                let r = h.join().unwrap_or(Err(SourceError::Panicked));
                outcomes.push((ListingSource::Aggregator, r));
            }
            if let Some(h) = db_handle {
                let r = h.join().unwrap_or(Err(SourceError::Panicked));
                outcomes.push((ListingSource::Database, r));
            }
        });

        outcomes
    }

    /// Reads up to `max_rows` from each source, deduplicates, applies the
    /// canonical filters and slices the requested page.
    fn run(&self, params: &SearchParams, max_rows: usize) -> PipelineRun {
        let start = Instant::now();
        let mut mapped = Vec::new();
        let mut errors = Vec::new();
        let mut source_breakdown = BTreeMap::new();

        for (source, outcome) in self.collect(params, max_rows) {
            match outcome {
                Ok(listings) => {
                    source_breakdown.insert(source, listings.len());
                    mapped.extend(listings);
                }
                Err(e) => {
                    warn!(%source, error = %e, "listing source failed");
                    errors.push(format!("{source}: {e}"));
                }
            }
        }

        let before_dedupe = mapped.len();
        let mut outcome = deduplicate(mapped, &self.dedupe);
        let after_dedupe = outcome.listings.len();

        let mut matching: Vec<CanonicalListing> = std::mem::take(&mut outcome.listings)
            .into_iter()
            .filter(|l| params.matches(l))
            .collect();
        matching.sort_by(|a, b| {
            a.id.cmp(&b.id)
                .then_with(|| a.primary_source.priority().cmp(&b.primary_source.priority()))
        });
        let total = matching.len();

        let page: Vec<CanonicalListing> = matching
            .iter()
            .skip(params.offset())
            .take(params.limit())
            .cloned()
            .collect();
        outcome.listings = matching;

        info!(
            before_dedupe,
            after_dedupe,
            total,
            returned = page.len(),
            errors = errors.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "listing search"
        );

        PipelineRun {
            result: FetchResult {
                listings: page,
                total,
                dedupe_stats: DedupeStats {
                    before_dedupe,
                    after_dedupe,
                    duplicates_removed: before_dedupe - after_dedupe,
                    source_breakdown,
                },
                errors,
            },
            outcome,
        }
    }

    /// Searches every requested source and returns deduplicated listings.
    ///
    /// Every source is read in full (up to the per-source row cap) before
    /// filtering and paging, so `total` counts every match and successive
    /// pages do not overlap. Never fails: a source that errors contributes an entry to `errors`
    /// and no listings. Results are served from the cache when one is
    /// configured and a fresh entry exists; results carrying errors are not
    /// cached.
    pub fn fetch_listings(&self, params: &SearchParams) -> FetchResult {
        let key = self.cache.as_ref().map(|_| params.cache_key());
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                debug!(cache_key = %key, "listing cache hit");
                return hit;
            }
        }

        let result = self.run(params, self.max_source_rows).result;

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            if result.errors.is_empty() {
                debug!(cache_key = %key, ttl = ?cache.ttl(), "listing cache store");
                cache.insert(key, result.clone());
            }
        }
        result
    }

    /// Looks a listing up in the database by listing id or canonical id.
    ///
    /// `lid-` ids resolve through the listing id, `mls-` ids through the MLS
    /// number and `src-` ids through the table row id. Anything else is taken
    /// as a bare listing id.
    pub fn get_listing_by_id(
        &self,
        id: &str,
        include_raw: bool,
    ) -> Result<Option<CanonicalListing>, SourceError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        let record = if let Some(mls) = id.strip_prefix(MLS_TAG) {
            self.store.get_property_by_mls_number(mls)?
        } else if let Some(row) = id.strip_prefix(SOURCE_ID_TAG) {
            // Database listings only get a `src-` id from their row id.
            match row.parse::<i64>() {
                Ok(row_id) => self.store.get_property_by_row_id(row_id)?,
                Err(_) => None,
            }
        } else {
            let listing_id = id.strip_prefix(LISTING_ID_TAG).unwrap_or(id);
            self.store.get_property_by_listing_id(listing_id)?
        };

        Ok(record.map(|r| self.database_mapper.map_to_canonical(&r, include_raw)))
    }

    /// First `count` listings of an unfiltered search.
    pub fn get_sample_listings(&self, count: usize, include_raw: bool) -> FetchResult {
        self.fetch_listings(&SearchParams {
            limit: Some(count),
            include_raw,
            ..Default::default()
        })
    }

    /// Runs the pipeline over up to `sample_size` listings per source and
    /// reports what deduplication did. Always bypasses the cache.
    pub fn get_dedupe_report(&self, sample_size: usize) -> DedupeReport {
        self.get_dedupe_report_for(&SearchParams {
            limit: Some(sample_size),
            ..Default::default()
        })
    }

    /// Same as [`Self::get_dedupe_report`] with location and numeric bounds.
    /// Each source contributes at most `params.limit()` rows.
    pub fn get_dedupe_report_for(&self, params: &SearchParams) -> DedupeReport {
        let run = self.run(params, params.limit());
        DedupeReport {
            sample_size: params.limit(),
            inventory: InventoryCounts::from_listings(&run.outcome.listings),
            stats: run.result.dedupe_stats,
            merged_groups: run.outcome.merged_groups,
            possible_duplicates: run.outcome.possible_duplicates,
            errors: run.result.errors,
        }
    }

    /// Database inventory per property-type bucket, counted in SQL and
    /// folded through the same sub-type normalization as listing mapping.
    pub fn get_inventory_counts(&self, params: &SearchParams) -> Result<InventoryCounts, SourceError> {
        let rows = self.store.count_by_sub_type(&params.to_db_filters())?;
        Ok(InventoryCounts::from_sub_type_rows(&rows))
    }
}
