use canonical_listings::db::Database;
use canonical_listings::{
    CanonicalListingService, CanonicalStatus, ListingSource, SearchParams, ServiceConfig,
};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints a deduplication report (or sample listings) as JSON.
#[derive(Parser, Debug)]
#[command(name = "listing-report", version)]
struct Args {
    /// SQLite file holding historical listings
    #[arg(long, env = "LISTINGS_DB_PATH")]
    db_path: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    postal_code: Option<String>,

    /// Canonical status, e.g. "closed" or "active-under-contract" (repeatable)
    #[arg(long, value_parser = parse_status)]
    status: Vec<CanonicalStatus>,

    /// Listings requested from each source
    #[arg(long, default_value_t = 100)]
    sample_size: usize,

    /// Restrict to one source: aggregator or database (repeatable)
    #[arg(long, value_parser = parse_source)]
    source: Vec<ListingSource>,

    /// Print sample listings instead of the dedupe report
    #[arg(long)]
    samples: bool,

    /// Attach untouched provider records to each listing
    #[arg(long)]
    include_raw: bool,
}

fn parse_source(s: &str) -> Result<ListingSource, String> {
    serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase()))
        .map_err(|_| format!("unknown source {s:?}, expected aggregator or database"))
}

fn parse_status(s: &str) -> Result<CanonicalStatus, String> {
    s.parse()
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("❌ Could not serialize output: {e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canonical_listings=info,listing_report=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // 1️⃣ Configuration from the environment, flags on top
    let mut cfg = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    if let Some(path) = args.db_path.clone() {
        cfg.database_path = path;
    }
    // One-shot process; nothing to reuse a cache for.
    cfg.cache_ttl = None;

    // 2️⃣ Make sure the listings table exists
    if let Err(e) = Database::new(cfg.database_path.clone()).init_schema() {
        eprintln!("❌ Database initialization failed: {e}");
        std::process::exit(1);
    }

    // 3️⃣ Build the service
    let service = match CanonicalListingService::from_config(&cfg) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("❌ Could not build listing service: {e}");
            std::process::exit(1);
        }
    };
    info!(
        db = %cfg.database_path,
        aggregator = service.has_aggregator(),
        "listing service ready"
    );

    let params = SearchParams {
        city: args.city,
        postal_code: args.postal_code,
        status: args.status,
        limit: Some(args.sample_size),
        include_raw: args.include_raw,
        sources: args.source,
        ..Default::default()
    };

    // 4️⃣ Run and print
    if args.samples {
        print_json(&service.fetch_listings(&params));
    } else {
        print_json(&service.get_dedupe_report_for(&params));
    }
}
