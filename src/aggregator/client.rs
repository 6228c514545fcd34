// client.rs
use crate::aggregator::models::{AggregatorQuery, AggregatorSearchResponse};
use crate::config::AggregatorConfig;
use crate::errors::{ConfigError, SourceError};
use crate::sources::AggregatorClient;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const API_KEY_HEADER: &str = "REPLIERS-API-KEY";
const LISTINGS_PATH: &str = "listings";

/// Blocking HTTP client for the MLS aggregator's listing search.
pub struct HttpAggregatorClient {
    client: Client,
    listings_url: Url,
    api_key: String,
}

impl HttpAggregatorClient {
    pub fn new(cfg: &AggregatorConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            listings_url: cfg.base_url.join(LISTINGS_PATH)?,
            api_key: cfg.api_key.clone(),
        })
    }

    pub fn listings_url(&self) -> &Url {
        &self.listings_url
    }
}

impl AggregatorClient for HttpAggregatorClient {
    fn search_listings(
        &self,
        query: &AggregatorQuery,
    ) -> Result<AggregatorSearchResponse, SourceError> {
        let start = Instant::now();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .get(self.listings_url.clone())
            .headers(headers)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;

        if !status.is_success() {
            warn!(status = status.as_u16(), elapsed = ?start.elapsed(), "aggregator search rejected");
            return Err(SourceError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let page: AggregatorSearchResponse = serde_json::from_str(&text)?;
        debug!(
            listings = page.listings.len(),
            num_results = ?page.num_results,
            num_pages = ?page.num_pages,
            elapsed = ?start.elapsed(),
            "aggregator search complete"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_url_joins_base() {
        let cfg = AggregatorConfig {
            base_url: Url::parse("https://api.example.test/v2/").unwrap(),
            api_key: "k".into(),
            timeout_secs: 5,
        };
        let client = HttpAggregatorClient::new(&cfg).unwrap();
        assert_eq!(client.listings_url().as_str(), "https://api.example.test/v2/listings");
    }

    #[test]
    fn response_accepts_count_alias() {
        let page: AggregatorSearchResponse =
            serde_json::from_str(r#"{"listings":[{"mlsNumber":"1"}],"count":1,"numPages":1}"#).unwrap();
        assert_eq!(page.listings.len(), 1);
        assert_eq!(page.num_results, Some(1));
        assert_eq!(page.num_pages, Some(1));
    }
}
