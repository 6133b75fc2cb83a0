use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, ExtractionError, Result};
use crate::parser::ProductParser;
use crate::product::ProductResult;

/// Fetches a product page and runs the parser over it.
///
/// Holds no per-request state: the client is a shared connection pool and the
/// parser is read-only, so one instance serves concurrent calls.
#[derive(Clone)]
pub struct Extractor {
    client: Client,
    parser: ProductParser,
}

impl Extractor {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(config.user_agent.as_str())
            .timeout(config.fetch_timeout)
            .connect_timeout(config.fetch_timeout.min(Duration::from_secs(5)))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let parser = ProductParser::new(config.site.clone())?;

        Ok(Extractor { client, parser })
    }

    /// Rejects empty URLs and URLs outside the configured site.
    pub fn validate_url<'a>(&self, url: &'a str) -> std::result::Result<&'a str, ExtractionError> {
        let url = url.trim();
        let site = self.parser.site();

        if url.is_empty() || !url.contains(&site.domain) {
            return Err(ExtractionError::InvalidUrl(site.name.clone()));
        }

        Ok(url)
    }

    pub async fn fetch_html(&self, url: &str) -> std::result::Result<String, ExtractionError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        Ok(html)
    }

    /// Single best-effort extraction: validate, fetch, parse. No retries.
    pub async fn extract(&self, url: &str) -> std::result::Result<ProductResult, ExtractionError> {
        let url = self.validate_url(url)?;

        let fetch_start = Instant::now();
        let html = self.fetch_html(url).await.map_err(|e| {
            warn!(url, error = %e, "page fetch failed");
            e
        })?;
        debug!(url, bytes = html.len(), elapsed = ?fetch_start.elapsed(), "page fetched");

        let parser = self.parser.clone();
        let product = tokio::task::spawn_blocking(move || parser.parse(&html))
            .await
            .map_err(|e| ExtractionError::Unknown(e.to_string()))??;
        info!(
            url,
            title = %product.title,
            price = product.price,
            images = product.images.len(),
            "product extracted"
        );

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(&Config::default()).unwrap()
    }

    #[test]
    fn urls_outside_the_site_are_rejected() {
        let extractor = extractor();

        for url in ["", "   ", "https://www.amazon.in/dp/B0C", "https://meesho.co/p/1"] {
            assert_eq!(
                extractor.validate_url(url),
                Err(ExtractionError::InvalidUrl("Meesho".to_string())),
                "{url:?}"
            );
        }
    }

    #[test]
    fn site_urls_are_accepted_and_trimmed() {
        let extractor = extractor();

        assert_eq!(
            extractor.validate_url("  https://www.meesho.com/saree/p/2k9x  "),
            Ok("https://www.meesho.com/saree/p/2k9x")
        );
    }

    #[tokio::test]
    async fn invalid_url_fails_before_any_fetch() {
        let err = extractor().extract("http://127.0.0.1:9/product").await.unwrap_err();

        assert_eq!(err, ExtractionError::InvalidUrl("Meesho".to_string()));
    }

    #[tokio::test]
    async fn unreachable_page_is_fetch_failure() {
        let err = extractor()
            .extract("http://127.0.0.1:9/meesho.com/p/1")
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::FetchFailed(_)), "{err:?}");
    }
}
