//! CoinGecko simple-price client

use super::PriceSource;
use crate::config::PriceFeedConfig;
use crate::error::{Error, Result};
use crate::market::{PriceBook, Symbol};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Fetches USD prices for every feed symbol in one request
pub struct CoinGeckoSource {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl CoinGeckoSource {
    pub fn new(config: &PriceFeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/simple/price", self.base_url)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch(&self) -> Result<PriceBook> {
        let ids = Symbol::ALL
            .iter()
            .map(|s| s.coingecko_id())
            .collect::<Vec<_>>()
            .join(",");

        let mut request = self
            .client
            .get(self.endpoint())
            .query(&[("ids", ids.as_str()), ("vs_currencies", "usd")]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.expose_secret());
        }

        let response = request.send().await?.error_for_status()?;
        let body: Value = response.json().await?;
        let book = parse_simple_price(&body);
        if book.is_empty() {
            return Err(Error::Price("No usable prices in CoinGecko response".to_string()));
        }
        Ok(book)
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}

/// Build a price book from a `/simple/price` body
///
/// Unknown ids and non-numeric prices are skipped.
pub fn parse_simple_price(body: &Value) -> PriceBook {
    let mut book = PriceBook::new();
    for symbol in Symbol::ALL {
        let price = body
            .get(symbol.coingecko_id())
            .and_then(|entry| entry.get("usd"))
            .and_then(Value::as_f64);
        match price {
            Some(price) if price.is_finite() && price > 0.0 => book.insert(symbol, price),
            Some(price) => tracing::debug!(%symbol, price, "Discarding non-positive price"),
            None => {}
        }
    }
    book.updated_at = Some(Utc::now());
    book
}
