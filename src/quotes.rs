use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use crate::config::Settings;

pub const SERIES_KEY: &str = "Time Series (1min)";
pub const META_KEY: &str = "Meta Data";
pub const META_SYMBOL_KEY: &str = "2. Symbol";

/// Thin client for the intraday quotes endpoint. One GET per symbol,
/// fixed query parameters, no retry.
#[derive(Clone)]
pub struct QuoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl QuoteClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("quotes http client")?;
        Ok(Self {
            http,
            base_url: settings.quotes_base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Fetch the 1-minute series for one symbol. Network errors, non-2xx
    /// statuses, unparseable bodies, and bodies without the series key all
    /// collapse to `None`; the poll carries on with the remaining symbols.
    pub async fn fetch_intraday(&self, symbol: &str) -> Option<JsonValue> {
        let resp = match self
            .http
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("interval", "1min"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                log::warn!("quotes.fetch.error symbol={} {}", symbol, e);
                return None;
            }
        };

        if !resp.status().is_success() {
            log::warn!("quotes.fetch.http symbol={} status={}", symbol, resp.status());
            return None;
        }

        let body: JsonValue = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                log::warn!("quotes.fetch.parse symbol={} {}", symbol, e);
                return None;
            }
        };

        // Rate-limit notes and unknown-symbol replies come back 200 with no
        // series key; they count as a miss like any other failure.
        if body.get(SERIES_KEY).and_then(|v| v.as_object()).is_none() {
            log::warn!("quotes.fetch.empty symbol={} missing series key", symbol);
            return None;
        }

        Some(body)
    }
}

/// The queried symbol as the provider's metadata block reports it.
pub fn meta_symbol(body: &JsonValue) -> Option<&str> {
    body.get(META_KEY)?.get(META_SYMBOL_KEY)?.as_str()
}
