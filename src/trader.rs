use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::config::Settings;
use crate::utils::{iso_now, now_ts};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    fn done(&self) -> &'static str {
        match self {
            Side::Buy => "Bought",
            Side::Sell => "Sold",
        }
    }

    /// The sink payload names the amount differently per side.
    fn amount_key(&self) -> &'static str {
        match self {
            Side::Buy => "totalCost",
            Side::Sell => "totalEarned",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeStatus {
    pub message: String,
    pub kind: &'static str, // success|error
    pub ts: f64,
}

/// The one status line under the table. Each trade action overwrites it.
#[derive(Clone, Default)]
pub struct StatusTray {
    inner: Arc<RwLock<Option<TradeStatus>>>,
}

impl StatusTray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, kind: &'static str, message: String) {
        *self.inner.write() = Some(TradeStatus {
            message,
            kind,
            ts: now_ts(),
        });
    }

    pub fn snapshot(&self) -> Option<TradeStatus> {
        self.inner.read().clone()
    }
}

/// Posts simulated one-share trades to the sink and reports the outcome on
/// the status line. No retry, no idempotency key; a duplicate click makes a
/// duplicate post.
#[derive(Clone)]
pub struct TradeNotifier {
    http: reqwest::Client,
    sink_url: String,
    status: StatusTray,
}

impl TradeNotifier {
    pub fn new(settings: &Settings, status: StatusTray) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("trade sink http client")?;
        Ok(Self {
            http,
            sink_url: settings.trade_sink_url.clone(),
            status,
        })
    }

    pub async fn submit(&self, side: Side, symbol: &str, price: f64) {
        let mut payload = json!({
            "symbol": symbol,
            "price": price,
            "qty": 1,
            "dateTime": iso_now(),
            "action": side.as_str(),
        });
        payload[side.amount_key()] = json!(price);

        match self.http.post(&self.sink_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                let id = resp
                    .json::<JsonValue>()
                    .await
                    .ok()
                    .and_then(|b| b.get("id").cloned());
                let id_text = match id {
                    Some(JsonValue::Number(n)) => n.to_string(),
                    Some(JsonValue::String(s)) => s,
                    _ => "--".to_string(),
                };
                log::info!(
                    "trade.posted action={} symbol={} price={:.2} id={}",
                    side.as_str(),
                    symbol,
                    price,
                    id_text
                );
                self.status.set(
                    "success",
                    format!(
                        "Success: {} 1 share of {} at ${:.2}. Response ID: {}",
                        side.done(),
                        symbol,
                        price,
                        id_text
                    ),
                );
            }
            Ok(resp) => {
                log::warn!(
                    "trade.post.http action={} symbol={} status={}",
                    side.as_str(),
                    symbol,
                    resp.status()
                );
                self.status.set("error", failed_message(side, symbol));
            }
            Err(e) => {
                log::warn!(
                    "trade.post.error action={} symbol={} {}",
                    side.as_str(),
                    symbol,
                    e
                );
                self.status.set("error", failed_message(side, symbol));
            }
        }
    }
}

fn failed_message(side: Side, symbol: &str) -> String {
    format!("Error: Failed to {} 1 share of {}.", side.as_str(), symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_strings_match_the_wire_tags() {
        assert_eq!(Side::Buy.as_str(), "buy");
        assert_eq!(Side::Sell.as_str(), "sell");
        assert_eq!(Side::Buy.amount_key(), "totalCost");
        assert_eq!(Side::Sell.amount_key(), "totalEarned");
    }

    #[test]
    fn failure_message_keeps_the_literal_prefix() {
        let m = failed_message(Side::Buy, "AAPL");
        assert!(m.contains("Error: Failed to"));
        assert_eq!(m, "Error: Failed to buy 1 share of AAPL.");
    }

    #[test]
    fn status_line_is_overwritten_not_appended() {
        let tray = StatusTray::new();
        tray.set("success", "first".into());
        tray.set("error", "second".into());
        let s = tray.snapshot().unwrap();
        assert_eq!(s.message, "second");
        assert_eq!(s.kind, "error");
    }
}
