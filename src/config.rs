use std::env;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

fn get_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn get_env_bool(key: &str, default: bool) -> bool {
    match get_env(key) {
        None => default,
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"),
    }
}

fn get_env_u64(key: &str, default: u64) -> Result<u64> {
    match get_env(key) {
        None => Ok(default),
        Some(v) => Ok(v
            .parse::<u64>()
            .map_err(|e| anyhow!("{key} invalid int: {e}"))?),
    }
}

fn get_env_usize(key: &str, default: usize) -> Result<usize> {
    match get_env(key) {
        None => Ok(default),
        Some(v) => Ok(v
            .parse::<usize>()
            .map_err(|e| anyhow!("{key} invalid int: {e}"))?),
    }
}

fn get_env_string(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|| default.to_string())
}

/// The page this tool grew out of tracked ten large caps; they stay the
/// default watch list.
pub const DEFAULT_SYMBOLS: &str = "AAPL,MSFT,TSLA,AMZN,GOOGL,NVDA,META,NFLX,DIS,BABA";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Modes
    pub run_mode: String, // serve|once

    // Provider + trade sink
    pub api_key: String,
    pub quotes_base_url: String,
    pub trade_sink_url: String,

    // Screener
    pub symbols: Vec<String>,
    pub refresh_secs: u64,
    pub rows_per_symbol: usize,
    pub top_rows: usize,
    pub mock_seed: Option<u64>,

    // Network
    pub http_timeout_secs: u64,

    // Lifecycle / dashboard
    pub poll_on_start: bool,
    pub dashboard_enabled: bool,
    pub dashboard_host: String,
    pub dashboard_port: u16,
    pub dashboard_open_browser: bool,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let run_mode = get_env_string("RUN_MODE", "serve").to_lowercase();

        let symbols = get_env_string("SYMBOLS", DEFAULT_SYMBOLS)
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let mock_seed = match get_env("MOCK_SEED") {
            None => None,
            Some(v) => Some(
                v.parse::<u64>()
                    .map_err(|e| anyhow!("MOCK_SEED invalid int: {e}"))?,
            ),
        };

        let s = Self {
            run_mode,
            api_key: get_env_string("ALPHAVANTAGE_API_KEY", "TDV0MJ56NM5WABXH"),
            quotes_base_url: get_env_string("QUOTES_BASE_URL", "https://www.alphavantage.co/query"),
            trade_sink_url: get_env_string(
                "TRADE_SINK_URL",
                "https://jsonplaceholder.typicode.com/posts",
            ),
            symbols,
            refresh_secs: get_env_u64("REFRESH_SECS", 20 * 60)?,
            rows_per_symbol: get_env_usize("ROWS_PER_SYMBOL", 10)?,
            top_rows: get_env_usize("TOP_ROWS", 10)?,
            mock_seed,
            http_timeout_secs: get_env_u64("HTTP_TIMEOUT_SECS", 10)?,
            poll_on_start: get_env_bool("POLL_ON_START", false),
            dashboard_enabled: get_env_bool("DASHBOARD_ENABLED", true),
            dashboard_host: get_env_string("DASHBOARD_HOST", "127.0.0.1"),
            dashboard_port: get_env_usize("DASHBOARD_PORT", 8000)? as u16,
            dashboard_open_browser: get_env_bool("DASHBOARD_OPEN_BROWSER", true),
        };

        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.run_mode.as_str(), "serve" | "once") {
            return Err(anyhow!("RUN_MODE must be serve|once (got {})", self.run_mode));
        }
        if self.api_key.is_empty() {
            return Err(anyhow!("ALPHAVANTAGE_API_KEY must not be empty"));
        }
        if self.symbols.is_empty() {
            return Err(anyhow!("SYMBOLS must name at least one ticker"));
        }
        if self.refresh_secs < 1 {
            return Err(anyhow!("REFRESH_SECS must be >= 1 (got {})", self.refresh_secs));
        }
        if self.rows_per_symbol < 1 {
            return Err(anyhow!(
                "ROWS_PER_SYMBOL must be >= 1 (got {})",
                self.rows_per_symbol
            ));
        }
        if self.top_rows < 1 {
            return Err(anyhow!("TOP_ROWS must be >= 1 (got {})", self.top_rows));
        }
        if self.http_timeout_secs < 1 {
            return Err(anyhow!(
                "HTTP_TIMEOUT_SECS must be >= 1 (got {})",
                self.http_timeout_secs
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Settings {
        Settings {
            run_mode: "serve".into(),
            api_key: "KEY".into(),
            quotes_base_url: "http://127.0.0.1:1".into(),
            trade_sink_url: "http://127.0.0.1:1/posts".into(),
            symbols: vec!["AAPL".into()],
            refresh_secs: 1200,
            rows_per_symbol: 10,
            top_rows: 10,
            mock_seed: None,
            http_timeout_secs: 10,
            poll_on_start: false,
            dashboard_enabled: false,
            dashboard_host: "127.0.0.1".into(),
            dashboard_port: 0,
            dashboard_open_browser: false,
        }
    }

    #[test]
    fn accepts_sane_settings() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_run_mode() {
        let mut s = base();
        s.run_mode = "scanner".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_empty_watch_list() {
        let mut s = base();
        s.symbols.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_zero_row_caps() {
        let mut s = base();
        s.top_rows = 0;
        assert!(s.validate().is_err());
        let mut s = base();
        s.rows_per_symbol = 0;
        assert!(s.validate().is_err());
    }
}
