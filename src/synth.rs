use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::quotes::{meta_symbol, SERIES_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsAlert {
    Positive,
    Negative,
}

impl NewsAlert {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsAlert::Positive => "Positive",
            NewsAlert::Negative => "Negative",
        }
    }
}

/// One screener row. Price and volume come from the provider bar; the other
/// columns are mock values with no relation to real market state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRow {
    pub symbol: String,
    pub price: f64,
    pub gap_percent: f64,
    pub float_m: f64,
    pub relative_volume: f64,
    pub volume: u64,
    pub news_alert: NewsAlert,
    pub spread: f64,
    pub easy_to_borrow: bool,
    pub short_interest: f64,
    pub short_borrow_rate: f64,
    pub halt_levels: f64,
}

/// Shape one provider body into rows, at most `cap` of them. An absent or
/// malformed body yields nothing. Entries whose open/volume fields don't
/// parse are skipped so every emitted row carries real numbers.
pub fn synthesize(body: Option<&JsonValue>, cap: usize, rng: &mut impl Rng) -> Vec<StockRow> {
    let mut rows = Vec::new();

    let Some(body) = body else {
        return rows;
    };
    let Some(series) = body.get(SERIES_KEY).and_then(|v| v.as_object()) else {
        log::warn!("synth.skip body without series key");
        return rows;
    };
    let Some(symbol) = meta_symbol(body) else {
        log::warn!("synth.skip body without meta symbol");
        return rows;
    };

    for (ts, fields) in series {
        if rows.len() >= cap {
            break;
        }
        let Some(price) = fields.get("1. open").and_then(field_f64) else {
            log::debug!("synth.entry.skip symbol={} ts={} bad open", symbol, ts);
            continue;
        };
        let Some(volume) = fields.get("5. volume").and_then(field_u64) else {
            log::debug!("synth.entry.skip symbol={} ts={} bad volume", symbol, ts);
            continue;
        };

        rows.push(StockRow {
            symbol: symbol.to_string(),
            price,
            gap_percent: rng.random_range(-5.0..5.0),
            float_m: rng.random_range(0.0..500.0),
            relative_volume: rng.random_range(0.0..1000.0),
            volume,
            news_alert: if rng.random_bool(0.5) {
                NewsAlert::Positive
            } else {
                NewsAlert::Negative
            },
            spread: rng.random_range(0.0..5.0),
            easy_to_borrow: rng.random_bool(0.5),
            short_interest: rng.random_range(0.0..50.0),
            short_borrow_rate: rng.random_range(0.0..10.0),
            halt_levels: rng.random_range(0.0..5.0),
        });
    }

    rows
}

fn field_f64(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        JsonValue::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn field_u64(v: &JsonValue) -> Option<u64> {
    match v {
        JsonValue::String(s) => s.trim().parse::<u64>().ok(),
        JsonValue::Number(n) => n.as_u64(),
        _ => None,
    }
}
