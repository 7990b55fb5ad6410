use std::sync::Arc;

use parking_lot::RwLock;

use crate::synth::StockRow;
use crate::utils::now_ts;

/// Merge per-symbol rows into the board: biggest synthesized gap first,
/// truncated to the top slots. The ordering is a display convenience only.
pub fn rank(mut rows: Vec<StockRow>, top: usize) -> Vec<StockRow> {
    rows.sort_by(|a, b| {
        b.gap_percent
            .partial_cmp(&a.gap_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.truncate(top);
    rows
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    pub rows: Vec<StockRow>,
    pub updated_ts: f64,
    pub error: Option<String>,
}

/// The latest ranked rows plus the fetch-error banner, shared between the
/// poll tasks and the dashboard. Replaced wholesale each poll; whoever
/// publishes last wins.
#[derive(Clone, Default)]
pub struct BoardState {
    inner: Arc<RwLock<Board>>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, rows: Vec<StockRow>) {
        let mut b = self.inner.write();
        b.rows = rows;
        b.updated_ts = now_ts();
    }

    pub fn set_error(&self, message: &str) {
        self.inner.write().error = Some(message.to_string());
    }

    pub fn clear_error(&self) {
        self.inner.write().error = None;
    }

    pub fn snapshot(&self) -> Board {
        self.inner.read().clone()
    }
}
