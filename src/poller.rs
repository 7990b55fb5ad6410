use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::quotes::QuoteClient;
use crate::screener::{rank, BoardState};
use crate::synth;
use crate::utils::now_ts;

pub const FETCH_FAILED_BANNER: &str = "Failed to fetch stock data. Please try again later.";

/// Mock-field RNG: pinned by MOCK_SEED for reproducible boards, entropy
/// otherwise.
pub fn seed_rng(settings: &Settings) -> SmallRng {
    match settings.mock_seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::seed_from_u64(rand::random()),
    }
}

/// One full poll: fetch each symbol in turn (one round trip completes before
/// the next begins), shape rows, rank, publish. A failed symbol contributes
/// nothing; the banner only comes up when the whole pass produced no rows.
pub async fn poll_once(
    settings: &Settings,
    quotes: &QuoteClient,
    board: &BoardState,
    rng: &mut SmallRng,
) {
    let started = now_ts();
    board.clear_error();

    let mut all_rows = Vec::new();
    let mut symbols_ok = 0usize;
    for symbol in &settings.symbols {
        let body = quotes.fetch_intraday(symbol).await;
        if body.is_some() {
            symbols_ok += 1;
        }
        all_rows.extend(synth::synthesize(body.as_ref(), settings.rows_per_symbol, rng));
    }

    let ranked = rank(all_rows, settings.top_rows);
    if ranked.is_empty() {
        board.set_error(FETCH_FAILED_BANNER);
    }

    log::info!(
        "poll.done rows={} symbols_ok={}/{} elapsed_ms={:.0}",
        ranked.len(),
        symbols_ok,
        settings.symbols.len(),
        (now_ts() - started) * 1000.0
    );
    board.publish(ranked);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    Idle,
    Polling,
}

/// Owns the single repeating timer. Re-arming always drops the previous
/// timer first, so there is never more than one. Only the timer is
/// cancelled; a poll already in flight completes and publishes, and the
/// board's last writer wins.
pub struct PollController {
    settings: Settings,
    quotes: QuoteClient,
    board: BoardState,
    timer: Option<JoinHandle<()>>,
}

impl PollController {
    pub fn new(settings: Settings, quotes: QuoteClient, board: BoardState) -> Self {
        Self {
            settings,
            quotes,
            board,
            timer: None,
        }
    }

    pub fn mode(&self) -> PollMode {
        match &self.timer {
            Some(h) if !h.is_finished() => PollMode::Polling,
            _ => PollMode::Idle,
        }
    }

    /// "Fetch once": back to idle, then a single untimed pass.
    pub fn fetch_once(&mut self) {
        self.disarm();
        let settings = self.settings.clone();
        let quotes = self.quotes.clone();
        let board = self.board.clone();
        let mut rng = seed_rng(&self.settings);
        tokio::spawn(async move {
            poll_once(&settings, &quotes, &board, &mut rng).await;
        });
    }

    /// "Fetch repeatedly": poll now and every refresh period until stopped
    /// or re-armed.
    pub fn start_interval(&mut self) {
        self.disarm();
        let settings = self.settings.clone();
        let quotes = self.quotes.clone();
        let board = self.board.clone();
        let mut rng = seed_rng(&self.settings);
        let period = std::time::Duration::from_secs(settings.refresh_secs);
        self.timer = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                poll_once(&settings, &quotes, &board, &mut rng).await;
            }
        }));
        log::info!("poll.timer.armed period_secs={}", self.settings.refresh_secs);
    }

    pub fn stop(&mut self) {
        self.disarm();
    }

    fn disarm(&mut self) {
        if let Some(h) = self.timer.take() {
            h.abort();
            log::info!("poll.timer.cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings {
            run_mode: "serve".into(),
            api_key: "KEY".into(),
            // Nothing listens here; fetches fail fast and the poll publishes
            // an empty board, which is all these tests need.
            quotes_base_url: "http://127.0.0.1:9".into(),
            trade_sink_url: "http://127.0.0.1:9/posts".into(),
            symbols: vec!["AAPL".into()],
            refresh_secs: 1200,
            rows_per_symbol: 10,
            top_rows: 10,
            mock_seed: Some(1),
            http_timeout_secs: 1,
            poll_on_start: false,
            dashboard_enabled: false,
            dashboard_host: "127.0.0.1".into(),
            dashboard_port: 0,
            dashboard_open_browser: false,
        }
    }

    fn controller() -> PollController {
        let settings = test_settings();
        let quotes = QuoteClient::new(&settings).unwrap();
        PollController::new(settings, quotes, BoardState::new())
    }

    #[tokio::test]
    async fn rearming_cancels_the_previous_timer() {
        let mut ctl = controller();
        ctl.start_interval();
        let first = ctl.timer.as_ref().unwrap().abort_handle();

        ctl.start_interval();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        assert!(first.is_finished());
        assert_eq!(ctl.mode(), PollMode::Polling);

        ctl.stop();
        assert_eq!(ctl.mode(), PollMode::Idle);
    }

    #[tokio::test]
    async fn fetch_once_returns_the_controller_to_idle() {
        let mut ctl = controller();
        ctl.start_interval();
        assert_eq!(ctl.mode(), PollMode::Polling);

        ctl.fetch_once();
        assert_eq!(ctl.mode(), PollMode::Idle);
    }

    #[tokio::test]
    async fn stop_without_a_timer_is_a_no_op() {
        let mut ctl = controller();
        ctl.stop();
        assert_eq!(ctl.mode(), PollMode::Idle);
    }
}
