use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;

use gapboard::{
    config::Settings,
    dashboard::{self, DashboardState},
    poller::{self, PollController},
    quotes::QuoteClient,
    render,
    screener::BoardState,
    trader::{StatusTray, TradeNotifier},
};

#[derive(Debug, Parser)]
#[command(name = "gapboard", version)]
struct Cli {
    /// Override RUN_MODE (serve|once)
    #[arg(long)]
    mode: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(m) = cli.mode {
        settings.run_mode = m.to_lowercase();
        settings.validate()?;
    }

    log::info!(
        "app.start run_mode={} symbols={} refresh_secs={}",
        settings.run_mode,
        settings.symbols.len(),
        settings.refresh_secs
    );

    let board = BoardState::new();
    let quotes = QuoteClient::new(&settings)?;

    // Headless check: one poll, log the board, done.
    if settings.run_mode == "once" {
        let mut rng = poller::seed_rng(&settings);
        poller::poll_once(&settings, &quotes, &board, &mut rng).await;
        for d in board.snapshot().rows.iter().map(render::display_row) {
            log::info!(
                "row symbol={} gap={} price={} float={} rvol={} vol={} news={} style={:?}",
                d.symbol,
                d.gap_percent,
                d.price,
                d.float_m,
                d.relative_volume,
                d.volume,
                d.news_alert,
                d.style
            );
        }
        return Ok(());
    }

    let status = StatusTray::new();
    let notifier = TradeNotifier::new(&settings, status.clone())?;
    let controller = Arc::new(Mutex::new(PollController::new(
        settings.clone(),
        quotes.clone(),
        board.clone(),
    )));

    if settings.poll_on_start {
        controller.lock().start_interval();
    }

    if settings.dashboard_enabled {
        let state = DashboardState {
            settings: settings.clone(),
            board: board.clone(),
            status: status.clone(),
            controller: controller.clone(),
            notifier: notifier.clone(),
        };
        let url = format!(
            "http://{}:{}/",
            settings.dashboard_host, settings.dashboard_port
        );
        tokio::spawn(async move {
            if let Err(e) = dashboard::serve_dashboard(state).await {
                log::error!("dashboard.error {}", e);
            }
        });

        if settings.dashboard_open_browser {
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(650)).await;
                let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
            });
        }
    }

    tokio::signal::ctrl_c().await?;
    log::info!("app.shutdown");
    Ok(())
}
