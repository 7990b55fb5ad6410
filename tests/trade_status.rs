//! Trade notifier behavior against a mocked sink endpoint.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gapboard::config::Settings;
use gapboard::trader::{Side, StatusTray, TradeNotifier};

fn test_settings(sink_url: &str) -> Settings {
    Settings {
        run_mode: "serve".into(),
        api_key: "TESTKEY".into(),
        quotes_base_url: "http://127.0.0.1:9".into(),
        trade_sink_url: sink_url.to_string(),
        symbols: vec!["AAPL".into()],
        refresh_secs: 1200,
        rows_per_symbol: 10,
        top_rows: 10,
        mock_seed: None,
        http_timeout_secs: 2,
        poll_on_start: false,
        dashboard_enabled: false,
        dashboard_host: "127.0.0.1".into(),
        dashboard_port: 0,
        dashboard_open_browser: false,
    }
}

#[tokio::test]
async fn buy_posts_total_cost_and_reports_the_echoed_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_partial_json(json!({
            "symbol": "AAPL",
            "price": 12.34,
            "qty": 1,
            "totalCost": 12.34,
            "action": "buy",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 101 })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = test_settings(&format!("{}/posts", server.uri()));
    let tray = StatusTray::new();
    let notifier = TradeNotifier::new(&settings, tray.clone()).unwrap();

    notifier.submit(Side::Buy, "AAPL", 12.34).await;

    let status = tray.snapshot().expect("status line set");
    assert_eq!(status.kind, "success");
    assert_eq!(
        status.message,
        "Success: Bought 1 share of AAPL at $12.34. Response ID: 101"
    );
}

#[tokio::test]
async fn sell_posts_total_earned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_partial_json(json!({
            "symbol": "TSLA",
            "totalEarned": 5.5,
            "action": "sell",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = test_settings(&format!("{}/posts", server.uri()));
    let tray = StatusTray::new();
    let notifier = TradeNotifier::new(&settings, tray.clone()).unwrap();

    notifier.submit(Side::Sell, "TSLA", 5.5).await;

    let status = tray.snapshot().expect("status line set");
    assert_eq!(status.kind, "success");
    assert_eq!(
        status.message,
        "Success: Sold 1 share of TSLA at $5.50. Response ID: 7"
    );
}

#[tokio::test]
async fn sink_failure_writes_the_generic_error_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let settings = test_settings(&format!("{}/posts", server.uri()));
    let tray = StatusTray::new();
    let notifier = TradeNotifier::new(&settings, tray.clone()).unwrap();

    notifier.submit(Side::Sell, "AAPL", 3.21).await;

    let status = tray.snapshot().expect("status line set");
    assert_eq!(status.kind, "error");
    assert!(status.message.contains("Error: Failed to"));
    assert_eq!(status.message, "Error: Failed to sell 1 share of AAPL.");
}

#[tokio::test]
async fn unreachable_sink_also_collapses_to_the_generic_error() {
    // Nothing listening at all (connection refused, not HTTP failure).
    let settings = test_settings("http://127.0.0.1:9/posts");
    let tray = StatusTray::new();
    let notifier = TradeNotifier::new(&settings, tray.clone()).unwrap();

    notifier.submit(Side::Buy, "NVDA", 900.0).await;

    let status = tray.snapshot().expect("status line set");
    assert_eq!(status.kind, "error");
    assert_eq!(status.message, "Error: Failed to buy 1 share of NVDA.");
}
