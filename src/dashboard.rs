use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;

use crate::config::Settings;
use crate::poller::PollController;
use crate::render;
use crate::screener::BoardState;
use crate::trader::{Side, StatusTray, TradeNotifier};
use crate::utils::now_ts;

#[derive(Clone)]
pub struct DashboardState {
    pub settings: Settings,
    pub board: BoardState,
    pub status: StatusTray,
    pub controller: Arc<Mutex<PollController>>,
    pub notifier: TradeNotifier,
}

pub async fn serve_dashboard(state: DashboardState) -> Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        state.settings.dashboard_host, state.settings.dashboard_port
    )
    .parse()
    .context("dashboard addr parse")?;

    let app = Router::new()
        .route("/", get(index))
        .route("/api/board", get(api_board))
        .route("/api/status", get(api_status))
        .route("/api/fetch_once", post(api_fetch_once))
        .route("/api/poll/start", post(api_poll_start))
        .route("/api/poll/stop", post(api_poll_stop))
        .route("/api/trade", post(api_trade))
        .with_state(state);

    log::info!("dashboard.start url=http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(st): State<DashboardState>) -> impl IntoResponse {
    let every_label = if st.settings.refresh_secs % 60 == 0 {
        format!("Fetch every {} min", st.settings.refresh_secs / 60)
    } else {
        format!("Fetch every {} s", st.settings.refresh_secs)
    };
    Html(render_index_html(
        &st.settings.dashboard_host,
        st.settings.dashboard_port,
        &st.settings.symbols.join(", "),
        &every_label,
    ))
}

async fn api_board(State(st): State<DashboardState>) -> impl IntoResponse {
    let b = st.board.snapshot();
    let rows: Vec<render::DisplayRow> = b.rows.iter().map(render::display_row).collect();
    let mode = st.controller.lock().mode();
    Json(json!({
        "ts": now_ts(),
        "updated_ts": b.updated_ts,
        "error": b.error,
        "mode": mode,
        "rows": rows,
    }))
}

async fn api_status(State(st): State<DashboardState>) -> impl IntoResponse {
    Json(json!({ "ts": now_ts(), "status": st.status.snapshot() }))
}

async fn api_fetch_once(State(st): State<DashboardState>) -> impl IntoResponse {
    st.controller.lock().fetch_once();
    Json(json!({ "ok": true }))
}

async fn api_poll_start(State(st): State<DashboardState>) -> impl IntoResponse {
    st.controller.lock().start_interval();
    Json(json!({ "ok": true, "mode": "polling" }))
}

async fn api_poll_stop(State(st): State<DashboardState>) -> impl IntoResponse {
    st.controller.lock().stop();
    Json(json!({ "ok": true, "mode": "idle" }))
}

#[derive(Debug, Deserialize)]
struct TradeReq {
    action: Side,
    symbol: String,
    price: f64,
}

/// The page posts back the row snapshot it rendered, so a click submits what
/// was on screen even if the board has re-ranked since.
async fn api_trade(
    State(st): State<DashboardState>,
    Json(req): Json<TradeReq>,
) -> impl IntoResponse {
    st.notifier.submit(req.action, &req.symbol, req.price).await;
    Json(json!({ "ok": true, "status": st.status.snapshot() }))
}

fn render_index_html(host: &str, port: u16, symbols: &str, every_label: &str) -> String {
    // Single-file UI, no build step.
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>gapboard • Gap Screener</title>
    <style>
      :root {{
        --bg: #0b1220;
        --panel: rgba(255,255,255,0.06);
        --stroke: rgba(255,255,255,0.12);
        --text: rgba(255,255,255,0.92);
        --muted: rgba(255,255,255,0.65);
        --good: #33d17a;
        --bad: #ff4d4d;
        --brand: #7c5cff;
        --brand2: #3dd6d0;
      }}
      * {{ box-sizing: border-box; }}
      body {{
        margin: 0;
        font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial;
        color: var(--text);
        background: radial-gradient(1200px 900px at 15% 10%, rgba(124,92,255,0.20), transparent 60%),
                    radial-gradient(1100px 800px at 90% 20%, rgba(61,214,208,0.16), transparent 55%),
                    var(--bg);
      }}
      .wrap {{ max-width: 1280px; margin: 0 auto; padding: 22px 18px 42px; }}
      .topbar {{
        display: flex; align-items: center; justify-content: space-between; gap: 12px;
        padding: 16px 16px; border: 1px solid var(--stroke); border-radius: 16px;
        background: linear-gradient(180deg, rgba(255,255,255,0.06), rgba(255,255,255,0.03));
        backdrop-filter: blur(10px);
      }}
      .brand {{ display: flex; align-items: center; gap: 12px; }}
      .logo {{
        width: 42px; height: 42px; border-radius: 12px;
        background: conic-gradient(from 180deg, var(--brand), var(--brand2), var(--brand));
      }}
      .title {{ font-weight: 800; letter-spacing: 0.2px; }}
      .subtitle {{ color: var(--muted); font-size: 12px; margin-top: 2px; }}
      .chips {{ display: flex; flex-wrap: wrap; gap: 8px; justify-content: flex-end; }}
      .chip {{
        padding: 7px 10px; border-radius: 999px; border: 1px solid var(--stroke);
        background: rgba(255,255,255,0.04); font-size: 12px; color: var(--muted);
        white-space: nowrap;
      }}
      .chip b {{ color: var(--text); font-weight: 700; }}
      .btn {{
        cursor: pointer; padding: 8px 10px; border-radius: 10px;
        border: 1px solid rgba(255,255,255,0.12); background: rgba(255,255,255,0.05);
        color: var(--text); font-weight: 700; font-size: 12px;
      }}
      .btn:hover {{ background: rgba(255,255,255,0.08); }}
      .card {{
        border: 1px solid var(--stroke); border-radius: 16px; background: var(--panel);
        backdrop-filter: blur(10px); overflow: hidden; margin-top: 14px;
      }}
      .card .hd {{
        display: flex; align-items: center; justify-content: space-between; gap: 10px;
        padding: 12px 14px; border-bottom: 1px solid rgba(255,255,255,0.08);
        background: rgba(255,255,255,0.03); font-weight: 800;
      }}
      .card .bd {{ padding: 12px 14px; overflow-x: auto; }}
      .pill {{ font-size: 12px; color: var(--muted); border: 1px solid var(--stroke); padding: 3px 8px; border-radius: 999px; }}
      table {{ width: 100%; border-collapse: collapse; }}
      th, td {{ padding: 9px 8px; border-bottom: 1px solid rgba(255,255,255,0.07); white-space: nowrap; }}
      th {{ text-align: left; color: var(--muted); font-size: 12px; font-weight: 700; }}
      td {{ font-size: 13px; }}
      tr.subdollar td {{ background: rgba(200,200,200,0.22); }}
      tr.momentum td {{ font-weight: 800; }}
      .banner {{
        margin-top: 12px; padding: 10px 12px; border-radius: 14px;
        border: 1px solid rgba(255,255,255,0.14); background: rgba(255, 77, 77, 0.10);
        display: none;
      }}
      #statusDiv {{ margin-top: 12px; font-size: 13px; min-height: 18px; }}
      #statusDiv.success {{ color: var(--good); }}
      #statusDiv.error {{ color: var(--bad); }}
      .small {{ font-size: 12px; color: var(--muted); }}
    </style>
  </head>
  <body>
    <div class="wrap">
      <div class="topbar">
        <div class="brand">
          <div class="logo"></div>
          <div>
            <div class="title">gapboard • Gap Screener</div>
            <div class="subtitle">Local: <b>{host}:{port}</b> • watching: {symbols}</div>
          </div>
        </div>
        <div class="chips">
          <div class="chip">Poll: <b id="pollChip">--</b></div>
          <div class="chip">Updated: <b id="updatedChip">--</b></div>
          <div class="chip">Status: <b id="statusText">starting…</b></div>
          <button class="btn" id="fetchOnceBtn">Fetch once</button>
          <button class="btn" id="fetchEveryBtn">{every_label}</button>
          <button class="btn" id="stopBtn">Stop</button>
        </div>
      </div>

      <div class="banner" id="errBanner">
        <div style="font-weight:850;">Fetch problem</div>
        <div class="small" id="errBannerMsg">--</div>
      </div>

      <div id="statusDiv"></div>

      <div class="card">
        <div class="hd">
          <div>Top gappers <span class="pill" id="rowCount">0 rows</span></div>
        </div>
        <div class="bd">
          <table>
            <thead>
              <tr>
                <th>Symbol</th><th>Gap %</th><th>Price</th><th>Float</th><th>Rel Vol</th>
                <th>Volume</th><th>News</th><th>Spread</th><th>ETB</th><th>Short Int</th>
                <th>Borrow %</th><th>Halt Lvls</th><th></th><th></th>
              </tr>
            </thead>
            <tbody id="stockRows"></tbody>
          </table>
        </div>
      </div>

      <div class="small" style="margin-top: 14px;">
        Prices and volume come from the quotes API; every other column is simulated.
        Buy/Sell post to a throwaway test endpoint.
      </div>
    </div>

    <script>
      async function getJson(path) {{
        const r = await fetch(path);
        if (!r.ok) throw new Error(`${{path}}: ${{r.status}}`);
        return r.json();
      }}

      async function post(path, body) {{
        const r = await fetch(path, {{
          method: "POST",
          headers: {{ "Content-Type": "application/json" }},
          body: body ? JSON.stringify(body) : null,
        }});
        if (!r.ok) throw new Error(`${{path}}: ${{r.status}}`);
        return r.json();
      }}

      function escapeHtml(s) {{
        return String(s).replace(/[&<>"']/g, (c) => ({{
          "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#39;",
        }}[c]));
      }}

      function fmtAgo(ts) {{
        if (!ts) return "--";
        const secs = Math.max(0, Date.now() / 1000 - Number(ts));
        if (secs < 60) return `${{Math.round(secs)}}s ago`;
        if (secs < 3600) return `${{Math.round(secs / 60)}}m ago`;
        return `${{Math.round(secs / 3600)}}h ago`;
      }}

      function setStatus(ok, text) {{
        document.getElementById("statusText").textContent = text;
      }}

      async function postTrade(action, r) {{
        try {{
          await post("/api/trade", {{ action, symbol: r.symbol, price: r.raw_price }});
        }} catch (e) {{
          // The status line below the table reflects sink failures; this
          // only fires when the local service itself is unreachable.
        }}
        await refreshStatus();
      }}

      function renderBoard(board) {{
        const banner = document.getElementById("errBanner");
        if (board.error) {{
          document.getElementById("errBannerMsg").textContent = board.error;
          banner.style.display = "block";
        }} else {{
          banner.style.display = "none";
        }}

        document.getElementById("pollChip").textContent = board.mode || "--";
        document.getElementById("updatedChip").textContent = fmtAgo(board.updated_ts);
        document.getElementById("rowCount").textContent = `${{board.rows.length}} rows`;

        const tb = document.getElementById("stockRows");
        tb.innerHTML = "";
        for (const r of board.rows) {{
          const tr = document.createElement("tr");
          if (r.style === "sub_dollar") tr.className = "subdollar";
          else if (r.style === "momentum") tr.className = "momentum";
          tr.innerHTML = `
            <td><b>${{escapeHtml(r.symbol)}}</b></td>
            <td>${{escapeHtml(r.gap_percent)}}</td>
            <td>${{escapeHtml(r.price)}}</td>
            <td>${{escapeHtml(r.float_m)}}</td>
            <td>${{escapeHtml(r.relative_volume)}}</td>
            <td>${{escapeHtml(r.volume)}}</td>
            <td>${{escapeHtml(r.news_alert)}}</td>
            <td>${{escapeHtml(r.spread)}}</td>
            <td>${{escapeHtml(r.easy_to_borrow)}}</td>
            <td>${{escapeHtml(r.short_interest)}}</td>
            <td>${{escapeHtml(r.short_borrow_rate)}}</td>
            <td>${{escapeHtml(r.halt_levels)}}</td>
            <td><button class="btn buy">Buy 1</button></td>
            <td><button class="btn sell">Sell 1</button></td>
          `;
          tr.querySelector(".buy").addEventListener("click", () => postTrade("buy", r));
          tr.querySelector(".sell").addEventListener("click", () => postTrade("sell", r));
          tb.appendChild(tr);
        }}
      }}

      function renderStatus(payload) {{
        const div = document.getElementById("statusDiv");
        const s = payload && payload.status;
        div.textContent = s ? s.message : "";
        div.className = s ? s.kind : "";
      }}

      async function refreshStatus() {{
        try {{
          renderStatus(await getJson("/api/status"));
        }} catch (e) {{
          setStatus(false, "disconnected");
        }}
      }}

      async function refresh() {{
        try {{
          const [board, status] = await Promise.all([
            getJson("/api/board"),
            getJson("/api/status"),
          ]);
          setStatus(true, "live");
          renderBoard(board);
          renderStatus(status);
        }} catch (e) {{
          setStatus(false, "disconnected");
        }}
      }}

      document.getElementById("fetchOnceBtn").addEventListener("click", async () => {{
        try {{ await post("/api/fetch_once"); }} catch (e) {{}}
        await refresh();
      }});
      document.getElementById("fetchEveryBtn").addEventListener("click", async () => {{
        try {{ await post("/api/poll/start"); }} catch (e) {{}}
        await refresh();
      }});
      document.getElementById("stopBtn").addEventListener("click", async () => {{
        try {{ await post("/api/poll/stop"); }} catch (e) {{}}
        await refresh();
      }});

      refresh();
      setInterval(refresh, 1500);
    </script>
  </body>
</html>"#,
        host = host,
        port = port,
        symbols = symbols,
        every_label = every_label
    )
}
