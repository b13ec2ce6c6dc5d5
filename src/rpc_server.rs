//! learnshelf RPC Server: JSON-RPC over stdin/stdout for desktop-shell integration.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"materials.open", "params":{"id":"42"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Each request runs on its own task, so responses may arrive out of request
//! order; clients match them by `id`.
//!
//! Logs go to stderr; stdout carries protocol lines only.

use std::sync::Arc;
use std::time::Instant;

use learnshelf::app::App;
use learnshelf::rpc_handler::handle_method;
use learnshelf::services::session_store::SessionStoreTrait;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// Stdout shared by request tasks; one line is written per lock.
type SharedStdout = Arc<Mutex<Stdout>>;

async fn send_line(stdout: &SharedStdout, value: &Value) -> io::Result<()> {
    let mut out = stdout.lock().await;
    out.write_all(format!("{}\n", value).as_bytes()).await?;
    out.flush().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var("LEARNSHELF_CONFIG").ok();
    let app = App::new(config_path).map_err(|e| {
        error!(error = %e, "failed to initialize learnshelf");
        e
    })?;
    if let Ok(token) = std::env::var("LEARNSHELF_AUTH_TOKEN") {
        app.session.login(&token);
        app.startup().await;
    }
    let app = Arc::new(Mutex::new(app));

    let stdout: SharedStdout = Arc::new(Mutex::new(io::stdout()));
    send_line(&stdout, &json!({"event":"ready","version":env!("CARGO_PKG_VERSION")})).await?;
    info!("rpc server ready");

    // Max 200 RPC requests per second.
    let mut rate_limiter = RateLimiter::new(200);
    let mut in_flight = JoinSet::new();

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        // Reap finished tasks so the set does not grow with the session.
        while in_flight.try_join_next().is_some() {}

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                send_line(&stdout, &json!({"id":null,"error":format!("parse error: {}", e)})).await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            send_line(&stdout, &json!({"id": id, "error": "rate limit exceeded"})).await?;
            continue;
        }

        let method = req
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let app = app.clone();
        let stdout = stdout.clone();
        in_flight.spawn(async move {
            debug!(%method, "request started");
            let response = match handle_method(&app, &method, &params).await {
                Ok(val) => json!({"id": id, "result": val}),
                Err(err) => json!({"id": id, "error": err}),
            };
            if let Err(e) = send_line(&stdout, &response).await {
                error!(error = %e, %method, "failed to write response");
            }
        });
    }

    info!(pending = in_flight.len(), "stdin closed, waiting for in-flight requests");
    while in_flight.join_next().await.is_some() {}

    app.lock().await.shutdown();
    Ok(())
}
