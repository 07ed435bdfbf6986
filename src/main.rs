//! CodeVault · terminal dashboard for the problem-tracker API
//!
//! - Fetches problems + stats, filters them locally, deletes / revises through the API
//! - Debounced search box with a persisted recent-search list
//! - Line commands on stdin (`help` lists them); logs on stderr
//!
//! Important env variables:
//!   CODEVAULT_CONFIG_PATH : optional TOML config (see `config::ClientConfig`)
//!   CODEVAULT_API_URL     : default "http://localhost:8000/api"
//!   CODEVAULT_STATE_DIR   : where the token and recent searches live (default ".codevault")
//!   CODEVAULT_DEBOUNCE_MS : search debounce (default 300)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

mod api;
mod app;
mod config;
mod console;
mod dashboard;
mod domain;
mod filter;
mod history;
mod protocol;
mod render;
mod search;
mod session;
mod storage;
mod telemetry;
mod util;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::app::{App, Flow};
use crate::config::ClientConfig;
use crate::console::Command;
use crate::dashboard::Dashboard;
use crate::history::RecentSearches;
use crate::search::{sleep_until_deadline, SearchInput, SearchOptions};
use crate::session::Session;
use crate::storage::{FileStore, KeyValueStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = ClientConfig::load_from_env();

  // Session and recent searches share one local store, read once here.
  let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&cfg.state_dir)?);
  let session = Arc::new(Session::load(store.clone()));
  let api = ApiClient::new(&cfg, session.clone())?;
  info!(target: "codevault", base_url = %api.base_url(), "API client ready");

  let search = SearchInput::new(SearchOptions::from(&cfg), RecentSearches::new(store));
  let (stats_tx, mut stats_rx) = mpsc::channel(8);
  let mut app = App::new(Dashboard::new(api, session), search, stats_tx);

  app.dashboard.load().await;
  println!("{}", render::dashboard(&app.dashboard));
  println!("Type `help` for commands.");

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    let deadline = app.search.next_deadline();
    tokio::select! {
      line = lines.next_line() => {
        let Some(line) = line? else { break };
        if line.trim().is_empty() {
          continue;
        }
        match line.parse::<Command>() {
          Ok(cmd) => match app.handle(cmd, Instant::now()).await {
            Flow::Continue(Some(out)) => println!("{out}"),
            Flow::Continue(None) => {}
            Flow::Quit => break,
          },
          Err(e) => println!("{e}"),
        }
      }
      _ = sleep_until_deadline(deadline) => {
        if let Some(out) = app.on_timer(Instant::now()) {
          println!("{out}");
        }
      }
      Some(result) = stats_rx.recv() => {
        if let Some(out) = app.on_stats(result) {
          println!("{out}");
        }
      }
      _ = tokio::signal::ctrl_c() => {
        warn!(target: "codevault", "Interrupted");
        break;
      }
    }
  }

  app.shutdown();
  info!(target: "codevault", "Bye");
  Ok(())
}
