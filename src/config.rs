//! Client configuration: TOML file (optional) plus environment overrides.
//!
//! See `ClientConfig` for the accepted keys. Every key has a default, so an
//! empty or missing file is valid.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Base url of the REST API, e.g. `http://localhost:8000/api`.
  pub api_url: String,
  pub request_timeout_secs: u64,
  /// Quiet period before a typed search term is applied.
  pub debounce_ms: u64,
  /// How long the recent-search list stays up after the search box loses focus.
  pub blur_grace_ms: u64,
  pub show_recent_searches: bool,
  /// Where the token and recent searches are kept.
  pub state_dir: PathBuf,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      api_url: "http://localhost:8000/api".into(),
      request_timeout_secs: 20,
      debounce_ms: 300,
      blur_grace_ms: 200,
      show_recent_searches: true,
      state_dir: PathBuf::from(".codevault"),
    }
  }
}

impl ClientConfig {
  /// Read CODEVAULT_CONFIG_PATH (if set), then apply env overrides.
  pub fn load_from_env() -> Self {
    let mut cfg = match std::env::var("CODEVAULT_CONFIG_PATH") {
      Ok(path) => load_file(&path).unwrap_or_default(),
      Err(_) => ClientConfig::default(),
    };
    cfg.apply_overrides(|key| std::env::var(key).ok());
    info!(target: "codevault", api_url = %cfg.api_url, state_dir = %cfg.state_dir.display(), debounce_ms = cfg.debounce_ms, "Configuration loaded");
    cfg
  }

  fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("CODEVAULT_API_URL") {
      self.api_url = url;
    }
    if let Some(dir) = lookup("CODEVAULT_STATE_DIR") {
      self.state_dir = PathBuf::from(dir);
    }
    if let Some(raw) = lookup("CODEVAULT_DEBOUNCE_MS") {
      match raw.parse() {
        Ok(ms) => self.debounce_ms = ms,
        Err(e) => warn!(target: "codevault", value = %raw, error = %e, "Invalid CODEVAULT_DEBOUNCE_MS; keeping {}", self.debounce_ms),
      }
    }
  }
}

/// On any IO/parse error, logs and returns None.
fn load_file(path: &str) -> Option<ClientConfig> {
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<ClientConfig>(&s) {
      Ok(cfg) => {
        info!(target: "codevault", %path, "Loaded client config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "codevault", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "codevault", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
