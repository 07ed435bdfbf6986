//! Process-wide session: the bearer token, read once at startup and cleared on logout.

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::storage::KeyValueStore;

const TOKEN_KEY: &str = "token";

pub struct Session {
  store: Arc<dyn KeyValueStore>,
  token: RwLock<Option<String>>,
}

impl Session {
  pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
    let token = store.get(TOKEN_KEY).filter(|t| !t.is_empty());
    info!(target: "codevault", authenticated = token.is_some(), "Session loaded");
    Self { store, token: RwLock::new(token) }
  }

  pub fn token(&self) -> Option<String> {
    self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
  }

  #[cfg(test)]
  pub fn is_authenticated(&self) -> bool {
    self.token().is_some()
  }

  pub fn set_token(&self, token: String) {
    if let Err(e) = self.store.set(TOKEN_KEY, &token) {
      warn!(target: "storage", error = %e, "Failed to persist session token");
    }
    *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
  }

  pub fn logout(&self) {
    if let Err(e) = self.store.remove(TOKEN_KEY) {
      warn!(target: "storage", error = %e, "Failed to remove session token");
    }
    *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    info!(target: "codevault", "Session cleared");
  }
}
