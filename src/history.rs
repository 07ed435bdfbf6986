//! Recent searches, persisted as a JSON array under one storage key.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::storage::KeyValueStore;

pub const RECENT_SEARCHES_KEY: &str = "recentSearches";
pub const MAX_RECENT_SEARCHES: usize = 5;

#[derive(Clone)]
pub struct RecentSearches {
  store: Arc<dyn KeyValueStore>,
}

impl RecentSearches {
  pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
    Self { store }
  }

  /// Stored terms, most recent first. Missing or unreadable data is an empty list.
  pub fn list(&self) -> Vec<String> {
    let Some(raw) = self.store.get(RECENT_SEARCHES_KEY) else {
      return Vec::new();
    };
    serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
      warn!(target: "storage", error = %e, "Failed to parse recent searches; ignoring");
      Vec::new()
    })
  }

  /// Move `term` to the front, dropping an older exact duplicate, and keep at most five.
  pub fn record(&self, term: &str) -> Vec<String> {
    if term.trim().is_empty() {
      return self.list();
    }
    let mut terms = self.list();
    terms.retain(|t| t != term);
    terms.insert(0, term.to_string());
    terms.truncate(MAX_RECENT_SEARCHES);

    match serde_json::to_string(&terms) {
      Ok(body) => {
        if let Err(e) = self.store.set(RECENT_SEARCHES_KEY, &body) {
          warn!(target: "storage", error = %e, "Failed to persist recent searches");
        }
      }
      Err(e) => warn!(target: "storage", error = %e, "Failed to encode recent searches"),
    }
    debug!(target: "search", count = terms.len(), "Recorded recent search");
    terms
  }

  pub fn clear(&self) {
    if let Err(e) = self.store.remove(RECENT_SEARCHES_KEY) {
      warn!(target: "storage", error = %e, "Failed to clear recent searches");
    }
  }
}
