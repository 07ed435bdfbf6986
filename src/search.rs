//! Debounced search box.
//!
//! `SearchInput` is a plain state machine fed with explicit instants, so the
//! event loop owns all waiting: it sleeps until `next_deadline()` and then calls
//! `poll()`. Keystrokes go through `input`, Enter through `submit`; both end in
//! the same commit path and `submit` drops the pending timer, so a single
//! keystroke can never be committed twice.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::history::RecentSearches;

#[derive(Clone, Copy, Debug)]
pub struct SearchOptions {
  pub debounce: Duration,
  pub blur_grace: Duration,
  pub show_recent_searches: bool,
}

impl Default for SearchOptions {
  fn default() -> Self {
    Self {
      debounce: Duration::from_millis(300),
      blur_grace: Duration::from_millis(200),
      show_recent_searches: true,
    }
  }
}

impl From<&ClientConfig> for SearchOptions {
  fn from(cfg: &ClientConfig) -> Self {
    Self {
      debounce: Duration::from_millis(cfg.debounce_ms),
      blur_grace: Duration::from_millis(cfg.blur_grace_ms),
      show_recent_searches: cfg.show_recent_searches,
    }
  }
}

struct PendingCommit {
  deadline: Instant,
  term: String,
}

pub struct SearchInput {
  opts: SearchOptions,
  history: RecentSearches,
  text: String,
  pending: Option<PendingCommit>,
  recent_visible: bool,
  hide_at: Option<Instant>,
  disposed: bool,
}

impl SearchInput {
  pub fn new(opts: SearchOptions, history: RecentSearches) -> Self {
    Self {
      opts,
      history,
      text: String::new(),
      pending: None,
      recent_visible: false,
      hide_at: None,
      disposed: false,
    }
  }

  #[cfg(test)]
  pub fn text(&self) -> &str {
    &self.text
  }

  #[cfg(test)]
  pub fn recent_visible(&self) -> bool {
    self.recent_visible
  }

  #[cfg(test)]
  pub fn has_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// A keystroke: replaces whatever commit was pending.
  #[instrument(level = "debug", skip(self, text), fields(text_len = text.len()))]
  pub fn input(&mut self, text: &str, now: Instant) {
    if self.disposed {
      return;
    }
    self.text = text.to_string();
    self.pending = Some(PendingCommit {
      deadline: now + self.opts.debounce,
      term: self.text.clone(),
    });
  }

  /// Earliest armed timer (debounced commit or delayed hide).
  pub fn next_deadline(&self) -> Option<Instant> {
    let commit = self.pending.as_ref().map(|p| p.deadline);
    match (commit, self.hide_at) {
      (Some(a), Some(b)) => Some(a.min(b)),
      (a, b) => a.or(b),
    }
  }

  /// Fire due timers. Returns the committed term when the debounce elapsed.
  pub fn poll(&mut self, now: Instant) -> Option<String> {
    if self.disposed {
      return None;
    }
    if self.hide_at.is_some_and(|t| t <= now) {
      self.hide_at = None;
      self.recent_visible = false;
    }
    if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
      let term = self.pending.take().map(|p| p.term).unwrap_or_default();
      return Some(self.commit(term));
    }
    None
  }

  /// Enter: commit now, and remember the term.
  #[instrument(level = "debug", skip(self))]
  pub fn submit(&mut self) -> Option<String> {
    if self.disposed {
      return None;
    }
    let term = self.text.clone();
    if self.opts.show_recent_searches && !term.trim().is_empty() {
      self.history.record(&term);
    }
    self.hide_now();
    Some(self.commit(term))
  }

  /// Pick an entry from the recent list; it is already in history so it is not re-recorded.
  pub fn select_recent(&mut self, index: usize) -> Option<String> {
    if self.disposed {
      return None;
    }
    let term = self.history.list().into_iter().nth(index)?;
    self.text = term.clone();
    self.hide_now();
    Some(self.commit(term))
  }

  /// The clear button: empty box, committed immediately.
  pub fn clear(&mut self) -> Option<String> {
    if self.disposed {
      return None;
    }
    self.text.clear();
    Some(self.commit(String::new()))
  }

  /// Returns the recent list when it should be shown.
  pub fn focus(&mut self) -> Option<Vec<String>> {
    if self.disposed || !self.opts.show_recent_searches {
      return None;
    }
    self.hide_at = None;
    let recent = self.history.list();
    if recent.is_empty() {
      return None;
    }
    self.recent_visible = true;
    Some(recent)
  }

  /// Hide the recent list after the grace period, so a pick right after blur still lands.
  pub fn blur(&mut self, now: Instant) {
    if self.recent_visible {
      self.hide_at = Some(now + self.opts.blur_grace);
    }
  }

  pub fn escape(&mut self) {
    self.hide_now();
  }

  pub fn recent(&self) -> Vec<String> {
    self.history.list()
  }

  pub fn clear_history(&mut self) {
    self.history.clear();
    self.hide_now();
  }

  /// Cancel every timer; nothing is emitted afterwards.
  pub fn dispose(&mut self) {
    self.pending = None;
    self.hide_at = None;
    self.recent_visible = false;
    self.disposed = true;
  }

  fn hide_now(&mut self) {
    self.recent_visible = false;
    self.hide_at = None;
  }

  fn commit(&mut self, term: String) -> String {
    self.pending = None;
    debug!(target: "search", term_len = term.len(), "Search term committed");
    term
  }
}

/// Sleep until `deadline`, or forever when there is none.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
  match deadline {
    Some(d) => sleep_until(d).await,
    None => std::future::pending::<()>().await,
  }
}
