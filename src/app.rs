//! Command dispatch: ties the search box, the dashboard controller and background
//! stats refreshes together. `main` feeds it stdin lines and timer wakeups; every
//! handler returns the text to print.

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::console::{Command, HELP};
use crate::dashboard::{ActionError, Dashboard, Phase, StatsUpdate};
use crate::render;
use crate::search::SearchInput;

pub enum Flow {
  Continue(Option<String>),
  Quit,
}

pub struct App {
  pub dashboard: Dashboard,
  pub search: SearchInput,
  stats_tx: mpsc::Sender<StatsUpdate>,
}

impl App {
  pub fn new(dashboard: Dashboard, search: SearchInput, stats_tx: mpsc::Sender<StatsUpdate>) -> Self {
    Self { dashboard, search, stats_tx }
  }

  /// The debounce timer (or blur grace timer) fired.
  pub fn on_timer(&mut self, now: Instant) -> Option<String> {
    let term = self.search.poll(now)?;
    Some(self.apply_search(&term))
  }

  pub fn on_stats(&mut self, update: StatsUpdate) -> Option<String> {
    let was_logged_out = self.dashboard.phase() == &Phase::LoggedOut;
    self.dashboard.apply_stats(update);
    if !was_logged_out && self.dashboard.phase() == &Phase::LoggedOut {
      return Some(render::dashboard(&self.dashboard));
    }
    self.dashboard.take_notice()
  }

  #[instrument(level = "debug", skip(self, cmd))]
  pub async fn handle(&mut self, cmd: Command, now: Instant) -> Flow {
    let out = match cmd {
      Command::Quit => return Flow::Quit,
      Command::Help => Some(HELP.to_string()),

      // Search box
      Command::Type(text) => {
        self.search.input(&text, now);
        None
      }
      Command::Enter => self.search.submit().map(|t| self.apply_search(&t)),
      Command::Pick(n) => match n.checked_sub(1).and_then(|i| self.search.select_recent(i)) {
        Some(t) => Some(self.apply_search(&t)),
        None => Some(format!("No recent search at position {n}.")),
      },
      Command::ClearSearch => self.search.clear().map(|t| self.apply_search(&t)),
      Command::Focus => self.search.focus().map(|r| render::recent(&r)),
      Command::Blur => {
        self.search.blur(now);
        None
      }
      Command::Escape => {
        self.search.escape();
        None
      }
      Command::History => Some(render::recent(&self.search.recent())),
      Command::ClearHistory => {
        self.search.clear_history();
        Some("Search history cleared.".into())
      }

      // Filters
      Command::Difficulty(v) => {
        self.dashboard.set_difficulty(v);
        Some(render::dashboard(&self.dashboard))
      }
      Command::Platform(v) => {
        self.dashboard.set_platform(v);
        Some(render::dashboard(&self.dashboard))
      }
      Command::Status(v) => {
        self.dashboard.set_status(v);
        Some(render::dashboard(&self.dashboard))
      }
      Command::Tag(v) => {
        self.dashboard.set_tag(v);
        Some(render::dashboard(&self.dashboard))
      }
      Command::ClearFilters => {
        self.search.clear();
        self.dashboard.clear_filters();
        Some(render::dashboard(&self.dashboard))
      }

      // Views
      Command::List => Some(render::dashboard(&self.dashboard)),
      Command::Tags => Some(render::tags(self.dashboard.tags())),
      Command::Stats => Some(match self.dashboard.stats() {
        Some(s) => render::stats(s),
        None => render::phase_banner(self.dashboard.phase()).unwrap_or_default(),
      }),
      Command::Refresh => {
        self.dashboard.load().await;
        Some(render::dashboard(&self.dashboard))
      }

      // Actions
      Command::Delete(id) => Some(match self.dashboard.delete_problem(&id).await {
        Ok(()) => {
          self.spawn_stats_refresh();
          format!("Deleted problem {id}.\n{}", render::dashboard(&self.dashboard))
        }
        Err(e) => self.action_error(e),
      }),
      Command::Revisions => Some(match self.dashboard.revisions_due().await {
        Ok(due) if due.is_empty() => "Nothing due for revision.".into(),
        Ok(due) => {
          let mut out = format!("{} due for revision:\n", due.len());
          out.push_str(&render::problem_table(&due));
          for p in due.iter() {
            if let Some(link) = &p.problem_link {
              out.push_str(&format!("  {} -> {link}\n", p.problem_name));
            }
          }
          out
        }
        Err(e) => self.action_error(e),
      }),
      Command::Revise(id) => Some(match self.dashboard.mark_revised(&id).await {
        Ok(next) => {
          self.spawn_stats_refresh();
          match next {
            Some(date) => format!("Marked {id} as revised; next revision on {date}."),
            None => format!("Marked {id} as revised."),
          }
        }
        Err(e) => self.action_error(e),
      }),

      // Session
      Command::Register { username, email, password } => {
        Some(match self.dashboard.register(&username, &email, &password).await {
          Ok(name) => format!("Account created for {name}. You can log in now."),
          Err(e) => format!("! {e}"),
        })
      }
      Command::Login { username, password } => Some(match self.dashboard.login(&username, &password).await {
        Ok(()) => render::dashboard(&self.dashboard),
        Err(e) => e.to_string(),
      }),
      Command::Logout => {
        self.dashboard.logout();
        Some(render::dashboard(&self.dashboard))
      }
    };
    Flow::Continue(out)
  }

  fn apply_search(&mut self, term: &str) -> String {
    debug!(target: "search", term_len = term.len(), "Applying search term");
    self.dashboard.set_search_term(term);
    render::dashboard(&self.dashboard)
  }

  fn action_error(&self, e: ActionError) -> String {
    match e {
      ActionError::LoggedOut => render::dashboard(&self.dashboard),
      ActionError::Failed(msg) => format!("! {msg}"),
    }
  }

  fn spawn_stats_refresh(&self) {
    let refresh = self.dashboard.stats_refresh();
    let tx = self.stats_tx.clone();
    tokio::spawn(async move {
      // The receiver only goes away at shutdown.
      let _ = tx.send(refresh.await).await;
    });
  }

  pub fn shutdown(&mut self) {
    self.search.dispose();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::tests::{client_for, problems_backend, spawn_backend};
  use crate::history::RecentSearches;
  use crate::search::SearchOptions;
  use crate::storage::{KeyValueStore, MemoryStore};
  use std::{sync::Arc, time::Duration};

  async fn app(token: Option<&str>) -> (App, mpsc::Receiver<StatsUpdate>) {
    let base = spawn_backend(problems_backend()).await;
    let (api, session) = client_for(&base, token);
    let mut dashboard = Dashboard::new(api, session);
    dashboard.load().await;
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
    let search = SearchInput::new(SearchOptions::default(), RecentSearches::new(store));
    let (tx, rx) = mpsc::channel(4);
    (App::new(dashboard, search, tx), rx)
  }

  fn text(flow: Flow) -> String {
    match flow {
      Flow::Continue(Some(s)) => s,
      Flow::Continue(None) => String::new(),
      Flow::Quit => "<quit>".into(),
    }
  }

  #[tokio::test]
  async fn typed_search_applies_only_after_debounce() {
    let (mut app, _rx) = app(Some("good")).await;
    let t0 = Instant::now();
    assert_eq!(text(app.handle(Command::Type("zzz".into()), t0).await), "");
    assert_eq!(app.dashboard.criteria().search_term, "");

    assert!(app.on_timer(t0 + Duration::from_millis(100)).is_none());
    let out = app.on_timer(t0 + Duration::from_millis(300)).unwrap();
    assert!(out.contains("Showing 0 of 1"));
    assert_eq!(app.dashboard.criteria().search_term, "zzz");
  }

  #[tokio::test]
  async fn enter_commits_and_records_history() {
    let (mut app, _rx) = app(Some("good")).await;
    let now = Instant::now();
    app.handle(Command::Type("two".into()), now).await;
    let out = text(app.handle(Command::Enter, now).await);
    assert!(out.contains("Two Sum"));
    assert!(app.on_timer(now + Duration::from_secs(1)).is_none());
    assert!(text(app.handle(Command::Focus, now).await).contains("1. two"));
  }

  #[tokio::test]
  async fn delete_spawns_stats_refresh() {
    let (mut app, mut rx) = app(Some("good")).await;
    let out = text(app.handle(Command::Delete("1".into()), Instant::now()).await);
    assert!(out.starts_with("Deleted problem 1."));
    let refreshed = rx.recv().await.unwrap();
    assert!(app.on_stats(refreshed).is_none());
  }

  #[tokio::test]
  async fn register_then_login() {
    let (mut app, _rx) = app(None).await;
    let cmd = "register carol carol@example.org longenough".parse().unwrap();
    assert_eq!(text(app.handle(cmd, Instant::now()).await), "Account created for carol. You can log in now.");
    let cmd = "register carol carol@example.org short".parse().unwrap();
    assert_eq!(text(app.handle(cmd, Instant::now()).await), "! Password must be at least 8 characters long");

    let out = text(app.handle("login carol pw".parse().unwrap(), Instant::now()).await);
    assert!(out.contains("Two Sum"));
  }

  #[tokio::test]
  async fn refresh_after_logout_is_ignored() {
    let (mut app, mut rx) = app(Some("good")).await;
    app.handle(Command::Delete("1".into()), Instant::now()).await;
    app.handle(Command::Logout, Instant::now()).await;
    let stale = rx.recv().await.unwrap();
    assert!(app.on_stats(stale).is_none());
    assert!(app.dashboard.stats().is_none());
  }

  #[tokio::test]
  async fn logged_out_actions_show_login_banner() {
    let (mut app, _rx) = app(None).await;
    assert_eq!(app.dashboard.phase(), &Phase::LoggedOut);
    let out = text(app.handle(Command::Revisions, Instant::now()).await);
    assert!(out.contains("Not logged in"));
    assert_eq!(text(app.handle(Command::Quit, Instant::now()).await), "<quit>");
  }
}
