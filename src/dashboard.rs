//! Dashboard controller: owns the fetched problems, stats and filter criteria.
//!
//! Phases:
//!   Loading -> Ready          (problems + stats both fetched)
//!   Loading -> Error          (either request failed)
//!   any     -> LoggedOut      (401 anywhere; session cleared)
//!
//! The tag index and the visible view are recomputed whenever the problem list or
//! a criterion changes, so reads are cheap and always consistent with the criteria.
//!
//! Background stats refreshes are stamped with the epoch they started in. Every
//! `load` and every session end starts a new epoch, and `apply_stats` drops
//! results from an older one.

use std::{future::Future, sync::Arc};

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::domain::{Difficulty, FilterCriteria, Platform, Problem, ProblemId, Stats, Status};
use crate::filter::{matching_indices, tag_index};
use crate::session::Session;

pub const LOAD_FAILED: &str = "Failed to load dashboard data";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
  Loading,
  Ready,
  Error(String),
  LoggedOut,
}

/// Why a user action did not go through. Either way the list is left as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
  #[error("{0}")]
  Failed(String),
  #[error("session expired, please log in again")]
  LoggedOut,
}

/// Result of a detached stats fetch, tagged with the epoch it was started in.
#[derive(Debug)]
pub struct StatsUpdate {
  epoch: u64,
  result: Result<Stats, ApiError>,
}

pub struct Dashboard {
  api: ApiClient,
  session: Arc<Session>,
  phase: Phase,
  problems: Vec<Problem>,
  stats: Option<Stats>,
  criteria: FilterCriteria,
  tags: Vec<String>,
  visible: Vec<usize>,
  notice: Option<String>,
  epoch: u64,
}

impl Dashboard {
  pub fn new(api: ApiClient, session: Arc<Session>) -> Self {
    Self {
      api,
      session,
      phase: Phase::Loading,
      problems: Vec::new(),
      stats: None,
      criteria: FilterCriteria::default(),
      tags: Vec::new(),
      visible: Vec::new(),
      notice: None,
      epoch: 0,
    }
  }

  pub fn phase(&self) -> &Phase { &self.phase }
  pub fn stats(&self) -> Option<&Stats> { self.stats.as_ref() }
  pub fn criteria(&self) -> &FilterCriteria { &self.criteria }
  pub fn tags(&self) -> &[String] { &self.tags }
  pub fn problems(&self) -> &[Problem] { &self.problems }

  /// Problems passing the current criteria, in fetch order.
  pub fn visible(&self) -> impl Iterator<Item = &Problem> + '_ {
    self.visible.iter().filter_map(|&i| self.problems.get(i))
  }

  pub fn visible_count(&self) -> usize {
    self.visible.len()
  }

  /// Transient message from the last action (delete failure, stats refresh failure, ...).
  pub fn take_notice(&mut self) -> Option<String> {
    self.notice.take()
  }

  /// Fetch problems and stats concurrently; both must succeed.
  #[instrument(level = "info", skip(self))]
  pub async fn load(&mut self) {
    self.epoch += 1;
    self.phase = Phase::Loading;
    let fetched = tokio::try_join!(self.api.get_problems(), self.api.get_stats());
    match fetched {
      Ok((problems, stats)) => {
        info!(target: "dashboard", count = problems.len(), total = stats.total_count, "Dashboard loaded");
        self.set_problems(problems);
        self.stats = Some(stats);
        self.phase = Phase::Ready;
      }
      Err(e) if e.is_unauthorized() => self.end_session(),
      Err(e) => {
        error!(target: "dashboard", error = %e, "Dashboard fetch failed");
        self.phase = Phase::Error(LOAD_FAILED.into());
      }
    }
  }

  // --- Filters ---

  pub fn set_search_term(&mut self, term: &str) {
    self.criteria.search_term = term.to_string();
    self.refresh_view();
  }

  pub fn set_difficulty(&mut self, v: Option<Difficulty>) {
    self.criteria.difficulty = v;
    self.refresh_view();
  }

  pub fn set_platform(&mut self, v: Option<Platform>) {
    self.criteria.platform = v;
    self.refresh_view();
  }

  pub fn set_status(&mut self, v: Option<Status>) {
    self.criteria.status = v;
    self.refresh_view();
  }

  pub fn set_tag(&mut self, v: Option<String>) {
    self.criteria.tag = v.filter(|t| !t.is_empty());
    self.refresh_view();
  }

  /// Reset every criterion in one step.
  pub fn clear_filters(&mut self) {
    self.criteria = FilterCriteria::default();
    self.refresh_view();
  }

  // --- Actions ---

  /// Delete on the server, then drop the problem locally. Stats are refreshed by the
  /// caller through `stats_refresh` / `apply_stats`.
  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn delete_problem(&mut self, id: &ProblemId) -> Result<(), ActionError> {
    self.ensure_session()?;
    match self.api.delete_problem(id).await {
      Ok(()) => {
        let mut problems = std::mem::take(&mut self.problems);
        problems.retain(|p| &p.id != id);
        self.set_problems(problems);
        info!(target: "dashboard", %id, "Problem deleted");
        Ok(())
      }
      Err(e) => Err(self.action_failed(e, "Failed to delete problem")),
    }
  }

  /// Problems whose revision date is due, as the server computes it.
  #[instrument(level = "info", skip(self))]
  pub async fn revisions_due(&mut self) -> Result<Vec<Problem>, ActionError> {
    self.ensure_session()?;
    match self.api.revisions_due().await {
      Ok(out) => {
        info!(target: "dashboard", count = out.count, "Revisions due fetched");
        Ok(out.problems)
      }
      Err(e) => Err(self.action_failed(e, "Failed to load revisions")),
    }
  }

  /// Mark revised; the returned problem replaces the local copy. Returns the next revision date.
  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn mark_revised(&mut self, id: &ProblemId) -> Result<Option<String>, ActionError> {
    self.ensure_session()?;
    match self.api.mark_revised(id).await {
      Ok(out) => {
        info!(target: "dashboard", %id, message = %out.message, "Problem marked revised");
        let mut problems = std::mem::take(&mut self.problems);
        if let Some(slot) = problems.iter_mut().find(|p| &p.id == id) {
          *slot = out.problem;
        }
        self.set_problems(problems);
        Ok(out.next_revision_date)
      }
      Err(e) => Err(self.action_failed(e, "Failed to mark problem as revised")),
    }
  }

  /// Exchange credentials for a token, then reload.
  #[instrument(level = "info", skip(self, password), fields(%username))]
  pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ActionError> {
    match self.api.login(username, password).await {
      Ok(token) => {
        self.session.set_token(token);
        self.load().await;
        Ok(())
      }
      Err(e) if e.is_unauthorized() => Err(ActionError::Failed("Invalid username or password".into())),
      Err(e) => {
        warn!(target: "dashboard", error = %e, "Login failed");
        Err(ActionError::Failed(format!("Login failed: {e}")))
      }
    }
  }

  /// Create an account. The session is untouched; the user logs in afterwards.
  #[instrument(level = "info", skip(self, email, password), fields(%username))]
  pub async fn register(&mut self, username: &str, email: &str, password: &str) -> Result<String, ActionError> {
    match self.api.register(username.trim(), email.trim(), password).await {
      Ok(out) => {
        let name = out.user.map(|u| u.username).unwrap_or_else(|| username.trim().to_string());
        info!(target: "dashboard", user = %name, "Account registered");
        Ok(name)
      }
      Err(ApiError::Status { message, .. }) => {
        warn!(target: "dashboard", %message, "Registration rejected");
        Err(ActionError::Failed(message))
      }
      Err(e) => {
        warn!(target: "dashboard", error = %e, "Registration failed");
        Err(ActionError::Failed(format!("Registration failed: {e}")))
      }
    }
  }

  pub fn logout(&mut self) {
    self.end_session();
  }

  /// A detached stats fetch; run it in the background and hand the result to `apply_stats`.
  pub fn stats_refresh(&self) -> impl Future<Output = StatsUpdate> + Send + 'static {
    let api = self.api.clone();
    let epoch = self.epoch;
    async move { StatsUpdate { epoch, result: api.get_stats().await } }
  }

  pub fn apply_stats(&mut self, update: StatsUpdate) {
    if update.epoch != self.epoch {
      debug!(target: "dashboard", started = update.epoch, current = self.epoch, "Dropping stale stats refresh");
      return;
    }
    if self.phase == Phase::LoggedOut {
      return;
    }
    match update.result {
      Ok(stats) => self.stats = Some(stats),
      Err(e) if e.is_unauthorized() => self.end_session(),
      Err(e) => {
        warn!(target: "dashboard", error = %e, "Stats refresh failed");
        self.notice = Some("Failed to refresh stats".into());
      }
    }
  }

  // --- Internals ---

  fn set_problems(&mut self, problems: Vec<Problem>) {
    self.problems = problems;
    self.tags = tag_index(&self.problems);
    self.refresh_view();
  }

  fn refresh_view(&mut self) {
    self.visible = matching_indices(&self.problems, &self.criteria);
  }

  fn ensure_session(&self) -> Result<(), ActionError> {
    if self.phase == Phase::LoggedOut {
      Err(ActionError::LoggedOut)
    } else {
      Ok(())
    }
  }

  fn action_failed(&mut self, e: ApiError, message: &str) -> ActionError {
    if e.is_unauthorized() {
      self.end_session();
      return ActionError::LoggedOut;
    }
    warn!(target: "dashboard", error = %e, "{message}");
    self.notice = Some(message.to_string());
    ActionError::Failed(message.to_string())
  }

  fn end_session(&mut self) {
    self.epoch += 1;
    self.session.logout();
    self.problems.clear();
    self.tags.clear();
    self.visible.clear();
    self.stats = None;
    self.phase = Phase::LoggedOut;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::tests::{client_for, spawn_backend};
  use axum::{
    extract::Path,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
  };
  use serde_json::{json, Value};
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
  };

  type Db = Arc<Mutex<Vec<Value>>>;

  /// Fake backend state: the stored rows, and whether the server has started rejecting tokens.
  #[derive(Clone)]
  struct Fake {
    db: Db,
    stats_status: StatusCode,
    revoked: Arc<AtomicBool>,
  }

  impl Fake {
    fn new(stats_status: StatusCode) -> Self {
      Self { db: seed(), stats_status, revoked: Arc::new(AtomicBool::new(false)) }
    }

    fn revoke(&self) {
      self.revoked.store(true, Ordering::SeqCst);
    }

    fn rejects(&self) -> bool {
      self.revoked.load(Ordering::SeqCst)
    }
  }

  fn seed() -> Db {
    Arc::new(Mutex::new(vec![
      json!({"id": 1, "problem_name": "Two Sum", "difficulty": "EASY", "platform": "LEETCODE", "status": "SOLVED", "tags": ["array"]}),
      json!({"id": 2, "problem_name": "Climbing Stairs", "difficulty": "EASY", "platform": "LEETCODE", "status": "TO_REVISE", "tags": ["dp"]}),
      json!({"id": 3, "problem_name": "Edit Distance", "difficulty": "HARD", "platform": "GFG", "status": "ATTEMPTED", "tags": ["dp", "string"]}),
      json!({"id": 4, "problem_name": "Untagged", "difficulty": "MEDIUM"}),
    ]))
  }

  fn backend(fake: Fake) -> Router {
    let list = fake.clone();
    let stats = fake.clone();
    let del = fake.clone();
    let revise = fake.clone();
    Router::new()
      .route(
        "/api/problems/",
        get(move || {
          let f = list.clone();
          async move {
            if f.rejects() {
              return Err(StatusCode::UNAUTHORIZED);
            }
            Ok(Json(Value::Array(f.db.lock().unwrap().clone())))
          }
        }),
      )
      .route(
        "/api/problems/stats/",
        get(move || {
          let f = stats.clone();
          async move {
            if f.rejects() {
              return Err(StatusCode::UNAUTHORIZED);
            }
            if f.stats_status != StatusCode::OK {
              return Err(f.stats_status);
            }
            Ok(Json(json!({"total_count": f.db.lock().unwrap().len()})))
          }
        }),
      )
      .route(
        "/api/problems/:id/",
        delete(move |Path(id): Path<i64>| {
          let f = del.clone();
          async move {
            if f.rejects() {
              return StatusCode::UNAUTHORIZED;
            }
            let mut rows = f.db.lock().unwrap();
            let before = rows.len();
            rows.retain(|p| p["id"] != id);
            if rows.len() < before { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
          }
        }),
      )
      .route(
        "/api/problems/:id/mark_revised/",
        post(move |Path(id): Path<i64>| {
          let f = revise.clone();
          async move {
            if f.rejects() {
              return Err(StatusCode::UNAUTHORIZED);
            }
            Ok(Json(json!({
              "message": "Problem marked as revised successfully",
              "problem": {"id": id, "problem_name": "Climbing Stairs", "difficulty": "EASY", "status": "TO_REVISE", "tags": ["dp"], "solved_count": 1},
              "next_revision_date": "2026-10-20",
              "solved_count": 1
            })))
          }
        }),
      )
      .route(
        "/api/problems/revision_due/",
        get(|| async { Json(json!({"count": 1, "problems": [{"id": 2, "problem_name": "Climbing Stairs"}]})) }),
      )
      .route(
        "/api/token/",
        post(move |Json(body): Json<Value>| {
          let f = fake.clone();
          async move {
            if body["password"] == "pw" {
              f.revoked.store(false, Ordering::SeqCst);
              Ok(Json(json!({"access": "fresh", "refresh": "r"})))
            } else {
              Err(StatusCode::UNAUTHORIZED)
            }
          }
        }),
      )
      .route(
        "/api/register/",
        post(|Json(body): Json<Value>| async move {
          if body["username"] == "taken" {
            return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "Username \"taken\" is already taken"}))));
          }
          Ok((StatusCode::CREATED, Json(json!({"message": "User registered successfully", "user": {"username": body["username"]}}))))
        }),
      )
  }

  async fn ready_dashboard() -> (Dashboard, Arc<Session>, Fake) {
    let fake = Fake::new(StatusCode::OK);
    let base = spawn_backend(backend(fake.clone())).await;
    let (api, session) = client_for(&base, Some("tok"));
    let mut dash = Dashboard::new(api, session.clone());
    dash.load().await;
    assert_eq!(dash.phase(), &Phase::Ready);
    (dash, session, fake)
  }

  fn assert_logged_out(dash: &Dashboard, session: &Session) {
    assert_eq!(dash.phase(), &Phase::LoggedOut);
    assert!(!session.is_authenticated());
    assert_eq!(dash.visible_count(), 0);
    assert!(dash.problems().is_empty());
    assert!(dash.tags().is_empty());
    assert!(dash.stats().is_none());
  }

  fn visible_names(d: &Dashboard) -> Vec<String> {
    d.visible().map(|p| p.problem_name.clone()).collect()
  }

  #[tokio::test]
  async fn load_builds_tags_and_unfiltered_view() {
    let (dash, _, _) = ready_dashboard().await;
    assert_eq!(dash.visible_count(), 4);
    assert_eq!(dash.tags(), ["array", "dp", "string"]);
    assert_eq!(dash.stats().unwrap().total_count, 4);
  }

  #[tokio::test]
  async fn criteria_changes_recompute_view_and_clear_resets_all() {
    let (mut dash, _, _) = ready_dashboard().await;
    dash.set_difficulty(Some(Difficulty::Easy));
    dash.set_tag(Some("dp".into()));
    assert_eq!(visible_names(&dash), vec!["Climbing Stairs"]);

    dash.set_tag(Some(String::new()));
    dash.set_search_term("SUM");
    assert_eq!(visible_names(&dash), vec!["Two Sum"]);

    dash.set_platform(Some(Platform::Gfg));
    assert!(visible_names(&dash).is_empty());

    dash.clear_filters();
    assert!(!dash.criteria().is_active());
    assert_eq!(dash.visible_count(), 4);
  }

  #[tokio::test]
  async fn stats_failure_is_a_single_error_state() {
    let base = spawn_backend(backend(Fake::new(StatusCode::INTERNAL_SERVER_ERROR))).await;
    let (api, session) = client_for(&base, Some("tok"));
    let mut dash = Dashboard::new(api, session.clone());
    dash.load().await;
    assert_eq!(dash.phase(), &Phase::Error(LOAD_FAILED.into()));
    assert!(dash.problems().is_empty());
    assert!(session.is_authenticated());
  }

  #[tokio::test]
  async fn unauthorized_load_clears_session() {
    let base = spawn_backend(backend(Fake::new(StatusCode::UNAUTHORIZED))).await;
    let (api, session) = client_for(&base, Some("stale"));
    let mut dash = Dashboard::new(api, session.clone());
    dash.load().await;
    assert_eq!(dash.phase(), &Phase::LoggedOut);
    assert!(!session.is_authenticated());
    assert_eq!(dash.delete_problem(&ProblemId::Num(1)).await, Err(ActionError::LoggedOut));
  }

  #[tokio::test]
  async fn delete_removes_after_confirmation_then_stats_refresh() {
    let (mut dash, _, fake) = ready_dashboard().await;
    dash.set_tag(Some("dp".into()));
    dash.delete_problem(&ProblemId::Num(2)).await.unwrap();
    assert_eq!(visible_names(&dash), vec!["Edit Distance"]);
    assert_eq!(fake.db.lock().unwrap().len(), 3);

    let refreshed = tokio::spawn(dash.stats_refresh()).await.unwrap();
    dash.apply_stats(refreshed);
    assert_eq!(dash.stats().unwrap().total_count, 3);
    assert_eq!(dash.phase(), &Phase::Ready);
  }

  #[tokio::test]
  async fn failed_delete_keeps_the_list() {
    let (mut dash, _, _) = ready_dashboard().await;
    let err = dash.delete_problem(&ProblemId::Num(99)).await.unwrap_err();
    assert_eq!(err, ActionError::Failed("Failed to delete problem".into()));
    assert_eq!(dash.visible_count(), 4);
    assert_eq!(dash.phase(), &Phase::Ready);
    assert_eq!(dash.take_notice().as_deref(), Some("Failed to delete problem"));
    assert!(dash.take_notice().is_none());
  }

  #[tokio::test]
  async fn mark_revised_replaces_local_copy() {
    let (mut dash, _, _) = ready_dashboard().await;
    let next = dash.mark_revised(&ProblemId::Num(2)).await.unwrap();
    assert_eq!(next.as_deref(), Some("2026-10-20"));
    let p = dash.problems().iter().find(|p| p.id == ProblemId::Num(2)).unwrap();
    assert_eq!(p.solved_count, 1);

    let due = dash.revisions_due().await.unwrap();
    assert_eq!(due.len(), 1);
  }

  #[tokio::test]
  async fn login_stores_token_and_loads() {
    let base = spawn_backend(backend(Fake::new(StatusCode::OK))).await;
    let (api, session) = client_for(&base, None);
    let mut dash = Dashboard::new(api, session.clone());

    assert!(dash.login("me", "wrong").await.is_err());
    assert!(!session.is_authenticated());

    dash.login("me", "pw").await.unwrap();
    assert_eq!(session.token().as_deref(), Some("fresh"));
    assert_eq!(dash.phase(), &Phase::Ready);

    dash.logout();
    assert_eq!(dash.phase(), &Phase::LoggedOut);
    assert_eq!(dash.visible_count(), 0);
  }
  #[tokio::test]
  async fn unauthorized_delete_from_ready_logs_out() {
    let (mut dash, session, fake) = ready_dashboard().await;
    fake.revoke();
    assert_eq!(dash.delete_problem(&ProblemId::Num(1)).await, Err(ActionError::LoggedOut));
    assert_logged_out(&dash, &session);
    assert_eq!(fake.db.lock().unwrap().len(), 4);
  }

  #[tokio::test]
  async fn unauthorized_mark_revised_from_ready_logs_out() {
    let (mut dash, session, fake) = ready_dashboard().await;
    fake.revoke();
    assert_eq!(dash.mark_revised(&ProblemId::Num(2)).await, Err(ActionError::LoggedOut));
    assert_logged_out(&dash, &session);
    assert_eq!(dash.revisions_due().await, Err(ActionError::LoggedOut));
  }

  #[tokio::test]
  async fn unauthorized_stats_refresh_from_ready_logs_out() {
    let (mut dash, session, fake) = ready_dashboard().await;
    dash.set_difficulty(Some(Difficulty::Easy));
    fake.revoke();
    let refreshed = tokio::spawn(dash.stats_refresh()).await.unwrap();
    dash.apply_stats(refreshed);
    assert_logged_out(&dash, &session);
  }

  #[tokio::test]
  async fn stats_from_a_previous_session_are_dropped() {
    let (mut dash, _, fake) = ready_dashboard().await;
    let stale = tokio::spawn(dash.stats_refresh()).await.unwrap();

    dash.logout();
    fake.db.lock().unwrap().truncate(2);
    dash.login("bob", "pw").await.unwrap();
    assert_eq!(dash.stats().unwrap().total_count, 2);

    dash.apply_stats(stale);
    assert_eq!(dash.stats().unwrap().total_count, 2);
    assert_eq!(dash.phase(), &Phase::Ready);
  }

  #[tokio::test]
  async fn stats_started_before_a_reload_are_dropped() {
    let (mut dash, _, fake) = ready_dashboard().await;
    let stale = tokio::spawn(dash.stats_refresh()).await.unwrap();
    fake.db.lock().unwrap().truncate(3);
    dash.load().await;
    dash.apply_stats(stale);
    assert_eq!(dash.stats().unwrap().total_count, 3);
  }

  #[tokio::test]
  async fn register_reports_name_or_server_message() {
    let (mut dash, session, _) = ready_dashboard().await;
    assert_eq!(dash.register(" erin ", "erin@example.org", "longenough").await.as_deref(), Ok("erin"));
    assert_eq!(
      dash.register("taken", "t@example.org", "longenough").await,
      Err(ActionError::Failed("Username \"taken\" is already taken".into()))
    );
    assert_eq!(session.token().as_deref(), Some("tok"));
    assert_eq!(dash.phase(), &Phase::Ready);
  }
}
