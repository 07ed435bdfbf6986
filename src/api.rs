//! HTTP client for the CodeVault backend.
//!
//! Every request carries `Authorization: Bearer <token>` when the session has one.
//! Calls are instrumented and log endpoint, status and latency, never tokens or bodies.
//!
//! A 401 from any endpoint becomes `ApiError::Unauthorized`; the caller decides what
//! that does to the session.

use std::{sync::Arc, time::Duration};

use reqwest::{
  header::{AUTHORIZATION, USER_AGENT},
  Method, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::domain::{Problem, ProblemId, Stats};
use crate::protocol::{
  extract_api_error, LoginIn, MarkRevisedOut, ProblemsPayload, RegisterIn, RegisterOut,
  RevisionDueOut, TokenPairOut,
};
use crate::session::Session;
use crate::util::trunc_for_log;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("session is not authorized")]
  Unauthorized,
  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("unexpected response body: {0}")]
  Decode(String),
}

impl ApiError {
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, ApiError::Unauthorized)
  }
}

#[derive(Clone)]
pub struct ApiClient {
  client: reqwest::Client,
  base_url: String,
  session: Arc<Session>,
}

impl ApiClient {
  pub fn new(cfg: &ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.request_timeout_secs))
      .build()?;
    Ok(Self {
      client,
      base_url: cfg.api_url.trim_end_matches('/').to_string(),
      session,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let url = format!("{}{}", self.base_url, path);
    let mut req = self
      .client
      .request(method, url)
      .header(USER_AGENT, concat!("codevault/", env!("CARGO_PKG_VERSION")));
    if let Some(token) = self.session.token() {
      req = req.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    req
  }

  /// Send and check status; returns the raw body on success.
  async fn send(&self, req: RequestBuilder) -> Result<String, ApiError> {
    let start = std::time::Instant::now();
    let res = req.send().await?;
    let status = res.status();
    if status == StatusCode::UNAUTHORIZED {
      warn!(target: "api", elapsed = ?start.elapsed(), "Backend rejected the session (401)");
      return Err(ApiError::Unauthorized);
    }
    let body = res.text().await?;
    debug!(target: "api", %status, elapsed = ?start.elapsed(), body_len = body.len(), "Response received");

    if !status.is_success() {
      let message = extract_api_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(ApiError::Status { status: status.as_u16(), message });
    }
    Ok(body)
  }

  async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
    let body = self.send(req).await?;
    serde_json::from_str::<T>(&body).map_err(|e| ApiError::Decode(e.to_string()))
  }

  /// `POST /token/`: exchange credentials for an access token. The token is not stored here.
  #[instrument(level = "info", skip(self, password), fields(%username))]
  pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
    let req = self
      .request(Method::POST, "/token/")
      .json(&LoginIn { username, password });
    let pair: TokenPairOut = self.send_json(req).await?;
    Ok(pair.access)
  }

  /// `POST /register/`: create an account. Does not log in.
  #[instrument(level = "info", skip(self, email, password), fields(%username))]
  pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<RegisterOut, ApiError> {
    let req = self
      .request(Method::POST, "/register/")
      .json(&RegisterIn { username, email, password });
    self.send_json(req).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn get_problems(&self) -> Result<Vec<Problem>, ApiError> {
    let payload: ProblemsPayload = self.send_json(self.request(Method::GET, "/problems/")).await?;
    let problems = payload.into_problems();
    debug!(target: "api", count = problems.len(), "Problems fetched");
    Ok(problems)
  }

  #[instrument(level = "info", skip(self))]
  pub async fn get_stats(&self) -> Result<Stats, ApiError> {
    self.send_json(self.request(Method::GET, "/problems/stats/")).await
  }

  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn delete_problem(&self, id: &ProblemId) -> Result<(), ApiError> {
    self.send(self.request(Method::DELETE, &format!("/problems/{id}/"))).await?;
    Ok(())
  }

  #[instrument(level = "info", skip(self))]
  pub async fn revisions_due(&self) -> Result<RevisionDueOut, ApiError> {
    self.send_json(self.request(Method::GET, "/problems/revision_due/")).await
  }

  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn mark_revised(&self, id: &ProblemId) -> Result<MarkRevisedOut, ApiError> {
    self.send_json(self.request(Method::POST, &format!("/problems/{id}/mark_revised/"))).await
  }
}
