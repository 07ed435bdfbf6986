//! Wire shapes for the CodeVault REST API (serde ready).
//! Requests and responses are decoded here and normalized before anything else sees them.

use serde::{Deserialize, Serialize};

use crate::domain::Problem;

/// `GET /problems/` answers either a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProblemsPayload {
    List(Vec<Problem>),
    Page {
        #[serde(default)]
        results: Vec<Problem>,
    },
}

impl ProblemsPayload {
    pub fn into_problems(self) -> Vec<Problem> {
        match self {
            ProblemsPayload::List(v) => v,
            ProblemsPayload::Page { results } => results,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginIn<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenPairOut {
    pub access: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub refresh: Option<String>,
}

/// `POST /register/`
#[derive(Debug, Serialize)]
pub struct RegisterIn<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterOut {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<RegisteredUser>,
}

/// `GET /problems/revision_due/`
#[derive(Debug, Deserialize)]
pub struct RevisionDueOut {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub problems: Vec<Problem>,
}

/// `POST /problems/{id}/mark_revised/`
#[derive(Debug, Deserialize)]
pub struct MarkRevisedOut {
    #[serde(default)]
    pub message: String,
    pub problem: Problem,
    #[serde(default)]
    pub next_revision_date: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub solved_count: u32,
}

/// Error bodies look like `{"detail": "..."}` (DRF) or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub fn extract_api_error(body: &str) -> Option<String> {
    let e = serde_json::from_str::<ErrorBody>(body).ok()?;
    e.detail.or(e.error)
}
