//! Domain models: problems as the API returns them, filter criteria, and stats.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::console::CommandError;

/// Problem identifier. The backend sends integers, but nothing here depends on that.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProblemId {
  Num(i64),
  Text(String),
}

impl fmt::Display for ProblemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProblemId::Num(n) => write!(f, "{n}"),
      ProblemId::Text(s) => f.write_str(s),
    }
  }
}

impl From<&str> for ProblemId {
  fn from(s: &str) -> Self {
    match s.parse::<i64>() {
      Ok(n) => ProblemId::Num(n),
      Err(_) => ProblemId::Text(s.to_string()),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
  #[serde(other)]
  Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
  Leetcode,
  Gfg,
  Codeforces,
  Codechef,
  Hackerrank,
  #[serde(other)]
  Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  Solved,
  Attempted,
  ToRevise,
  #[serde(other)]
  Unknown,
}

// Wire names double as the only accepted filter spellings (exact, case-sensitive).
macro_rules! wire_names {
  ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
    impl $ty {
      pub fn as_str(&self) -> &'static str {
        match self {
          $($ty::$variant => $name,)+
          $ty::Unknown => "UNKNOWN",
        }
      }
    }

    impl FromStr for $ty {
      type Err = CommandError;
      fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
          $($name => Ok($ty::$variant),)+
          _ => Err(CommandError::InvalidValue {
            field: stringify!($ty),
            value: s.to_string(),
            expected: concat!($($name, " "),+),
          }),
        }
      }
    }

    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }
  };
}

wire_names!(Difficulty { Easy => "EASY", Medium => "MEDIUM", Hard => "HARD" });
wire_names!(Platform {
  Leetcode => "LEETCODE",
  Gfg => "GFG",
  Codeforces => "CODEFORCES",
  Codechef => "CODECHEF",
  Hackerrank => "HACKERRANK",
});
wire_names!(Status { Solved => "SOLVED", Attempted => "ATTEMPTED", ToRevise => "TO_REVISE" });

/// A tracked problem. Owned by the backend; this client only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
  pub id: ProblemId,
  pub problem_name: String,
  #[serde(default)] pub difficulty: Option<Difficulty>,
  #[serde(default)] pub platform: Option<Platform>,
  #[serde(default)] pub status: Option<Status>,
  #[serde(default)] pub tags: Option<Vec<String>>,
  #[serde(default)] pub solution_count: u32,
  #[serde(default)] pub solved_count: u32,
  #[serde(default)] pub problem_link: Option<String>,
  #[serde(default)] pub next_revision_date: Option<String>,
}

/// Active filter constraints. `None` / empty means "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
  pub search_term: String,
  pub difficulty: Option<Difficulty>,
  pub platform: Option<Platform>,
  pub status: Option<Status>,
  pub tag: Option<String>,
}

impl FilterCriteria {
  pub fn is_active(&self) -> bool {
    !self.search_term.is_empty()
      || self.difficulty.is_some()
      || self.platform.is_some()
      || self.status.is_some()
      || self.tag.is_some()
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DifficultyCounts {
  #[serde(default)] pub easy: u64,
  #[serde(default)] pub medium: u64,
  #[serde(default)] pub hard: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatusCounts {
  #[serde(default)] pub solved: u64,
  #[serde(default)] pub attempted: u64,
  #[serde(default)] pub to_revise: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PlatformCounts {
  #[serde(default)] pub leetcode: u64,
  #[serde(default)] pub gfg: u64,
  #[serde(default)] pub codeforces: u64,
}

/// Aggregate counts from `GET /problems/stats/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Stats {
  #[serde(default)] pub total_count: u64,
  #[serde(default)] pub difficulty: DifficultyCounts,
  #[serde(default)] pub status: StatusCounts,
  #[serde(default)] pub by_platform: PlatformCounts,
}
