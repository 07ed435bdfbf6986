//! Plain-text rendering of dashboard state for the terminal.

use std::fmt::Write;

use crate::dashboard::{Dashboard, Phase};
use crate::domain::{FilterCriteria, Problem, Stats};
use crate::util::fit;

pub fn phase_banner(phase: &Phase) -> Option<String> {
  match phase {
    Phase::Loading => Some("Loading dashboard...".into()),
    Phase::Ready => None,
    Phase::Error(msg) => Some(format!("! {msg}")),
    Phase::LoggedOut => Some("Not logged in. Use `login <username> <password>`.".into()),
  }
}

pub fn stats(s: &Stats) -> String {
  format!(
    "Total {}  |  Easy {}  Medium {}  Hard {}  |  Solved {}  Attempted {}  To revise {}  |  LeetCode {}  GFG {}  Codeforces {}",
    s.total_count,
    s.difficulty.easy,
    s.difficulty.medium,
    s.difficulty.hard,
    s.status.solved,
    s.status.attempted,
    s.status.to_revise,
    s.by_platform.leetcode,
    s.by_platform.gfg,
    s.by_platform.codeforces,
  )
}

pub fn criteria(c: &FilterCriteria) -> String {
  if !c.is_active() {
    return "Filters: none".into();
  }
  let mut parts = Vec::new();
  if !c.search_term.is_empty() {
    parts.push(format!("search=\"{}\"", c.search_term));
  }
  if let Some(d) = c.difficulty { parts.push(format!("difficulty={d}")); }
  if let Some(p) = c.platform { parts.push(format!("platform={p}")); }
  if let Some(s) = c.status { parts.push(format!("status={s}")); }
  if let Some(t) = &c.tag { parts.push(format!("tag={t}")); }
  format!("Filters: {}  (`clear` to reset)", parts.join(" "))
}

fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
  v.map(|x| x.to_string()).unwrap_or_else(|| "-".into())
}

pub fn problem_table<'a>(problems: impl IntoIterator<Item = &'a Problem>) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{} {} {} {} {} {} {}",
    fit("ID", 6), fit("NAME", 32), fit("DIFF", 7), fit("PLATFORM", 11), fit("STATUS", 10), fit("SOL", 4), "TAGS"
  );
  let mut rows = 0usize;
  for p in problems {
    rows += 1;
    let tags = p.tags.as_deref().map(|t| t.join(", ")).unwrap_or_default();
    let _ = write!(
      out,
      "{} {} {} {} {} {} {}",
      fit(&p.id.to_string(), 6),
      fit(&p.problem_name, 32),
      fit(&opt(p.difficulty), 7),
      fit(&opt(p.platform), 11),
      fit(&opt(p.status), 10),
      fit(&p.solution_count.to_string(), 4),
      tags,
    );
    if let Some(next) = &p.next_revision_date {
      let _ = write!(out, "  (revised {}x, next {next})", p.solved_count);
    }
    out.push('\n');
  }
  if rows == 0 {
    out.push_str("(no problems match)\n");
  }
  out
}

pub fn tags(tags: &[String]) -> String {
  if tags.is_empty() {
    "No tags yet.".into()
  } else {
    format!("Tags: {}", tags.join(", "))
  }
}

pub fn recent(terms: &[String]) -> String {
  if terms.is_empty() {
    return "No recent searches.".into();
  }
  let mut out = String::from("Recent searches:\n");
  for (i, t) in terms.iter().enumerate() {
    let _ = writeln!(out, "  {}. {t}", i + 1);
  }
  out.push_str("  (`pick <n>` to reuse, `clear-history` to forget)");
  out
}

/// Banner, stats, filters and the visible list.
pub fn dashboard(d: &Dashboard) -> String {
  if let Some(banner) = phase_banner(d.phase()) {
    return banner;
  }
  let mut out = String::new();
  if let Some(s) = d.stats() {
    let _ = writeln!(out, "{}", stats(s));
  }
  let _ = writeln!(out, "{}", criteria(d.criteria()));
  let _ = writeln!(out, "Showing {} of {} problems", d.visible_count(), d.problems().len());
  out.push_str(&problem_table(d.visible()));
  out
}
