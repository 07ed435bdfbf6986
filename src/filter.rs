//! Client-side filtering over the fetched problem list, and the tag index that
//! feeds the tag filter's choices.
//!
//! Both are pure: the input slice is never touched and the output only depends
//! on the arguments.

use std::collections::BTreeSet;

use crate::domain::{FilterCriteria, Problem};

/// True when every active criterion in `c` matches `p`.
pub fn matches(p: &Problem, c: &FilterCriteria) -> bool {
  if !c.search_term.is_empty()
    && !p.problem_name.to_lowercase().contains(&c.search_term.to_lowercase())
  {
    return false;
  }
  if c.difficulty.is_some() && p.difficulty != c.difficulty {
    return false;
  }
  if c.platform.is_some() && p.platform != c.platform {
    return false;
  }
  if c.status.is_some() && p.status != c.status {
    return false;
  }
  if let Some(tag) = c.tag.as_deref() {
    let has_tag = p.tags.as_deref().is_some_and(|tags| tags.iter().any(|t| t == tag));
    if !has_tag {
      return false;
    }
  }
  true
}

/// Ordered subsequence of `problems` passing `criteria`.
pub fn filter_problems<'a>(problems: &'a [Problem], criteria: &FilterCriteria) -> Vec<&'a Problem> {
  problems.iter().filter(|p| matches(p, criteria)).collect()
}

/// Positions of matching problems; lets the dashboard cache the view without borrowing.
pub fn matching_indices(problems: &[Problem], criteria: &FilterCriteria) -> Vec<usize> {
  problems
    .iter()
    .enumerate()
    .filter(|(_, p)| matches(p, criteria))
    .map(|(i, _)| i)
    .collect()
}

/// Sorted, de-duplicated union of every problem's tags.
pub fn tag_index(problems: &[Problem]) -> Vec<String> {
  problems
    .iter()
    .filter_map(|p| p.tags.as_ref())
    .flatten()
    .cloned()
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}
