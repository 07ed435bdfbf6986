//! Small utility helpers used across modules.

/// Log-safe truncation for large strings (char boundary aware).
/// Keeps error bodies from HTML error pages out of the logs and banners.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}

/// Pad or cut `s` to exactly `width` columns (by chars), for table output.
pub fn fit(s: &str, width: usize) -> String {
  let count = s.chars().count();
  if count <= width {
    format!("{s:<width$}")
  } else if width == 0 {
    String::new()
  } else {
    let mut out: String = s.chars().take(width - 1).collect();
    out.push('…');
    out
  }
}
