//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Normalize an answer for comparison: trim and drop every whitespace char.
/// Comparison stays textual, so "4.2" and "42" never match.
pub fn normalize_answer(s: &str) -> String {
  s.trim().chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn answers_match(given: &str, expected: &str) -> bool {
  normalize_answer(given) == normalize_answer(expected)
}

/// Strip markdown code fences models like to wrap JSON in.
pub fn clean_json_response(s: &str) -> String {
  s.replace("```json", "").replace("```", "").trim().to_string()
}

/// Log-safe truncation for large strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    format!("{}… ({} bytes total)", s.chars().take(max).collect::<String>(), s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_strips_all_whitespace() {
    assert_eq!(normalize_answer(" 4 2 "), "42");
    assert_eq!(normalize_answer("42"), "42");
    assert_eq!(normalize_answer("  12 3"), "123");
    assert_eq!(normalize_answer("\t1\n0 "), "10");
  }

  #[test]
  fn normalize_keeps_punctuation() {
    assert_ne!(normalize_answer("4.2"), normalize_answer("42"));
    assert!(answers_match(" 4 2 ", "42"));
    assert!(!answers_match("042", "42"));
  }

  #[test]
  fn fences_are_removed() {
    let raw = "```json\n{\"question\": \"1+1\"}\n```";
    assert_eq!(clean_json_response(raw), "{\"question\": \"1+1\"}");
    assert_eq!(clean_json_response(" {} "), "{}");
  }

  #[test]
  fn template_fills_every_occurrence() {
    let out = fill_template("L{level} / {level} / {x}", &[("level", "2.4")]);
    assert_eq!(out, "L2.4 / 2.4 / {x}");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("√√√√√", 2);
    assert!(t.starts_with("√√…"));
  }
}
