//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Storage/lookup key for a word: trimmed and case-folded.
pub fn normalize_word(word: &str) -> String {
  word.trim().to_lowercase()
}

/// Key for phrase lookups: case-folded, surrounding quotes and trailing punctuation dropped,
/// inner whitespace collapsed.
pub fn normalize_phrase(phrase: &str) -> String {
  let trimmed = phrase.trim().trim_matches(|c: char| {
    c.is_whitespace() || matches!(c, '"' | '«' | '»' | '„' | '“' | '”' | '\'' | '.' | '!' | '?' | '…' | ',' | ';')
  });
  trimmed
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Cut `s` to at most `max` characters (not bytes), appending `…` when something was cut.
pub fn preview(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
  }
}

/// Enforce the display budget: the result never exceeds `max` characters and ends
/// with `marker` whenever the input had to be cut.
pub fn truncate_for_display(s: &str, max: usize, marker: &str) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let keep = max.saturating_sub(marker.chars().count());
  let mut out: String = s.chars().take(keep).collect();
  out.push_str(marker);
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    format!("{}… ({} chars total)", s.chars().take(max).collect::<String>(), s.chars().count())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_all_keys() {
    let out = fill_template("Слово \"{word}\" ({word})", &[("word", "облом")]);
    assert_eq!(out, "Слово \"облом\" (облом)");
  }

  #[test]
  fn normalize_word_case_folds_cyrillic() {
    assert_eq!(normalize_word("  Метафора "), "метафора");
    assert_eq!(normalize_word("МЕТАФОРА"), normalize_word("метафора"));
  }

  #[test]
  fn normalize_phrase_ignores_quotes_and_final_punctuation() {
    assert_eq!(
      normalize_phrase("«В человеке  всё должно быть прекрасно»."),
      "в человеке всё должно быть прекрасно"
    );
  }

  #[test]
  fn preview_counts_chars_not_bytes() {
    assert_eq!(preview("вельми", 3), "вел…");
    assert_eq!(preview("фрак", 10), "фрак");
  }

  #[test]
  fn truncate_for_display_respects_budget_and_marks_cut() {
    let long = "я".repeat(5000);
    let out = truncate_for_display(&long, 4000, " [truncated]");
    assert_eq!(out.chars().count(), 4000);
    assert!(out.ends_with(" [truncated]"));

    let short = "коротко";
    assert_eq!(truncate_for_display(short, 4000, " [truncated]"), short);
  }
}
