//! Best-effort adapter that turns a model-written quiz block into typed questions.
//!
//! Expected shape (any number of sections, free text around them is ignored):
//!
//! ```text
//! ВОПРОС: ...
//! A) ...
//! B) ...
//! C) ...
//! D) ...
//! ПРАВИЛЬНЫЙ: B
//! ОБЪЯСНЕНИЕ: ...
//! ```
//!
//! The input is untrusted and non-deterministic. Lines inside a section may come in any order;
//! a section that does not yield exactly four options and a recognizable correct letter is
//! dropped. The output is lossy and is not validated further.

const QUESTION_TAG: &str = "ВОПРОС:";
const CORRECT_TAG: &str = "ПРАВИЛЬНЫЙ:";
const EXPLANATION_TAG: &str = "ОБЪЯСНЕНИЕ:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub correct_index: usize,
  pub explanation: String,
}

/// Latin letters plus their Cyrillic look-alikes (`А`, `В`, `С`), which models mix in when
/// writing Russian. `Б` and `Г` are accepted as the second and fourth letters.
fn letter_index(s: &str) -> Option<usize> {
  match s.trim().chars().next()? {
    'A' | 'a' | 'А' | 'а' => Some(0),
    'B' | 'b' | 'В' | 'в' | 'Б' | 'б' => Some(1),
    'C' | 'c' | 'С' | 'с' => Some(2),
    'D' | 'd' | 'Г' | 'г' => Some(3),
    _ => None,
  }
}

/// `A) text` / `A. text` → (0, "text").
fn option_line(line: &str) -> Option<(usize, String)> {
  let mut chars = line.chars();
  let letter = chars.next()?;
  let sep = chars.next()?;
  if sep != ')' && sep != '.' {
    return None;
  }
  let idx = letter_index(&letter.to_string())?;
  let text = chars.as_str().trim();
  if text.is_empty() {
    return None;
  }
  Some((idx, text.to_string()))
}

fn parse_section(section: &str) -> Option<ParsedQuestion> {
  let mut lines = section.lines().map(str::trim).filter(|l| !l.is_empty());
  let question = lines.next()?.to_string();

  let mut options: [Option<String>; 4] = Default::default();
  let mut correct = None;
  let mut explanation = String::new();

  for line in lines {
    if let Some(rest) = line.strip_prefix(CORRECT_TAG) {
      correct = letter_index(rest);
    } else if let Some(rest) = line.strip_prefix(EXPLANATION_TAG) {
      explanation = rest.trim().to_string();
    } else if let Some((idx, text)) = option_line(line) {
      if options[idx].is_none() {
        options[idx] = Some(text);
      }
    }
  }

  let options: Vec<String> = options.into_iter().collect::<Option<Vec<_>>>()?;
  Some(ParsedQuestion { question, options, correct_index: correct?, explanation })
}

pub fn parse_quiz_block(text: &str) -> Vec<ParsedQuestion> {
  text.split(QUESTION_TAG).skip(1).filter_map(parse_section).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  const BLOCK: &str = "Вот вопросы:\n\
    ВОПРОС: Кто автор «Обломова»?\n\
    A) Тургенев\nB) Гончаров\nC) Толстой\nD) Чехов\n\
    ПРАВИЛЬНЫЙ: B\n\
    ОБЪЯСНЕНИЕ: Роман написал И. А. Гончаров.\n\n\
    ВОПРОС: Сломанный вопрос\n\
    A) один\nB) два\n\
    ПРАВИЛЬНЫЙ: A\n\
    ВОПРОС: Что такое фрак?\n\
    ПРАВИЛЬНЫЙ: a\n\
    D) Шляпа\nC) Сапоги\nB) Плащ\nA) Парадный костюм\n";

  #[test]
  fn keeps_only_complete_sections() {
    let qs = parse_quiz_block(BLOCK);
    assert_eq!(qs.len(), 2);
    assert_eq!(qs[0].question, "Кто автор «Обломова»?");
    assert_eq!(qs[0].options[qs[0].correct_index], "Гончаров");
    assert_eq!(qs[0].explanation, "Роман написал И. А. Гончаров.");
  }

  #[test]
  fn section_lines_are_order_independent() {
    let qs = parse_quiz_block(BLOCK);
    assert_eq!(qs[1].options, vec!["Парадный костюм", "Плащ", "Сапоги", "Шляпа"]);
    assert_eq!(qs[1].correct_index, 0);
  }

  #[test]
  fn missing_correct_letter_drops_section() {
    let qs = parse_quiz_block("ВОПРОС: q\nA) 1\nB) 2\nC) 3\nD) 4\nПРАВИЛЬНЫЙ: ?\n");
    assert!(qs.is_empty());
  }

  #[test]
  fn cyrillic_look_alike_letters_match_latin_ones() {
    let qs = parse_quiz_block("ВОПРОС: q\nA) Тургенев\nB) Гончаров\nC) Толстой\nD) Чехов\nПРАВИЛЬНЫЙ: В\n");
    assert_eq!(qs[0].options[qs[0].correct_index], "Гончаров");

    let qs = parse_quiz_block("ВОПРОС: q\nА) Тургенев\nВ) Гончаров\nС) Толстой\nD) Чехов\nПРАВИЛЬНЫЙ: С\n");
    assert_eq!(qs.len(), 1);
    assert_eq!(qs[0].options, vec!["Тургенев", "Гончаров", "Толстой", "Чехов"]);
    assert_eq!(qs[0].options[qs[0].correct_index], "Толстой");
  }

  #[test]
  fn text_without_sections_yields_nothing() {
    assert!(parse_quiz_block("Извините, не могу помочь").is_empty());
  }
}
