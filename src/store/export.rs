//! CSV rendering of a user's dictionary.

use crate::domain::DictionaryEntry;

use super::{ts_to_sql, StorageError, StorageResult};

pub const CSV_HEADER: [&str; 5] = ["word", "explanation", "lookup_count", "first_seen", "last_seen"];

/// Result of exporting a dictionary. `Empty` is returned instead of a header-only table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Export {
  Empty,
  Csv(String),
}

impl Export {
  pub fn is_empty(&self) -> bool {
    matches!(self, Export::Empty)
  }
}

/// Every field is quoted; embedded quotes are doubled by the writer.
pub fn render_csv(entries: &[DictionaryEntry]) -> StorageResult<Export> {
  if entries.is_empty() {
    return Ok(Export::Empty);
  }

  let mut wtr = csv::WriterBuilder::new()
    .quote_style(csv::QuoteStyle::Always)
    .from_writer(Vec::new());

  wtr.write_record(CSV_HEADER).map_err(|e| StorageError::Export(e.to_string()))?;
  for e in entries {
    let count = e.lookup_count.to_string();
    let first = ts_to_sql(&e.first_seen);
    let last = ts_to_sql(&e.last_seen);
    wtr
      .write_record([e.word.as_str(), e.explanation.as_str(), count.as_str(), first.as_str(), last.as_str()])
      .map_err(|e| StorageError::Export(e.to_string()))?;
  }

  let bytes = wtr.into_inner().map_err(|e| StorageError::Export(e.to_string()))?;
  let text = String::from_utf8(bytes).map_err(|e| StorageError::Export(e.to_string()))?;
  Ok(Export::Csv(text))
}
