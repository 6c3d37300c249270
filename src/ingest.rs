//! Topic ingestion from uploaded tabular files or in-memory rows.
//!
//! The pipeline never performs runtime type discrimination on its input:
//! the surrounding layer (HTTP handler or CLI) wraps whatever it received in
//! an explicit [`TopicInput`] variant before calling [`parse_topics`].

use std::io::Cursor;

use calamine::{Reader, Xlsx};

use crate::models::Topic;

/// Supported upload encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Xlsx,
    Csv,
    Json,
}

impl InputKind {
    /// Infer the encoding from a filename and/or MIME type.
    pub fn detect(filename: &str, mime: Option<&str>) -> Option<Self> {
        let name = filename.to_lowercase();
        if name.ends_with(".xlsx") || name.ends_with(".xls") {
            return Some(InputKind::Xlsx);
        }
        if name.ends_with(".csv") {
            return Some(InputKind::Csv);
        }
        if name.ends_with(".json") {
            return Some(InputKind::Json);
        }
        match mime {
            Some(m) if m.contains("spreadsheetml") || m.contains("ms-excel") => {
                Some(InputKind::Xlsx)
            }
            Some(m) if m.contains("csv") => Some(InputKind::Csv),
            Some(m) if m.contains("json") => Some(InputKind::Json),
            _ => None,
        }
    }
}

/// Input to a batch job: raw uploaded bytes with a declared encoding, or
/// rows that were already parsed by the caller.
#[derive(Debug, Clone)]
pub enum TopicInput {
    RawBytes { data: Vec<u8>, kind: InputKind },
    Rows(Vec<Topic>),
}

/// Errors surfaced before any generation work starts.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no usable topic rows found in input")]
    Empty,
    #[error("input has no 'idea' or 'topic' column")]
    MissingIdeaColumn,
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("failed to read CSV input: {0}")]
    Csv(String),
    #[error("failed to read JSON input: {0}")]
    Json(String),
}

/// Parse an input into an ordered topic list. The first row of tabular
/// input is a header; an idea/topic column is required, a reference link
/// column optional. Rows with a blank idea are skipped; zero usable rows is
/// an input error.
pub fn parse_topics(input: TopicInput) -> Result<Vec<Topic>, IngestError> {
    let topics = match input {
        TopicInput::Rows(rows) => rows,
        TopicInput::RawBytes { data, kind } => match kind {
            InputKind::Xlsx => parse_xlsx(&data)?,
            InputKind::Csv => parse_csv(&data)?,
            InputKind::Json => parse_json(&data)?,
        },
    };
    if topics.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(topics)
}

/// Locate the idea column (required) and reference link column (optional)
/// in a header row.
fn find_columns(headers: &[String]) -> Result<(usize, Option<usize>), IngestError> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let idea = lowered
        .iter()
        .position(|h| h.contains("idea") || h.contains("topic"))
        .ok_or(IngestError::MissingIdeaColumn)?;
    let link = lowered
        .iter()
        .position(|h| h.contains("link") || h.contains("reference"));
    Ok((idea, link))
}

fn rows_to_topics(rows: Vec<Vec<String>>) -> Result<Vec<Topic>, IngestError> {
    let mut iter = rows.into_iter();
    let headers = iter.next().ok_or(IngestError::Empty)?;
    let (idea_col, link_col) = find_columns(&headers)?;

    Ok(iter
        .filter_map(|row| {
            let idea = row.get(idea_col)?;
            let link = link_col.and_then(|c| row.get(c)).map(String::as_str);
            Topic::new(idea, link)
        })
        .collect())
}

fn parse_xlsx(data: &[u8]) -> Result<Vec<Topic>, IngestError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(data)).map_err(|e| IngestError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Spreadsheet("workbook has no sheets".to_string()))?
        .map_err(|e| IngestError::Spreadsheet(e.to_string()))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    rows_to_topics(rows)
}

fn parse_csv(data: &[u8]) -> Result<Vec<Topic>, IngestError> {
    let text = std::str::from_utf8(data).map_err(|e| IngestError::Csv(e.to_string()))?;
    rows_to_topics(csv_rows(text))
}

/// Minimal RFC 4180 row splitter: quoted fields, doubled-quote escapes,
/// CRLF or LF line endings.
fn csv_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    if row.iter().any(|f| !f.trim().is_empty()) {
                        rows.push(std::mem::take(&mut row));
                    } else {
                        row.clear();
                    }
                }
                _ => field.push(ch),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        if row.iter().any(|f| !f.trim().is_empty()) {
            rows.push(row);
        }
    }
    rows
}

fn parse_json(data: &[u8]) -> Result<Vec<Topic>, IngestError> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_slice(data).map_err(|e| IngestError::Json(e.to_string()))?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let idea = row.iter().find_map(|(k, v)| {
                let key = k.to_lowercase();
                if key.contains("idea") || key.contains("topic") {
                    v.as_str()
                } else {
                    None
                }
            })?;
            let link = row.iter().find_map(|(k, v)| {
                let key = k.to_lowercase();
                if key.contains("link") || key.contains("reference") {
                    v.as_str()
                } else {
                    None
                }
            });
            Topic::new(idea, link)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(InputKind::detect("ideas.xlsx", None), Some(InputKind::Xlsx));
        assert_eq!(InputKind::detect("ideas.csv", None), Some(InputKind::Csv));
        assert_eq!(InputKind::detect("ideas.json", None), Some(InputKind::Json));
        assert_eq!(
            InputKind::detect("upload", Some("text/csv")),
            Some(InputKind::Csv)
        );
        assert_eq!(InputKind::detect("notes.txt", Some("text/plain")), None);
    }

    #[test]
    fn test_csv_with_quotes_and_optional_link() {
        let data = b"Blog Idea,Reference Link\n\"AI, but practical\",https://example.com\nPlain idea,\n";
        let topics = parse_topics(TopicInput::RawBytes {
            data: data.to_vec(),
            kind: InputKind::Csv,
        })
        .unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].idea, "AI, but practical");
        assert_eq!(
            topics[0].reference_link.as_deref(),
            Some("https://example.com")
        );
        assert!(topics[1].reference_link.is_none());
    }

    #[test]
    fn test_csv_missing_idea_column() {
        let data = b"Name,URL\nfoo,bar\n";
        let err = parse_topics(TopicInput::RawBytes {
            data: data.to_vec(),
            kind: InputKind::Csv,
        })
        .unwrap_err();
        assert!(matches!(err, IngestError::MissingIdeaColumn));
    }

    #[test]
    fn test_csv_header_only_is_empty() {
        let data = b"idea,link\n";
        let err = parse_topics(TopicInput::RawBytes {
            data: data.to_vec(),
            kind: InputKind::Csv,
        })
        .unwrap_err();
        assert!(matches!(err, IngestError::Empty));
    }

    #[test]
    fn test_json_rows_with_mixed_keys() {
        let data = br#"[
            {"idea": "First", "referenceLink": "https://a.example"},
            {"topic": "Second"},
            {"idea": "  "}
        ]"#;
        let topics = parse_topics(TopicInput::RawBytes {
            data: data.to_vec(),
            kind: InputKind::Json,
        })
        .unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].idea, "First");
        assert_eq!(topics[1].idea, "Second");
    }

    #[test]
    fn test_in_memory_rows_pass_through() {
        let rows = vec![Topic::new("A", None).unwrap()];
        let topics = parse_topics(TopicInput::Rows(rows)).unwrap();
        assert_eq!(topics[0].idea, "A");
    }

    #[test]
    fn test_blank_rows_skipped() {
        let data = b"idea\nA\n\n   \nB\n";
        let topics = parse_topics(TopicInput::RawBytes {
            data: data.to_vec(),
            kind: InputKind::Csv,
        })
        .unwrap();
        assert_eq!(topics.len(), 2);
    }
}
