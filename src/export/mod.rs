//! Export of finished posts into the requested delivery format.
//!
//! The tabular formats share fixed columns: Title, Date, Slug, Content,
//! Cost($). Failure to encode is a terminal job error; generation work is
//! preserved by the caller, which may retry with another format.

mod document;
mod sheets;
mod spreadsheet;

pub use sheets::SheetsPublisher;
pub use spreadsheet::sample_workbook;

use crate::models::Post;

/// Requested output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Markdown,
    Json,
    Pdf,
    /// Publish to a shared cloud sheet instead of returning a file.
    GoogleSheets,
}

impl ExportFormat {
    /// Parse a user-supplied format tag. Unknown tags must fail the whole
    /// request before any generation work starts.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "xlsx" | "excel" | "spreadsheet" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            "markdown" | "md" => Some(ExportFormat::Markdown),
            "json" => Some(ExportFormat::Json),
            "pdf" => Some(ExportFormat::Pdf),
            "google_sheets" | "google-sheets" | "sheets" => Some(ExportFormat::GoogleSheets),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
            ExportFormat::GoogleSheets => "google_sheets",
        }
    }
}

/// An encoded export ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Errors from export and publishing.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode {format} export: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },
    #[error("Google Sheets publishing is not configured")]
    SheetsNotConfigured,
    #[error("failed to publish to Google Sheets: {0}")]
    Publish(String),
}

/// Encode posts as a downloadable file. `GoogleSheets` is not a file
/// format; it goes through [`SheetsPublisher`] instead.
pub fn export_posts(posts: &[Post], format: ExportFormat) -> Result<ExportedFile, ExportError> {
    let (bytes, filename, mime) = match format {
        ExportFormat::Xlsx => (
            spreadsheet::to_xlsx(posts)?,
            "generated_posts.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        ExportFormat::Csv => (
            spreadsheet::to_csv(posts).into_bytes(),
            "generated_posts.csv",
            "text/csv",
        ),
        ExportFormat::Markdown => (
            document::to_markdown(posts).into_bytes(),
            "generated_posts.md",
            "text/markdown",
        ),
        ExportFormat::Json => (
            document::to_json(posts)?,
            "generated_posts.json",
            "application/json",
        ),
        ExportFormat::Pdf => (
            document::to_pdf(posts)?,
            "generated_posts.pdf",
            "application/pdf",
        ),
        ExportFormat::GoogleSheets => {
            return Err(ExportError::Encode {
                format: "google_sheets",
                message: "cloud sheets are published, not encoded".to_string(),
            })
        }
    };
    Ok(ExportedFile {
        filename: filename.to_string(),
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceRef;

    pub(crate) fn sample_posts() -> Vec<Post> {
        vec![Post {
            title: "A \"Quoted\" Title".to_string(),
            date: "2026-08-27".to_string(),
            slug: "a-quoted-title".to_string(),
            content: "## Introduction\n\nBody, with commas.".to_string(),
            sources: vec![SourceRef {
                name: "Example".to_string(),
                link: "https://example.com".to_string(),
            }],
            cost: "0.09".to_string(),
        }]
    }

    #[test]
    fn test_parse_format_tags() {
        assert_eq!(ExportFormat::parse("xlsx"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("Spreadsheet"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("md"), Some(ExportFormat::Markdown));
        assert_eq!(
            ExportFormat::parse("google-sheets"),
            Some(ExportFormat::GoogleSheets)
        );
        assert_eq!(ExportFormat::parse("docx"), None);
        assert_eq!(ExportFormat::parse(""), None);
    }

    #[test]
    fn test_export_produces_named_files() {
        let posts = sample_posts();
        for (format, name) in [
            (ExportFormat::Csv, "generated_posts.csv"),
            (ExportFormat::Markdown, "generated_posts.md"),
            (ExportFormat::Json, "generated_posts.json"),
        ] {
            let file = export_posts(&posts, format).unwrap();
            assert_eq!(file.filename, name);
            assert!(!file.bytes.is_empty());
        }
    }

    #[test]
    fn test_sheets_is_not_a_file_export() {
        assert!(export_posts(&sample_posts(), ExportFormat::GoogleSheets).is_err());
    }
}
