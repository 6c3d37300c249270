//! Document encodings: markdown, JSON, and PDF.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::models::Post;

use super::ExportError;

/// Encode posts as one markdown document, separated by horizontal rules.
pub fn to_markdown(posts: &[Post]) -> String {
    let mut out = String::new();
    for (i, post) in posts.iter().enumerate() {
        if i > 0 {
            out.push_str("\n---\n\n");
        }
        out.push_str(&format!("# {}\n\n", post.title));
        out.push_str(&format!("*{}* · `{}` · ${}\n\n", post.date, post.slug, post.cost));
        out.push_str(&post.content);
        out.push('\n');
        if !post.sources.is_empty() {
            out.push_str("\n### Sources\n\n");
            for source in &post.sources {
                out.push_str(&format!("- [{}]({})\n", source.name, source.link));
            }
        }
    }
    out
}

/// Encode posts as pretty-printed JSON.
pub fn to_json(posts: &[Post]) -> Result<Vec<u8>, ExportError> {
    serde_json::to_vec_pretty(posts).map_err(|e| ExportError::Encode {
        format: "json",
        message: e.to_string(),
    })
}

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 5.5;
const WRAP_COLUMNS: usize = 95;

/// Encode posts as a simple paginated PDF: titles in a larger face, body
/// text wrapped to the page width.
pub fn to_pdf(posts: &[Post]) -> Result<Vec<u8>, ExportError> {
    let encode = |message: String| ExportError::Encode {
        format: "pdf",
        message,
    };

    let (doc, page, layer) = PdfDocument::new(
        "Generated Posts",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let body_font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| encode(e.to_string()))?;
    let title_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| encode(e.to_string()))?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    let mut next_line = |current: &mut printpdf::PdfLayerReference, y: &mut f32| {
        *y -= LINE_HEIGHT_MM;
        if *y < MARGIN_MM {
            let (new_page, new_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            *current = doc.get_page(new_page).get_layer(new_layer);
            *y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    };

    for post in posts {
        current.use_text(&post.title, 16.0, Mm(MARGIN_MM), Mm(y), &title_font);
        next_line(&mut current, &mut y);
        current.use_text(
            format!("{} · {} · ${}", post.date, post.slug, post.cost),
            9.0,
            Mm(MARGIN_MM),
            Mm(y),
            &body_font,
        );
        next_line(&mut current, &mut y);
        next_line(&mut current, &mut y);

        for paragraph in post.content.lines() {
            if paragraph.trim().is_empty() {
                next_line(&mut current, &mut y);
                continue;
            }
            for line in wrap(paragraph, WRAP_COLUMNS) {
                current.use_text(line, 11.0, Mm(MARGIN_MM), Mm(y), &body_font);
                next_line(&mut current, &mut y);
            }
        }

        if !post.sources.is_empty() {
            next_line(&mut current, &mut y);
            current.use_text("Sources", 12.0, Mm(MARGIN_MM), Mm(y), &title_font);
            next_line(&mut current, &mut y);
            for source in &post.sources {
                let line = format!("{} - {}", source.name, source.link);
                current.use_text(line, 10.0, Mm(MARGIN_MM), Mm(y), &body_font);
                next_line(&mut current, &mut y);
            }
        }
        next_line(&mut current, &mut y);
        next_line(&mut current, &mut y);
    }

    doc.save_to_bytes().map_err(|e| encode(e.to_string()))
}

/// Greedy word wrap at a column budget. Overlong single words stay on
/// their own line rather than being split.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > columns {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_posts;
    use crate::models::Post;

    #[test]
    fn test_markdown_contains_title_and_sources() {
        let md = to_markdown(&sample_posts());
        assert!(md.contains("# A \"Quoted\" Title"));
        assert!(md.contains("- [Example](https://example.com)"));
        assert!(md.contains("## Introduction"));
    }

    #[test]
    fn test_json_round_trip() {
        let bytes = to_json(&sample_posts()).unwrap();
        let back: Vec<Post> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, sample_posts());
    }

    #[test]
    fn test_pdf_has_header_magic() {
        let bytes = to_pdf(&sample_posts()).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_wrap_respects_columns() {
        let lines = wrap("one two three four five six", 10);
        assert!(lines.iter().all(|l| l.len() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six");
    }

    #[test]
    fn test_wrap_keeps_overlong_word() {
        let lines = wrap("supercalifragilistic", 5);
        assert_eq!(lines, vec!["supercalifragilistic"]);
    }
}
