//! Tabular encodings: xlsx and CSV.

use rust_xlsxwriter::{Format, Workbook};

use crate::models::Post;

use super::ExportError;

/// Fixed output columns for tabular exports.
pub const COLUMNS: [&str; 5] = ["Title", "Date", "Slug", "Content", "Cost($)"];

/// One row of cell values per post, matching [`COLUMNS`].
pub fn post_rows(posts: &[Post]) -> Vec<Vec<String>> {
    posts
        .iter()
        .map(|p| {
            vec![
                p.title.clone(),
                p.date.clone(),
                p.slug.clone(),
                p.content.clone(),
                p.cost.clone(),
            ]
        })
        .collect()
}

/// Encode posts as an xlsx workbook.
pub fn to_xlsx(posts: &[Post]) -> Result<Vec<u8>, ExportError> {
    let encode = |e: rust_xlsxwriter::XlsxError| ExportError::Encode {
        format: "xlsx",
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Generated Posts").map_err(encode)?;

    let bold = Format::new().set_bold();
    for (col, header) in COLUMNS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(encode)?;
    }
    for (row, cells) in post_rows(posts).iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            sheet
                .write_string(row as u32 + 1, col as u16, cell)
                .map_err(encode)?;
        }
    }
    // Wide columns for title and content, narrow for the rest.
    sheet.set_column_width(0, 40).map_err(encode)?;
    sheet.set_column_width(3, 80).map_err(encode)?;

    workbook.save_to_buffer().map_err(encode)
}

/// Encode posts as RFC 4180 CSV.
pub fn to_csv(posts: &[Post]) -> String {
    let mut out = String::new();
    push_csv_row(&mut out, &COLUMNS.map(String::from));
    for row in post_rows(posts) {
        push_csv_row(&mut out, &row);
    }
    out
}

fn push_csv_row(out: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}

/// Example workbook offered for download: five sample topic rows in the
/// expected upload shape.
pub fn sample_workbook() -> Result<Vec<u8>, ExportError> {
    let encode = |e: rust_xlsxwriter::XlsxError| ExportError::Encode {
        format: "xlsx",
        message: e.to_string(),
    };

    let samples = [
        (
            "The Future of Artificial Intelligence in Healthcare",
            "https://www.who.int/health-topics/artificial-intelligence",
        ),
        (
            "10 Essential Tips for Sustainable Living",
            "https://www.un.org/sustainabledevelopment/sustainable-consumption-production/",
        ),
        (
            "How to Start a Successful Online Business in 2024",
            "https://www.sba.gov/business-guide/10-steps-start-your-business",
        ),
        (
            "The Impact of Social Media on Mental Health",
            "https://www.nimh.nih.gov/health/topics/technology-and-the-brain",
        ),
        (
            "Beginners Guide to Cryptocurrency and Blockchain",
            "https://www.investopedia.com/terms/b/blockchain.asp",
        ),
    ];

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Blog Ideas").map_err(encode)?;

    let bold = Format::new().set_bold();
    sheet
        .write_string_with_format(0, 0, "Blog Idea", &bold)
        .map_err(encode)?;
    sheet
        .write_string_with_format(0, 1, "Reference Link", &bold)
        .map_err(encode)?;
    for (i, (idea, link)) in samples.iter().enumerate() {
        sheet.write_string(i as u32 + 1, 0, *idea).map_err(encode)?;
        sheet.write_string(i as u32 + 1, 1, *link).map_err(encode)?;
    }
    sheet.set_column_width(0, 50).map_err(encode)?;
    sheet.set_column_width(1, 50).map_err(encode)?;

    workbook.save_to_buffer().map_err(encode)
}
