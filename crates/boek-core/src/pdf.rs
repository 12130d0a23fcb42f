//! Minimal PDF table export
//!
//! Produces a self-contained PDF 1.4 document (landscape A4, Helvetica) with
//! a heading and the table rows, repeating the header row on every page.
//! No external PDF library is involved; text is written in WinAnsi encoding
//! and characters outside Latin-1 are replaced by `?`.

use crate::table::Table;
use chrono::Utc;

const PAGE_WIDTH: f64 = 841.89;
const PAGE_HEIGHT: f64 = 595.28;
/// 1.5 cm
const MARGIN: f64 = 42.52;
const FONT_SIZE: f64 = 9.0;
const TITLE_SIZE: f64 = 16.0;
const ROW_HEIGHT: f64 = 16.0;
const CELL_PADDING: f64 = 3.0;
/// Average Helvetica glyph width relative to the font size
const CHAR_WIDTH: f64 = 0.5;
/// Header background (#4F81BD)
const HEADER_RGB: (f64, f64, f64) = (0.310, 0.506, 0.741);

/// Render the given table as a PDF document
pub fn render_catalog(table: &Table, title: &str) -> Vec<u8> {
    let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
    render_table(&columns, &table.to_string_rows(), title)
}

/// Render a header row and data rows as a paginated PDF table
pub fn render_table(columns: &[String], rows: &[Vec<String>], title: &str) -> Vec<u8> {
    let heading = format!("Boekenlijst - {}", title);
    let pages = paginate(rows);

    // Objects: 1 catalog, 2 pages, 3 regular font, 4 bold font, 5 info,
    // then a (page, content) pair per page.
    let page_count = pages.len();
    let first_page_obj = 6;
    let mut objects: Vec<Vec<u8>> = Vec::with_capacity(5 + page_count * 2);

    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_obj + i * 2))
        .collect();
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        )
        .into_bytes(),
    );

    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    let mut info = b"<< /Title (".to_vec();
    info.extend(escape_text(&heading));
    info.extend(
        format!(
            ") /Producer (boek-core) /CreationDate (D:{}) >>",
            Utc::now().format("%Y%m%d%H%M%S")
        )
        .into_bytes(),
    );
    objects.push(info);

    for (index, page_rows) in pages.iter().enumerate() {
        let page_obj = first_page_obj + index * 2;
        let stream = page_stream(columns, page_rows, (index == 0).then_some(heading.as_str()));

        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>",
                PAGE_WIDTH,
                PAGE_HEIGHT,
                page_obj + 1
            )
            .into_bytes(),
        );

        let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend(stream);
        content.extend(b"\nendstream");
        objects.push(content);
    }

    assemble(&objects)
}

/// Split rows into pages; the first page has room for the heading
fn paginate(rows: &[Vec<String>]) -> Vec<&[Vec<String>]> {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN;
    // one slot is the header row
    let per_page = ((usable / ROW_HEIGHT) as usize).saturating_sub(1).max(1);
    let first_page = ((usable - TITLE_SIZE * 2.0) / ROW_HEIGHT) as usize;
    let first_page = first_page.saturating_sub(1).max(1);

    let mut pages = Vec::new();
    let (head, mut rest) = rows.split_at(first_page.min(rows.len()));
    pages.push(head);
    while !rest.is_empty() {
        let (page, tail) = rest.split_at(per_page.min(rest.len()));
        pages.push(page);
        rest = tail;
    }
    pages
}

fn page_stream(columns: &[String], rows: &[Vec<String>], heading: Option<&str>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    if let Some(heading) = heading {
        y -= TITLE_SIZE;
        text(&mut out, "F2", TITLE_SIZE, MARGIN, y, heading);
        y -= TITLE_SIZE;
    }

    let col_count = columns.len().max(1);
    let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / col_count as f64;
    let max_chars = (((col_width - 2.0 * CELL_PADDING) / (FONT_SIZE * CHAR_WIDTH)) as usize).max(1);

    // header row
    y -= ROW_HEIGHT;
    let (r, g, b) = HEADER_RGB;
    out.extend(
        format!(
            "{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re f\n0 0 0 rg\n",
            r,
            g,
            b,
            MARGIN,
            y,
            PAGE_WIDTH - 2.0 * MARGIN,
            ROW_HEIGHT
        )
        .into_bytes(),
    );
    out.extend(b"1 1 1 rg\n");
    for (i, name) in columns.iter().enumerate() {
        let x = MARGIN + i as f64 * col_width + CELL_PADDING;
        text(&mut out, "F2", FONT_SIZE, x, y + 5.0, &truncate(&capitalize(name), max_chars));
    }
    out.extend(b"0 0 0 rg\n");

    for row in rows {
        y -= ROW_HEIGHT;
        for i in 0..columns.len() {
            let value = row.get(i).map(String::as_str).unwrap_or("");
            let x = MARGIN + i as f64 * col_width + CELL_PADDING;
            text(&mut out, "F1", FONT_SIZE, x, y + 5.0, &truncate(value, max_chars));
        }
    }

    // grid
    let top = y + ROW_HEIGHT * (rows.len() + 1) as f64;
    out.extend(b"0.5 0.5 0.5 RG 0.25 w\n");
    for line in 0..=rows.len() + 1 {
        let ly = top - line as f64 * ROW_HEIGHT;
        out.extend(format!("{:.2} {:.2} m {:.2} {:.2} l S\n", MARGIN, ly, PAGE_WIDTH - MARGIN, ly).into_bytes());
    }
    for col in 0..=col_count {
        let lx = MARGIN + col as f64 * col_width;
        out.extend(format!("{:.2} {:.2} m {:.2} {:.2} l S\n", lx, top, lx, y).into_bytes());
    }

    out
}

fn text(out: &mut Vec<u8>, font: &str, size: f64, x: f64, y: f64, s: &str) {
    out.extend(format!("BT /{} {:.1} Tf {:.2} {:.2} Td (", font, size, x, y).into_bytes());
    out.extend(escape_text(s));
    out.extend(b") Tj ET\n");
}

fn capitalize(s: &str) -> String {
    crate::normalize::capitalize_first(s)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Encode as Latin-1 and escape PDF string delimiters
fn escape_text(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let byte = match c {
            '\n' | '\r' | '\t' => b' ',
            c if (c as u32) < 0x20 => continue,
            c if (c as u32) < 0x100 => c as u32 as u8,
            _ => b'?',
        };
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

/// Lay out numbered objects, the xref table and the trailer
fn assemble(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend(format!("{} 0 obj\n", i + 1).into_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = pdf.len();
    pdf.extend(format!("xref\n0 {}\n", objects.len() + 1).into_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for pos in &offsets {
        pdf.extend(format!("{:010} 00000 n \n", pos).into_bytes());
    }
    pdf.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .into_bytes(),
    );
    pdf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| vec![format!("Boek {}", i), "Auteur".to_string()])
            .collect()
    }

    fn columns() -> Vec<String> {
        vec!["titel".to_string(), "auteur".to_string()]
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_document_structure() {
        let pdf = render_table(&columns(), &rows(3), "Huidige selectie");

        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert_eq!(count(&pdf, b"/Type /Page "), 1);
        assert_eq!(count(&pdf, b"(Boekenlijst - Huidige selectie)"), 2);
        assert_eq!(count(&pdf, b"(Boek 2)"), 1);
    }

    #[test]
    fn test_paginates_and_repeats_header() {
        let pdf = render_table(&columns(), &rows(100), "Alles");
        let pages = count(&pdf, b"/Type /Page ");

        assert!(pages > 1);
        assert_eq!(count(&pdf, b"(Titel)"), pages);
        assert_eq!(count(&pdf, b"(Boek 99)"), 1);
        assert!(pdf
            .windows(b"/Count ".len())
            .any(|w| w == b"/Count "));
    }

    #[test]
    fn test_empty_table_still_one_page() {
        let pdf = render_table(&columns(), &[], "Leeg");
        assert_eq!(count(&pdf, b"/Type /Page "), 1);
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = render_table(&columns(), &rows(2), "X");
        let text = String::from_utf8_lossy(&pdf);
        let xref = text.find("xref\n").unwrap();
        let first_entry = &text[xref..].lines().nth(3).unwrap()[..10];
        let offset: usize = first_entry.parse().unwrap();
        assert!(pdf[offset..].starts_with(b"1 0 obj"));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a(b)c\\"), b"a\\(b\\)c\\\\".to_vec());
        assert_eq!(escape_text("één"), vec![0xE9, 0xE9, b'n']);
        assert_eq!(escape_text("日本"), b"??".to_vec());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("kort", 10), "kort");
        assert_eq!(truncate("een hele lange titel", 10), "een hel...");
    }
}
