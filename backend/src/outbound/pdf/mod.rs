//! Single-page PDF certificate renderer.
//!
//! Writes a PDF 1.4 document by hand: catalogue, page tree, one landscape
//! A4 page, the built-in Helvetica font, and a text content stream. The
//! cross-reference table records the byte offset of every object.

use std::fmt::Write as _;

use crate::domain::CertificateDocument;
use crate::domain::ports::{CertificateRenderError, CertificateRenderer};

const PAGE_WIDTH: u32 = 842;
const PAGE_HEIGHT: u32 = 595;

/// Renders certificates as application/pdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfCertificateRenderer;

impl CertificateRenderer for PdfCertificateRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, document: &CertificateDocument) -> Result<Vec<u8>, CertificateRenderError> {
        let content = content_stream(document)?;
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_owned(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_owned(),
            format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ),
        ];
        Ok(assemble(&objects))
    }
}

struct Line<'a> {
    size: u32,
    y: u32,
    text: &'a str,
}

fn content_stream(document: &CertificateDocument) -> Result<String, CertificateRenderError> {
    let issued = document.issued_at.format("%B %-d, %Y").to_string();
    let completion = format!("has successfully completed {}", document.course_title);
    let instructor = format!("Instructor: {}", document.instructor_name);
    let footer = format!(
        "Certificate {} - issued {issued}",
        document.certificate_number.as_str()
    );
    let lines = [
        Line { size: 32, y: 440, text: "Certificate of Completion" },
        Line { size: 14, y: 390, text: "This certifies that" },
        Line { size: 26, y: 345, text: &document.student_name },
        Line { size: 14, y: 300, text: &completion },
        Line { size: 12, y: 220, text: &instructor },
        Line { size: 10, y: 80, text: &footer },
    ];

    let mut stream = String::new();
    for line in lines {
        // Helvetica averages roughly half an em per glyph.
        let approx_width = line.text.chars().count() as u32 * line.size / 2;
        let x = PAGE_WIDTH.saturating_sub(approx_width) / 2;
        writeln!(
            stream,
            "BT /F1 {} Tf {x} {} Td ({}) Tj ET",
            line.size,
            line.y,
            escape(line.text)
        )
        .map_err(|err| CertificateRenderError::render(err.to_string()))?;
    }
    Ok(stream.trim_end().to_owned())
}

/// Escape a string for a PDF literal. Characters outside printable ASCII
/// are replaced because the built-in font has no embedded glyph table.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ' '..='~' => escaped.push(ch),
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn assemble(objects: &[String]) -> Vec<u8> {
    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", index + 1));
    }
    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{CertificateNumber, IssuancePeriod};

    #[fixture]
    fn document() -> CertificateDocument {
        let issued_at = Utc
            .with_ymd_and_hms(2026, 4, 9, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        CertificateDocument {
            certificate_number: CertificateNumber::new(IssuancePeriod::containing(issued_at), 7),
            student_name: "Ada (Countess) Lovelace".to_owned(),
            course_title: "Analytical Engines".to_owned(),
            instructor_name: "Charles Babbage".to_owned(),
            issued_at,
        }
    }

    fn render(document: &CertificateDocument) -> String {
        let bytes = PdfCertificateRenderer.render(document).expect("render");
        String::from_utf8(bytes).expect("ascii output")
    }

    #[rstest]
    fn output_is_a_pdf_with_certificate_text(document: CertificateDocument) {
        let pdf = render(&document);

        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("(has successfully completed Analytical Engines)"));
        assert!(pdf.contains("CERT-202604-0007"));
        assert!(pdf.contains("April 9, 2026"));
        assert_eq!(PdfCertificateRenderer.content_type(), "application/pdf");
    }

    #[rstest]
    fn parentheses_are_escaped(document: CertificateDocument) {
        let pdf = render(&document);

        assert!(pdf.contains(r"(Ada \(Countess\) Lovelace)"));
    }

    #[rstest]
    fn xref_offsets_point_at_objects(document: CertificateDocument) {
        let pdf = render(&document);
        let start = pdf.rfind("startxref\n").expect("startxref") + "startxref\n".len();
        let xref_offset: usize = pdf[start..]
            .lines()
            .next()
            .and_then(|line| line.parse().ok())
            .expect("xref offset");
        assert!(pdf[xref_offset..].starts_with("xref\n0 6\n"));

        let entries: Vec<usize> = pdf[xref_offset..]
            .lines()
            .skip(3)
            .take(5)
            .map(|line| line[..10].parse().expect("offset"))
            .collect();
        for (index, offset) in entries.into_iter().enumerate() {
            assert!(pdf[offset..].starts_with(&format!("{} 0 obj\n", index + 1)));
        }
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case(r"back\slash", r"back\\slash")]
    #[case("Zoë", "Zo?")]
    fn escape_handles_special_characters(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape(input), expected);
    }
}
