//! Fixed-layout certificate page.
//!
//! The certificate is a single landscape A4 page drawn at absolute
//! positions. Coordinates are millimetres from the top-left page corner,
//! which is also the origin `genpdf` uses for a page area without margins.

use std::path::PathBuf;

use genpdf::elements::Paragraph;
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult};

use super::builder::{a4_landscape, render_to_bytes, DocumentBuilder};
use super::{mm_from_f64, RenderError};
use crate::model::CertificateDetail;

const ISSUING_OFFICE: &str = "FIRE & RESCUE MANAGEMENT SYSTEM";
const JURISDICTION: &str = "BARANGAY COMMONWEALTH, QUEZON CITY";
#[cfg(feature = "document-info")]
const DOCUMENT_AUTHOR: &str = "Barangay Commonwealth Fire & Rescue";
#[cfg(feature = "document-info")]
const DOCUMENT_SUBJECT: &str = "Fire Safety Certificate";
const COMPLIANCE_STATEMENT: &str = "Has been inspected and found to be in substantial compliance \
    with the Fire Code of the Philippines (RA 9514) and its implementing rules and regulations.";
const DISPLAY_NOTE: &str = "Note: This certificate is non-transferable and must be displayed \
    prominently on the premises.";
const VERIFICATION_NOTE: &str =
    "For verification, contact Barangay Commonwealth Fire & Rescue at (02) 1234-5678";
const SIGNATURE_LINE: &str = "___________________________";

const PAGE_WIDTH_MM: f64 = 297.0;
const RED: Color = Color::Rgb(220, 38, 38);
const BLACK: Color = Color::Rgb(0, 0, 0);

/// A rendered certificate ready to be streamed or saved.
#[derive(Clone, Debug)]
pub struct CertificatePdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Date as printed on the certificate, e.g. `October 7, 2026`.
fn long_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_owned())
}

fn score_text(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{score}%"),
        None => "N/A".to_owned(),
    }
}

/// Renders the printable certificate for `detail`.
pub fn render_certificate(
    detail: &CertificateDetail,
    fonts_dir: Option<PathBuf>,
) -> Result<CertificatePdf, RenderError> {
    let title = format!("Fire Safety Certificate - {}", detail.certificate_number);
    let mut document = DocumentBuilder::new(title, a4_landscape())
        .with_fonts_dir(fonts_dir)
        .build()?;
    document.push(CertificateLayout::new(detail.clone()));

    let bytes = render_to_bytes(document)?;

    #[cfg(feature = "document-info")]
    let bytes = super::info::apply_document_info(
        &bytes,
        &super::info::DocumentInfo {
            author: DOCUMENT_AUTHOR,
            subject: DOCUMENT_SUBJECT,
        },
    )?;

    Ok(CertificatePdf {
        file_name: format!("Certificate_{}.pdf", detail.certificate_number),
        bytes,
    })
}

/// A horizontal slot on the page that text is aligned within.
#[derive(Clone, Copy)]
struct Cell {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Cell {
    /// Full page width starting at `y`.
    fn row(y: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y,
            width: PAGE_WIDTH_MM,
            height,
        }
    }
}

/// Width of a stroke drawn without setting a line width: one point.
const HAIRLINE_MM: f64 = 0.3528;

/// A coloured line of a given thickness.
///
/// `genpdf` only strokes hairlines, so thicker lines are built from
/// overlapping hairlines offset across the requested width.
#[derive(Clone, Copy, Debug)]
struct Stroke {
    thickness: f64,
    color: Color,
}

impl Stroke {
    fn new(thickness: f64, color: Color) -> Self {
        Self { thickness, color }
    }

    /// Offsets of each hairline from the centre of the path.
    fn offsets(self) -> Vec<f64> {
        let span = self.thickness - HAIRLINE_MM;
        if span <= 0.0 {
            return vec![0.0];
        }
        let count = (span / (HAIRLINE_MM / 2.0)).ceil() as usize + 1;
        let step = span / (count - 1) as f64;
        (0..count).map(|i| step * i as f64 - span / 2.0).collect()
    }

    fn style(self) -> Style {
        Style::new().with_color(self.color)
    }
}

fn text_style(size: u8, color: Color) -> Style {
    Style::new().with_font_size(size).with_color(color)
}

/// Element drawing the whole certificate in one pass.
pub struct CertificateLayout {
    detail: CertificateDetail,
}

impl CertificateLayout {
    pub fn new(detail: CertificateDetail) -> Self {
        Self { detail }
    }

    fn type_heading(&self) -> String {
        self.detail.certificate_type.label().to_uppercase()
    }

    fn location_line(&self) -> String {
        format!(
            "Located at: {}, {}",
            self.detail.address.as_deref().unwrap_or_default(),
            self.detail.barangay.as_deref().unwrap_or_default()
        )
    }
}

fn point(x: f64, y: f64) -> Position {
    Position::new(mm_from_f64(x), mm_from_f64(y))
}

fn rectangle(
    area: &render::Area<'_>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    stroke: Stroke,
) {
    for d in stroke.offsets() {
        let (left, top) = (x - d, y - d);
        let (right, bottom) = (x + width + d, y + height + d);
        area.draw_line(
            vec![
                point(left, top),
                point(right, top),
                point(right, bottom),
                point(left, bottom),
                point(left, top),
            ],
            stroke.style(),
        );
    }
}

fn rule(area: &render::Area<'_>, x1: f64, x2: f64, y: f64, stroke: Stroke) {
    for d in stroke.offsets() {
        area.draw_line(vec![point(x1, y + d), point(x2, y + d)], stroke.style());
    }
}

/// Prints one line of text inside `cell`, vertically centred.
fn place_text(
    area: &render::Area<'_>,
    context: &genpdf::Context,
    text: &str,
    style: Style,
    cell: Cell,
    alignment: Alignment,
) -> Result<(), Error> {
    let width = StyledString::new(text.to_owned(), style).width(&context.font_cache);
    let cell_width = mm_from_f64(cell.width);
    let x_offset = match alignment {
        Alignment::Left => Mm::default(),
        Alignment::Center => (cell_width - width) / 2.0,
        Alignment::Right => cell_width - width,
    };
    let line_height = style.line_height(&context.font_cache);
    let y_offset = (mm_from_f64(cell.height) - line_height) / 2.0;

    let position = Position::new(
        mm_from_f64(cell.x) + x_offset,
        mm_from_f64(cell.y) + y_offset,
    );
    match area.text_section(&context.font_cache, position, style) {
        Some(mut section) => section.print_str(text, style),
        None => Err(Error::new(
            format!("Text '{}' does not fit on the certificate page", text),
            ErrorKind::PageSizeExceeded,
        )),
    }
}

impl Element for CertificateLayout {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let detail = &self.detail;
        rectangle(&area, 10.0, 10.0, 277.0, 190.0, Stroke::new(1.5, BLACK));
        rectangle(&area, 15.0, 15.0, 267.0, 180.0, Stroke::new(0.5, RED));

        let center = Alignment::Center;
        let heading = text_style(24, RED).bold();
        place_text(&area, context, ISSUING_OFFICE, heading, Cell::row(20.0, 10.0), center)?;
        place_text(
            &area,
            context,
            JURISDICTION,
            text_style(18, BLACK).bold(),
            Cell::row(32.0, 10.0),
            center,
        )?;
        place_text(
            &area,
            context,
            &self.type_heading(),
            text_style(28, RED).bold(),
            Cell::row(48.0, 10.0),
            center,
        )?;
        place_text(
            &area,
            context,
            &format!("CERTIFICATE NUMBER: {}", detail.certificate_number),
            text_style(16, BLACK).bold(),
            Cell::row(65.0, 10.0),
            center,
        )?;

        rule(&area, 30.0, 267.0, 78.0, Stroke::new(0.5, RED));

        let body = text_style(12, BLACK);
        place_text(
            &area,
            context,
            "This is to certify that:",
            body,
            Cell::row(85.0, 8.0),
            center,
        )?;
        place_text(
            &area,
            context,
            detail.establishment_name.as_deref().unwrap_or_default(),
            text_style(14, BLACK).bold(),
            Cell::row(100.0, 10.0),
            center,
        )?;
        place_text(&area, context, &self.location_line(), body, Cell::row(110.0, 8.0), center)?;
        place_text(
            &area,
            context,
            &format!(
                "Owner/Proprietor: {}",
                detail.owner_name.as_deref().unwrap_or_default()
            ),
            body,
            Cell::row(118.0, 8.0),
            center,
        )?;

        let mut statement_area = area.clone();
        statement_area.add_offset(Position::new(mm_from_f64(30.0), mm_from_f64(128.0)));
        statement_area.set_width(mm_from_f64(237.0));
        statement_area.set_height(mm_from_f64(18.0));
        let mut statement = Paragraph::new(COMPLIANCE_STATEMENT);
        statement.set_alignment(Alignment::Center);
        statement.render(
            context,
            statement_area,
            style.and(text_style(11, BLACK).italic()),
        )?;

        place_text(
            &area,
            context,
            &format!(
                "Overall Compliance Score: {}",
                score_text(detail.overall_compliance_score)
            ),
            text_style(12, BLACK).bold(),
            Cell::row(148.0, 8.0),
            center,
        )?;
        place_text(
            &area,
            context,
            &format!("Issued on: {}", long_date(detail.issue_date)),
            body,
            Cell::row(158.0, 8.0),
            center,
        )?;
        place_text(
            &area,
            context,
            &format!("Valid until: {}", long_date(Some(detail.valid_until))),
            body,
            Cell::row(166.0, 8.0),
            center,
        )?;

        rule(&area, 30.0, 267.0, 178.0, Stroke::new(0.5, RED));

        let signature = text_style(12, BLACK).bold();
        let caption = text_style(11, BLACK);
        for (x, title) in [(50.0, "Fire Safety Inspector"), (170.0, "Barangay Chairman")] {
            let line_cell = Cell {
                x,
                y: 182.0,
                width: 80.0,
                height: 8.0,
            };
            place_text(&area, context, SIGNATURE_LINE, signature, line_cell, center)?;
            place_text(
                &area,
                context,
                title,
                caption,
                Cell {
                    y: 190.0,
                    ..line_cell
                },
                center,
            )?;
        }

        let note = text_style(9, BLACK).italic();
        place_text(&area, context, DISPLAY_NOTE, note, Cell::row(200.0, 6.0), center)?;
        place_text(
            &area,
            context,
            VERIFICATION_NOTE,
            note,
            Cell::row(204.0, 6.0),
            center,
        )?;

        place_text(
            &area,
            context,
            "QR Code",
            text_style(8, BLACK),
            Cell {
                x: 260.0,
                y: 10.0,
                width: 25.0,
                height: 8.0,
            },
            Alignment::Right,
        )?;

        let mut result = RenderResult::default();
        result.size = area.size();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_date_spells_out_month() {
        assert_eq!(
            long_date(chrono::NaiveDate::from_ymd_opt(2026, 3, 9)),
            "March 9, 2026"
        );
        assert_eq!(long_date(None), "N/A");
    }

    #[test]
    fn thick_strokes_span_their_width() {
        let offsets = Stroke::new(1.5, BLACK).offsets();
        let span = 1.5 - HAIRLINE_MM;
        assert!(offsets.len() > 2);
        assert!((offsets[0] + span / 2.0).abs() < 1e-9);
        assert!((offsets[offsets.len() - 1] - span / 2.0).abs() < 1e-9);
        for pair in offsets.windows(2) {
            assert!(pair[1] - pair[0] <= HAIRLINE_MM / 2.0 + 1e-9);
        }
    }

    #[test]
    fn thin_strokes_draw_a_single_hairline() {
        assert_eq!(Stroke::new(0.2, RED).offsets(), vec![0.0]);
    }

    #[test]
    fn score_text_drops_trailing_zero_fraction() {
        assert_eq!(score_text(Some(85.0)), "85%");
        assert_eq!(score_text(Some(92.5)), "92.5%");
        assert_eq!(score_text(None), "N/A");
    }
}
