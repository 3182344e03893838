//! Flowing A4 report of certificates that are expired or about to expire.

use std::path::PathBuf;

use chrono::NaiveDate;
use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Element, Margins, PaperSize};

use super::builder::{render_to_bytes, DocumentBuilder, PageFrame};
use super::RenderError;
use crate::model::{CertificateRow, ValidityStatus};
use crate::page::format_date;
use crate::status::EXPIRING_SOON_WINDOW_DAYS;

const REPORT_TITLE: &str = "Certificate Expiry Report";
const COLUMN_WEIGHTS: [usize; 5] = [3, 5, 3, 4, 3];
const FOOTER_HEIGHT_MM: i32 = 10;

fn cell(text: String) -> impl Element {
    Paragraph::new(text).padded(Margins::all(1))
}

fn header_cell(text: &str) -> impl Element {
    Paragraph::new(text).styled(Style::new().bold()).padded(Margins::all(1))
}

fn remaining_cell(row: &CertificateRow) -> String {
    let valid_until = format_date(Some(row.valid_until));
    match row.days_remaining {
        d if d < 0 => format!("{valid_until} ({} days ago)", -d),
        0 => format!("{valid_until} (today)"),
        d => format!("{valid_until} (in {d} days)"),
    }
}

fn certificate_table(rows: &[&CertificateRow]) -> Result<TableLayout, RenderError> {
    let mut table = TableLayout::new(COLUMN_WEIGHTS.to_vec());
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    table
        .row()
        .element(header_cell("Certificate #"))
        .element(header_cell("Establishment"))
        .element(header_cell("Barangay"))
        .element(header_cell("Type"))
        .element(header_cell("Valid Until"))
        .push()
        .map_err(RenderError::Layout)?;

    for row in rows {
        table
            .row()
            .element(cell(row.certificate_number.clone()))
            .element(cell(row.establishment_name.clone().unwrap_or_default()))
            .element(cell(row.barangay.clone().unwrap_or_default()))
            .element(cell(row.certificate_type.label()))
            .element(cell(remaining_cell(row)))
            .push()
            .map_err(RenderError::Layout)?;
    }

    Ok(table)
}

fn push_section(
    document: &mut genpdf::Document,
    heading: &str,
    rows: &[&CertificateRow],
) -> Result<(), RenderError> {
    document.push(Break::new(1));
    document.push(
        Paragraph::new(format!("{heading} ({})", rows.len()))
            .styled(Style::new().bold().with_font_size(14)),
    );
    document.push(Break::new(0.5));

    if rows.is_empty() {
        document.push(Paragraph::new("None.").styled(Style::new().italic()));
    } else {
        document.push(certificate_table(rows)?);
    }
    Ok(())
}

/// Renders the expiry report for `rows` as seen on `today`.
///
/// Rows that are revoked or still comfortably valid are skipped, so the
/// output of [`crate::store::CertificateStore::expiry_report`] can be passed
/// straight through.
pub fn render_expiry_report(
    rows: &[CertificateRow],
    today: NaiveDate,
    fonts_dir: Option<PathBuf>,
) -> Result<Vec<u8>, RenderError> {
    let expiring: Vec<&CertificateRow> = rows
        .iter()
        .filter(|row| row.status == ValidityStatus::ExpiringSoon)
        .collect();
    let expired: Vec<&CertificateRow> = rows
        .iter()
        .filter(|row| row.status == ValidityStatus::Expired)
        .collect();

    let frame = PageFrame::new(Margins::trbl(15, 15, 15, 15), FOOTER_HEIGHT_MM)
        .with_heading_line(REPORT_TITLE, Style::new().bold().with_font_size(16))
        .with_heading_line(format!("Generated {}", format_date(Some(today))), Style::new());
    let mut document = DocumentBuilder::new(REPORT_TITLE, PaperSize::A4)
        .with_fonts_dir(fonts_dir)
        .with_frame(frame)
        .build()?;

    document.push(Paragraph::new(format!(
        "{} certificate(s) expire within the next {} days and {} have already expired \
         without being renewed or revoked.",
        expiring.len(),
        EXPIRING_SOON_WINDOW_DAYS,
        expired.len()
    )));

    push_section(
        &mut document,
        &format!("Expiring within {EXPIRING_SOON_WINDOW_DAYS} days"),
        &expiring,
    )?;
    push_section(&mut document, "Expired", &expired)?;

    render_to_bytes(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CertificateType;

    fn row(days_remaining: i64) -> CertificateRow {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date");
        CertificateRow {
            id: 1,
            certificate_number: "FSIC-1".into(),
            certificate_type: CertificateType::Fsic,
            issue_date: None,
            valid_until: today + chrono::Duration::days(days_remaining),
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
            issued_by_name: None,
            revoked_by_name: None,
            establishment_name: None,
            establishment_type: None,
            barangay: None,
            address: None,
            owner_name: None,
            report_number: None,
            inspection_date: None,
            overall_compliance_score: None,
            risk_assessment: None,
            fire_hazard_level: None,
            days_remaining,
            status: ValidityStatus::ExpiringSoon,
        }
    }

    #[test]
    fn remaining_cell_describes_direction() {
        assert_eq!(remaining_cell(&row(5)), "Oct 22, 2026 (in 5 days)");
        assert_eq!(remaining_cell(&row(0)), "Oct 17, 2026 (today)");
        assert_eq!(remaining_cell(&row(-3)), "Oct 14, 2026 (3 days ago)");
    }
}
