//! HTML rendering for the certificate listing page.
//!
//! The markup is deliberately plain: class names carry the structure and
//! styling lives elsewhere. Every value that originates from the database or
//! the query string goes through [`escape`].

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::filter::{CertificateFilter, IssuedWithin};
use crate::model::{
    capitalize, CertificateRow, CertificateStats, CertificateType, User, ValidityStatus,
};

/// Longest revocation reason shown inline before truncation.
pub const REASON_PREVIEW_CHARS: usize = 50;

/// Path the page is served from; links and forms point here.
pub const PAGE_PATH: &str = "/certificates";

/// Escapes text for use in element content and quoted attributes.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn escape_opt(value: Option<&str>) -> String {
    escape(value.unwrap_or_default())
}

/// `Oct 7, 2026`, or `N/A` when the date is missing.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "N/A".to_owned(),
    }
}

/// Badge text for a status, e.g. `Expiring soon (12 days)`.
pub fn status_badge_text(status: ValidityStatus, days_remaining: i64) -> String {
    let mut text = capitalize(&status.code().replace('_', " "));
    if status == ValidityStatus::ExpiringSoon && days_remaining > 0 {
        let _ = write!(text, " ({days_remaining} days)");
    }
    text
}

/// `N days remaining` while positive, otherwise `Expired N days ago`.
pub fn remaining_text(days_remaining: i64) -> String {
    if days_remaining > 0 {
        format!("{days_remaining} days remaining")
    } else {
        format!("Expired {} days ago", days_remaining.abs())
    }
}

/// First [`REASON_PREVIEW_CHARS`] characters of a reason, with `...` when cut.
pub fn reason_preview(reason: &str) -> String {
    let mut chars = reason.chars();
    let preview: String = chars.by_ref().take(REASON_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Whether the revoke action is offered for a row.
pub fn can_revoke(row: &CertificateRow) -> bool {
    !row.revoked && row.status != ValidityStatus::Expired
}

/// Everything the listing page displays.
pub struct ListingPage<'a> {
    pub user: &'a User,
    pub filter: &'a CertificateFilter,
    pub certificates: &'a [CertificateRow],
    pub stats: &'a CertificateStats,
    pub barangays: &'a [String],
    pub establishment_types: &'a [String],
    pub success_message: Option<&'a str>,
}

const STATUS_TABS: [(Option<ValidityStatus>, &str); 5] = [
    (None, "All"),
    (Some(ValidityStatus::Valid), "Valid"),
    (Some(ValidityStatus::ExpiringSoon), "Expiring Soon"),
    (Some(ValidityStatus::Expired), "Expired"),
    (Some(ValidityStatus::Revoked), "Revoked"),
];

impl ListingPage<'_> {
    /// Renders the complete HTML document.
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(16 * 1024);
        html.push_str(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
             <title>Issue Certificates</title>\n</head>\n<body>\n",
        );
        self.render_header(&mut html);
        self.render_success(&mut html);
        self.render_stats(&mut html);
        self.render_tabs(&mut html);
        self.render_filters(&mut html);
        self.render_table(&mut html);
        render_revoke_form(&mut html);
        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_header(&self, html: &mut String) {
        let full_name = self.user.full_name();
        let initial = full_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect::<String>())
            .unwrap_or_default();
        let _ = write!(
            html,
            "<header class=\"user-profile\" data-initial=\"{}\">\
             <p class=\"user-name\">{}</p><p class=\"user-role\">{}</p></header>\n",
            escape(&initial),
            escape(&full_name),
            escape(&self.user.role),
        );
    }

    fn render_success(&self, html: &mut String) {
        if let Some(message) = self.success_message.filter(|m| !m.is_empty()) {
            let _ = writeln!(
                html,
                "<div class=\"alert alert-success\">{}</div>",
                escape(message)
            );
        }
    }

    fn render_stats(&self, html: &mut String) {
        let cards = [
            ("total", "Total Certificates", self.stats.total),
            ("valid", "Valid", self.stats.valid),
            ("expiring_soon", "Expiring Soon", self.stats.expiring_soon),
            ("expired", "Expired", self.stats.expired),
            ("fsic", "FSIC", self.stats.fsic),
            ("compliance", "Compliance", self.stats.compliance),
            ("provisional", "Provisional", self.stats.provisional),
            ("exemption", "Exemption", self.stats.exemption),
        ];

        html.push_str("<section class=\"stats-grid\">\n");
        for (kind, label, value) in cards {
            let _ = writeln!(
                html,
                "<div class=\"stat-card\" data-type=\"{kind}\">\
                 <div class=\"stat-value\">{value}</div><div class=\"stat-label\">{label}</div></div>"
            );
        }
        html.push_str("</section>\n");
    }

    fn render_tabs(&self, html: &mut String) {
        html.push_str("<nav class=\"filter-tabs\">\n");
        for (status, label) in STATUS_TABS {
            let active = if self.filter.status == status {
                " active"
            } else {
                ""
            };
            let _ = writeln!(
                html,
                "<a href=\"{PAGE_PATH}?{}\" class=\"filter-tab{active}\">{label} \
                 <span class=\"filter-tab-count\">{}</span></a>",
                escape(&self.filter.query_string_with_status(status)),
                self.stats.for_status(status),
            );
        }
        html.push_str("</nav>\n");
    }

    fn render_filters(&self, html: &mut String) {
        let _ = writeln!(
            html,
            "<form id=\"filter-form\" method=\"get\" action=\"{PAGE_PATH}\">"
        );

        let selected_date = self.filter.issued.map(IssuedWithin::code).unwrap_or("");
        let mut date_options = vec![(String::new(), "All Dates".to_owned())];
        date_options.extend(
            IssuedWithin::ALL
                .iter()
                .map(|d| (d.code().to_owned(), d.label().to_owned())),
        );
        render_select(html, "date", &date_options, selected_date);

        let selected_barangay = self.filter.barangay.as_deref().unwrap_or("");
        let mut barangay_options = vec![(String::new(), "All Barangays".to_owned())];
        barangay_options.extend(self.barangays.iter().map(|b| (b.clone(), b.clone())));
        render_select(html, "barangay", &barangay_options, selected_barangay);

        let selected_type = self.filter.establishment_type.as_deref().unwrap_or("");
        let mut type_options = vec![(String::new(), "All Types".to_owned())];
        type_options.extend(
            self.establishment_types
                .iter()
                .map(|t| (t.clone(), t.clone())),
        );
        render_select(html, "establishment_type", &type_options, selected_type);

        let selected_certificate = self
            .filter
            .certificate_type
            .as_ref()
            .map(CertificateType::code)
            .unwrap_or("");
        let mut certificate_options = vec![(String::new(), "All Certificate Types".to_owned())];
        certificate_options.extend(
            CertificateType::KNOWN
                .iter()
                .map(|t| (t.code().to_owned(), t.label())),
        );
        render_select(
            html,
            "certificate_type",
            &certificate_options,
            selected_certificate,
        );

        let _ = writeln!(
            html,
            "<input type=\"text\" name=\"search\" placeholder=\"Search by certificate number, \
             establishment name, owner...\" value=\"{}\">",
            escape_opt(self.filter.search.as_deref())
        );
        let _ = writeln!(
            html,
            "<input type=\"hidden\" name=\"status\" value=\"{}\">",
            self.filter.status.map_or("all", ValidityStatus::code)
        );
        let _ = writeln!(
            html,
            "<button type=\"submit\">Apply</button> \
             <a href=\"{PAGE_PATH}\" class=\"clear-filters\">Clear</a>\n</form>"
        );
    }

    fn render_table(&self, html: &mut String) {
        html.push_str(
            "<table class=\"certificates\">\n<thead><tr><th>Certificate #</th><th>Establishment</th>\
             <th>Certificate Type</th><th>Issue Date</th><th>Valid Until</th><th>Status</th>\
             <th>Issued By</th><th>Actions</th></tr></thead>\n<tbody>\n",
        );

        if self.certificates.is_empty() {
            html.push_str("<tr class=\"empty\"><td colspan=\"8\">No certificates found</td></tr>\n");
        }

        for row in self.certificates {
            render_row(html, row);
        }

        html.push_str("</tbody>\n</table>\n");
    }
}

fn render_select(html: &mut String, name: &str, options: &[(String, String)], selected: &str) {
    let _ = writeln!(html, "<select name=\"{name}\">");
    for (value, label) in options {
        let marker = if value == selected { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{}\"{marker}>{}</option>",
            escape(value),
            escape(label)
        );
    }
    html.push_str("</select>\n");
}

fn render_row(html: &mut String, row: &CertificateRow) {
    html.push_str("<tr class=\"table-row\">\n");

    let _ = write!(
        html,
        "<td data-label=\"Certificate #\"><div class=\"certificate-number\">{}</div>",
        escape(&row.certificate_number)
    );
    if row.revoked {
        html.push_str("<div class=\"revoked-marker\">Revoked</div>");
    }
    html.push_str("</td>\n");

    let _ = writeln!(
        html,
        "<td data-label=\"Establishment\"><div class=\"establishment-name\">{}</div>\
         <div class=\"establishment-info\">{} &bull; {}</div>\
         <div class=\"establishment-info\">Owner: {}</div></td>",
        escape_opt(row.establishment_name.as_deref()),
        escape_opt(row.establishment_type.as_deref()),
        escape_opt(row.barangay.as_deref()),
        escape_opt(row.owner_name.as_deref()),
    );

    let _ = write!(
        html,
        "<td data-label=\"Certificate Type\"><span class=\"certificate-type-badge certificate-type-{}\">{}</span>",
        escape(row.certificate_type.code()),
        escape(&row.certificate_type.label()),
    );
    if let Some(report) = row.report_number.as_deref().filter(|r| !r.is_empty()) {
        let _ = write!(html, "<div class=\"report-number\">Report: {}</div>", escape(report));
    }
    html.push_str("</td>\n");

    let _ = write!(
        html,
        "<td data-label=\"Issue Date\"><div class=\"date\">{}</div>",
        format_date(row.issue_date)
    );
    if row.inspection_date.is_some() {
        let _ = write!(
            html,
            "<div class=\"inspected\">Inspected: {}</div>",
            format_date(row.inspection_date)
        );
    }
    html.push_str("</td>\n");

    let _ = write!(
        html,
        "<td data-label=\"Valid Until\"><div class=\"date\">{}</div>",
        format_date(Some(row.valid_until))
    );
    if row.status != ValidityStatus::Revoked {
        let tone = if row.days_remaining <= 30 {
            "warning"
        } else {
            "success"
        };
        let _ = write!(
            html,
            "<div class=\"remaining {tone}\">{}</div>",
            remaining_text(row.days_remaining)
        );
    }
    html.push_str("</td>\n");

    let _ = write!(
        html,
        "<td data-label=\"Status\"><span class=\"status-badge status-{}\">{}</span>",
        row.status.code(),
        status_badge_text(row.status, row.days_remaining)
    );
    if row.revoked {
        if let Some(reason) = row.revoked_reason.as_deref().filter(|r| !r.is_empty()) {
            let _ = write!(
                html,
                "<div class=\"revoked-reason\">Reason: {}</div>",
                escape(&reason_preview(reason))
            );
        }
    }
    html.push_str("</td>\n");

    let _ = write!(
        html,
        "<td data-label=\"Issued By\"><div class=\"issuer\">{}</div>",
        escape_opt(row.issued_by_name.as_deref())
    );
    if let Some(revoker) = row.revoked_by_name.as_deref() {
        let _ = write!(html, "<div class=\"revoker\">Revoked by: {}</div>", escape(revoker));
    }
    html.push_str("</td>\n");

    let _ = write!(
        html,
        "<td data-label=\"Actions\"><a href=\"{PAGE_PATH}?generate_certificate={}\" target=\"_blank\" \
         class=\"action-button download-button\">Download</a>",
        row.id
    );
    if can_revoke(row) {
        let _ = write!(
            html,
            "<button type=\"button\" class=\"action-button revoke-button\" \
             data-certificate-id=\"{}\">Revoke</button>",
            row.id
        );
    }
    html.push_str("</td>\n</tr>\n");
}

fn render_revoke_form(html: &mut String) {
    let _ = writeln!(
        html,
        "<form id=\"revoke-certificate-form\" method=\"post\" action=\"{PAGE_PATH}\">\n\
         <input type=\"hidden\" name=\"revoke_certificate\" value=\"1\">\n\
         <input type=\"hidden\" id=\"revoke-certificate-id\" name=\"certificate_id\">\n\
         <label for=\"revoked_reason\">Reason for Revocation</label>\n\
         <textarea id=\"revoked_reason\" name=\"revoked_reason\" \
         placeholder=\"Enter the reason for revoking this certificate...\" required></textarea>\n\
         <button type=\"submit\">Revoke Certificate</button>\n</form>"
    );
}
