//! Parametrized SQL filter for the certificate listing.
//!
//! Raw query parameters are parsed into a typed [`CertificateFilter`], which
//! then renders a `WHERE` clause with positional `?` placeholders and the
//! matching parameter values. User input never reaches the SQL text.

use chrono::{Duration, NaiveDate};
use log::debug;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::model::{CertificateType, ValidityStatus};
use crate::status::expiring_soon_horizon;

/// Raw filter parameters as they arrive in the query string.
///
/// Empty or whitespace-only values mean "not set".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barangay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establishment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_type: Option<String>,
}

/// Issue-date window relative to today.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuedWithin {
    Today,
    Yesterday,
    Week,
    Month,
    Year,
}

impl IssuedWithin {
    /// All windows in the order they are offered to users.
    pub const ALL: [IssuedWithin; 5] = [
        IssuedWithin::Today,
        IssuedWithin::Yesterday,
        IssuedWithin::Week,
        IssuedWithin::Month,
        IssuedWithin::Year,
    ];

    /// Parses the `date` query parameter.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::Week => "Last 7 Days",
            Self::Month => "Last 30 Days",
            Self::Year => "Last Year",
        }
    }

    /// Builds the clause for this window against `today`.
    fn clause(self, today: NaiveDate) -> (&'static str, NaiveDate) {
        match self {
            Self::Today => ("DATE(ic.issue_date) = ?", today),
            Self::Yesterday => ("DATE(ic.issue_date) = ?", today - Duration::days(1)),
            Self::Week => ("DATE(ic.issue_date) >= ?", today - Duration::days(7)),
            Self::Month => ("DATE(ic.issue_date) >= ?", today - Duration::days(30)),
            Self::Year => ("DATE(ic.issue_date) >= ?", today - Duration::days(365)),
        }
    }
}

/// A `WHERE` clause together with its positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<Value>,
}

/// Typed filter for the certificate listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CertificateFilter {
    /// `None` shows every status.
    pub status: Option<ValidityStatus>,
    pub issued: Option<IssuedWithin>,
    pub search: Option<String>,
    pub barangay: Option<String>,
    pub establishment_type: Option<String>,
    pub certificate_type: Option<CertificateType>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Formats a date the way SQLite's `DATE()` returns it.
pub(crate) fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

/// Escapes LIKE wildcards so user input matches literally.
fn like_pattern(value: &str) -> Value {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    Value::Text(escaped)
}

/// Predicate for certificates that are unexpired and not revoked.
pub(crate) const VALID_PREDICATE: &str = "ic.valid_until >= ? AND ic.revoked = 0";
/// Predicate for certificates past their expiry and not revoked.
pub(crate) const EXPIRED_PREDICATE: &str = "ic.valid_until < ? AND ic.revoked = 0";
/// Predicate for certificates inside the expiring-soon window.
pub(crate) const EXPIRING_SOON_PREDICATE: &str =
    "ic.valid_until >= ? AND ic.valid_until <= ? AND ic.revoked = 0";
/// Predicate for revoked certificates.
pub(crate) const REVOKED_PREDICATE: &str = "ic.revoked = 1";

const SEARCH_COLUMNS: [&str; 5] = [
    "ic.certificate_number",
    "ie.establishment_name",
    "ie.owner_name",
    "ie.address",
    "ie.barangay",
];

impl CertificateFilter {
    /// Creates an empty filter that matches every certificate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses raw query parameters. Unknown status and date codes are ignored.
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            status: non_empty(&params.status)
                .as_deref()
                .and_then(ValidityStatus::from_code),
            issued: non_empty(&params.date)
                .as_deref()
                .and_then(IssuedWithin::from_code),
            search: non_empty(&params.search),
            barangay: non_empty(&params.barangay),
            establishment_type: non_empty(&params.establishment_type),
            certificate_type: non_empty(&params.certificate_type)
                .as_deref()
                .map(CertificateType::from_code),
        }
    }

    /// Converts the filter back into raw parameters.
    pub fn to_params(&self) -> FilterParams {
        FilterParams {
            status: self.status.map(|s| s.code().to_owned()),
            date: self.issued.map(|d| d.code().to_owned()),
            search: self.search.clone(),
            barangay: self.barangay.clone(),
            establishment_type: self.establishment_type.clone(),
            certificate_type: self.certificate_type.as_ref().map(|t| t.code().to_owned()),
        }
    }

    /// Encodes the filter as a query string, optionally swapping the status.
    ///
    /// Used by the status tabs so switching tabs keeps the other filters.
    pub fn query_string_with_status(&self, status: Option<ValidityStatus>) -> String {
        let mut params = self.to_params();
        params.status = Some(status.map_or("all", ValidityStatus::code).to_owned());
        serde_urlencoded::to_string(&params).unwrap_or_default()
    }

    pub fn with_status(mut self, status: impl Into<Option<ValidityStatus>>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_issued(mut self, issued: impl Into<Option<IssuedWithin>>) -> Self {
        self.issued = issued.into();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_barangay(mut self, barangay: impl Into<String>) -> Self {
        self.barangay = Some(barangay.into());
        self
    }

    pub fn with_establishment_type(mut self, establishment_type: impl Into<String>) -> Self {
        self.establishment_type = Some(establishment_type.into());
        self
    }

    pub fn with_certificate_type(mut self, certificate_type: CertificateType) -> Self {
        self.certificate_type = Some(certificate_type);
        self
    }

    /// Builds the `WHERE` clause evaluated against `today`.
    ///
    /// Clauses are appended in a fixed order: status, certificate type,
    /// issue date, barangay, establishment type, free-text search.
    pub fn to_sql(&self, today: NaiveDate) -> SqlFilter {
        let mut clause = String::from("WHERE 1=1");
        let mut params = Vec::new();

        if let Some(status) = self.status {
            clause.push_str(" AND ");
            match status {
                ValidityStatus::Valid => {
                    clause.push_str(VALID_PREDICATE);
                    params.push(date_value(today));
                }
                ValidityStatus::Expired => {
                    clause.push_str(EXPIRED_PREDICATE);
                    params.push(date_value(today));
                }
                ValidityStatus::ExpiringSoon => {
                    clause.push_str(EXPIRING_SOON_PREDICATE);
                    params.push(date_value(today));
                    params.push(date_value(expiring_soon_horizon(today)));
                }
                ValidityStatus::Revoked => clause.push_str(REVOKED_PREDICATE),
            }
        }

        if let Some(certificate_type) = &self.certificate_type {
            clause.push_str(" AND ic.certificate_type = ?");
            params.push(Value::Text(certificate_type.code().to_owned()));
        }

        if let Some(issued) = self.issued {
            let (predicate, date) = issued.clause(today);
            clause.push_str(" AND ");
            clause.push_str(predicate);
            params.push(date_value(date));
        }

        if let Some(barangay) = &self.barangay {
            clause.push_str(" AND ie.barangay LIKE ? ESCAPE '\\'");
            params.push(like_pattern(barangay));
        }

        if let Some(establishment_type) = &self.establishment_type {
            clause.push_str(" AND ie.establishment_type = ?");
            params.push(Value::Text(establishment_type.clone()));
        }

        if let Some(search) = &self.search {
            let alternatives = SEARCH_COLUMNS
                .iter()
                .map(|column| format!("{column} LIKE ? ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" OR ");
            clause.push_str(" AND (");
            clause.push_str(&alternatives);
            clause.push(')');
            let pattern = like_pattern(search);
            params.extend(std::iter::repeat(pattern).take(SEARCH_COLUMNS.len()));
        }

        debug!("certificate filter: {} ({} params)", clause, params.len());
        SqlFilter { clause, params }
    }
}
