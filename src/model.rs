//! Data structures describing certificates and the records they are tied to.
//!
//! Rows produced by [`crate::store`] are plain values: every derived field
//! (days remaining, validity status) is computed at query time and stored
//! next to the raw columns so renderers never need a clock of their own.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Kind of certificate issued after an inspection.
///
/// Unknown codes coming from the database are preserved verbatim in
/// [`CertificateType::Other`] so filtering by them still matches exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CertificateType {
    /// Fire Safety Inspection Certificate.
    Fsic,
    /// Compliance certificate.
    Compliance,
    /// Provisional certificate.
    Provisional,
    /// Exemption certificate.
    Exemption,
    /// Any code not known to this crate.
    Other(String),
}

impl CertificateType {
    /// All certificate types offered as filter options, in display order.
    pub const KNOWN: [CertificateType; 4] = [
        CertificateType::Fsic,
        CertificateType::Compliance,
        CertificateType::Provisional,
        CertificateType::Exemption,
    ];

    /// Maps a stored code to a certificate type.
    pub fn from_code(code: &str) -> Self {
        match code {
            "fsic" => Self::Fsic,
            "compliance" => Self::Compliance,
            "provisional" => Self::Provisional,
            "exemption" => Self::Exemption,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the code stored in the `certificate_type` column.
    pub fn code(&self) -> &str {
        match self {
            Self::Fsic => "fsic",
            Self::Compliance => "compliance",
            Self::Provisional => "provisional",
            Self::Exemption => "exemption",
            Self::Other(code) => code,
        }
    }

    /// Returns the human readable label.
    pub fn label(&self) -> String {
        match self {
            Self::Fsic => "Fire Safety Inspection Certificate (FSIC)".to_owned(),
            Self::Compliance => "Compliance Certificate".to_owned(),
            Self::Provisional => "Provisional Certificate".to_owned(),
            Self::Exemption => "Exemption Certificate".to_owned(),
            Self::Other(code) => capitalize(code),
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Upper-cases the first character and leaves the rest untouched.
pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derived validity of a certificate on a given day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidityStatus {
    /// Not revoked and more than the expiring-soon window away from expiry.
    Valid,
    /// Not revoked and expiring within the window (today included).
    ExpiringSoon,
    /// Not revoked and past its last valid day.
    Expired,
    /// Revoked, regardless of dates.
    Revoked,
}

impl ValidityStatus {
    /// Returns the wire code used in query strings.
    pub fn code(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// Parses a wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "valid" => Some(Self::Valid),
            "expiring_soon" => Some(Self::ExpiringSoon),
            "expired" => Some(Self::Expired),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

/// An application user as far as this page is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub role: String,
    pub avatar: Option<String>,
}

impl User {
    /// Role required to manage certificates.
    pub const ADMIN_ROLE: &'static str = "ADMIN";

    /// First, optional middle and last name separated by spaces.
    pub fn full_name(&self) -> String {
        let mut name = self.first_name.clone();
        if let Some(middle) = self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            name.push(' ');
            name.push_str(middle);
        }
        name.push(' ');
        name.push_str(&self.last_name);
        name
    }

    /// Whether the user may view and revoke certificates.
    pub fn is_admin(&self) -> bool {
        self.role == Self::ADMIN_ROLE
    }
}

/// One row of the certificate listing.
#[derive(Clone, Debug, PartialEq)]
pub struct CertificateRow {
    pub id: i64,
    pub certificate_number: String,
    pub certificate_type: CertificateType,
    pub issue_date: Option<NaiveDate>,
    pub valid_until: NaiveDate,
    pub revoked: bool,
    pub revoked_at: Option<NaiveDateTime>,
    pub revoked_reason: Option<String>,
    pub issued_by_name: Option<String>,
    pub revoked_by_name: Option<String>,
    pub establishment_name: Option<String>,
    pub establishment_type: Option<String>,
    pub barangay: Option<String>,
    pub address: Option<String>,
    pub owner_name: Option<String>,
    pub report_number: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub overall_compliance_score: Option<f64>,
    pub risk_assessment: Option<String>,
    pub fire_hazard_level: Option<String>,
    /// Days from the query's "today" until `valid_until`.
    pub days_remaining: i64,
    pub status: ValidityStatus,
}

/// A certificate with everything needed to print it.
#[derive(Clone, Debug, PartialEq)]
pub struct CertificateDetail {
    pub id: i64,
    pub certificate_number: String,
    pub certificate_type: CertificateType,
    pub issue_date: Option<NaiveDate>,
    pub valid_until: NaiveDate,
    pub revoked: bool,
    pub establishment_name: Option<String>,
    pub establishment_type: Option<String>,
    pub address: Option<String>,
    pub barangay: Option<String>,
    pub owner_name: Option<String>,
    pub business_permit_number: Option<String>,
    pub report_number: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub overall_compliance_score: Option<f64>,
    pub issued_by_name: Option<String>,
}

/// Aggregate counts shown on the stat cards and status tabs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CertificateStats {
    pub total: u64,
    pub revoked: u64,
    /// Unexpired and not revoked, expiring-soon certificates included.
    pub valid: u64,
    pub expired: u64,
    pub expiring_soon: u64,
    pub fsic: u64,
    pub compliance: u64,
    pub provisional: u64,
    pub exemption: u64,
}

impl CertificateStats {
    /// Count shown next to a status tab; `None` is the "All" tab.
    pub fn for_status(&self, status: Option<ValidityStatus>) -> u64 {
        match status {
            None => self.total,
            Some(ValidityStatus::Valid) => self.valid,
            Some(ValidityStatus::ExpiringSoon) => self.expiring_soon,
            Some(ValidityStatus::Expired) => self.expired,
            Some(ValidityStatus::Revoked) => self.revoked,
        }
    }
}

/// Request to revoke a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revocation {
    pub certificate_id: i64,
    pub reason: String,
    pub revoked_by: i64,
    pub revoked_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_certificate_type_keeps_code_and_capitalizes_label() {
        let kind = CertificateType::from_code("temporary");
        assert_eq!(kind, CertificateType::Other("temporary".into()));
        assert_eq!(kind.code(), "temporary");
        assert_eq!(kind.label(), "Temporary");
    }

    #[test]
    fn full_name_skips_empty_middle_name() {
        let mut user = User {
            id: 1,
            first_name: "Maria".into(),
            middle_name: Some(String::new()),
            last_name: "Santos".into(),
            role: "ADMIN".into(),
            avatar: None,
        };
        assert_eq!(user.full_name(), "Maria Santos");

        user.middle_name = Some("Cruz".into());
        assert_eq!(user.full_name(), "Maria Cruz Santos");
    }
}
