//! Validity status derivation.
//!
//! Status is never persisted: it is recomputed from the expiry date, the
//! revoked flag and the caller's notion of "today" on every query.

use chrono::NaiveDate;

use crate::model::ValidityStatus;

/// Number of days before expiry during which a certificate counts as expiring soon.
pub const EXPIRING_SOON_WINDOW_DAYS: i64 = 30;

/// Whole days from `today` until `valid_until`; negative once expired.
pub fn days_remaining(today: NaiveDate, valid_until: NaiveDate) -> i64 {
    valid_until.signed_duration_since(today).num_days()
}

/// Derives the validity status shown for a certificate.
///
/// Revocation wins over every date rule. A certificate whose last valid day is
/// `today` is still expiring soon, not expired.
pub fn derive_status(today: NaiveDate, valid_until: NaiveDate, revoked: bool) -> ValidityStatus {
    if revoked {
        return ValidityStatus::Revoked;
    }

    let remaining = days_remaining(today, valid_until);
    if remaining < 0 {
        ValidityStatus::Expired
    } else if remaining <= EXPIRING_SOON_WINDOW_DAYS {
        ValidityStatus::ExpiringSoon
    } else {
        ValidityStatus::Valid
    }
}

/// Last day that still falls inside the expiring-soon window.
pub fn expiring_soon_horizon(today: NaiveDate) -> NaiveDate {
    today + chrono::Duration::days(EXPIRING_SOON_WINDOW_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
    }

    #[test]
    fn expiring_today_is_expiring_soon() {
        let today = date("2026-10-17");
        assert_eq!(derive_status(today, today, false), ValidityStatus::ExpiringSoon);
        assert_eq!(days_remaining(today, today), 0);
    }

    #[test]
    fn exactly_thirty_days_is_still_expiring_soon() {
        let today = date("2026-10-17");
        assert_eq!(
            derive_status(today, date("2026-11-16"), false),
            ValidityStatus::ExpiringSoon
        );
        assert_eq!(derive_status(today, date("2026-11-17"), false), ValidityStatus::Valid);
    }

    #[test]
    fn yesterday_is_expired() {
        let today = date("2026-10-17");
        let valid_until = date("2026-10-16");
        assert_eq!(derive_status(today, valid_until, false), ValidityStatus::Expired);
        assert_eq!(days_remaining(today, valid_until), -1);
    }

    #[test]
    fn revocation_overrides_dates() {
        let today = date("2026-10-17");
        assert_eq!(derive_status(today, date("2030-01-01"), true), ValidityStatus::Revoked);
        assert_eq!(derive_status(today, date("2020-01-01"), true), ValidityStatus::Revoked);
    }

    #[test]
    fn horizon_crosses_month_boundary() {
        assert_eq!(expiring_soon_horizon(date("2026-10-17")), date("2026-11-16"));
    }
}
