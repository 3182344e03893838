//! SQLite-backed access to certificates, establishments and users.

use std::path::Path;

use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::RegistryError;
use crate::filter::{
    date_value, CertificateFilter, EXPIRED_PREDICATE, EXPIRING_SOON_PREDICATE, REVOKED_PREDICATE,
    VALID_PREDICATE,
};
use crate::model::{
    CertificateDetail, CertificateRow, CertificateStats, CertificateType, Revocation, User,
};
use crate::status::{days_remaining, derive_status, expiring_soon_horizon};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    middle_name TEXT,
    last_name TEXT NOT NULL,
    role TEXT NOT NULL,
    avatar TEXT
);

CREATE TABLE IF NOT EXISTS inspection_establishments (
    id INTEGER PRIMARY KEY,
    establishment_name TEXT NOT NULL,
    establishment_type TEXT,
    barangay TEXT,
    address TEXT,
    owner_name TEXT,
    business_permit_number TEXT,
    last_inspection_date TEXT
);

CREATE TABLE IF NOT EXISTS inspection_reports (
    id INTEGER PRIMARY KEY,
    report_number TEXT NOT NULL,
    inspection_date TEXT,
    overall_compliance_score REAL,
    risk_assessment TEXT,
    fire_hazard_level TEXT
);

CREATE TABLE IF NOT EXISTS inspection_certificates (
    id INTEGER PRIMARY KEY,
    certificate_number TEXT NOT NULL UNIQUE,
    certificate_type TEXT NOT NULL,
    certificate_type_full TEXT,
    establishment_id INTEGER REFERENCES inspection_establishments(id),
    inspection_id INTEGER REFERENCES inspection_reports(id),
    issue_date TEXT,
    valid_until TEXT NOT NULL,
    issued_by INTEGER REFERENCES users(id),
    revoked INTEGER NOT NULL DEFAULT 0,
    revoked_at TEXT,
    revoked_reason TEXT,
    revoked_by INTEGER REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_certificates_valid_until
    ON inspection_certificates(valid_until);
CREATE INDEX IF NOT EXISTS idx_certificates_establishment
    ON inspection_certificates(establishment_id);
"#;

const LISTING_SELECT: &str = "SELECT
        ic.id,
        ic.certificate_number,
        ic.certificate_type,
        ic.issue_date,
        ic.valid_until,
        ic.revoked,
        ic.revoked_at,
        ic.revoked_reason,
        issuer.first_name || ' ' || issuer.last_name AS issued_by_name,
        revoker.first_name || ' ' || revoker.last_name AS revoked_by_name,
        ie.establishment_name,
        ie.establishment_type,
        ie.barangay,
        ie.address,
        ie.owner_name,
        ir.report_number,
        ir.inspection_date,
        ir.overall_compliance_score,
        ir.risk_assessment,
        ir.fire_hazard_level
    FROM inspection_certificates ic
    LEFT JOIN inspection_establishments ie ON ic.establishment_id = ie.id
    LEFT JOIN inspection_reports ir ON ic.inspection_id = ir.id
    LEFT JOIN users issuer ON ic.issued_by = issuer.id
    LEFT JOIN users revoker ON ic.revoked_by = revoker.id";

const DETAIL_SELECT: &str = "SELECT
        ic.id,
        ic.certificate_number,
        ic.certificate_type,
        ic.issue_date,
        ic.valid_until,
        ic.revoked,
        ie.establishment_name,
        ie.establishment_type,
        ie.address,
        ie.barangay,
        ie.owner_name,
        ie.business_permit_number,
        ir.report_number,
        ir.inspection_date,
        ir.overall_compliance_score,
        issuer.first_name || ' ' || issuer.last_name AS issued_by_name
    FROM inspection_certificates ic
    LEFT JOIN inspection_establishments ie ON ic.establishment_id = ie.id
    LEFT JOIN inspection_reports ir ON ic.inspection_id = ir.id
    LEFT JOIN users issuer ON ic.issued_by = issuer.id
    WHERE ic.id = ?1";

/// Read and update access to the certificate tables.
pub struct CertificateStore {
    conn: Connection,
}

impl CertificateStore {
    /// Opens (or creates) the database at `path` and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self, RegistryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, RegistryError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Creates any missing tables and indexes. Safe to call repeatedly.
    pub fn migrate(&self) -> Result<(), RegistryError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Raw connection, for seeding data.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Lists certificates matching `filter`, newest issue first.
    pub fn list(
        &self,
        filter: &CertificateFilter,
        today: NaiveDate,
    ) -> Result<Vec<CertificateRow>, RegistryError> {
        let sql = filter.to_sql(today);
        let query = format!(
            "{LISTING_SELECT} {} ORDER BY ic.issue_date DESC, ic.valid_until ASC, ic.id DESC",
            sql.clause
        );

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(sql.params.iter()), |row| {
                listing_row(row, today)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        debug!("listed {} certificates", rows.len());
        Ok(rows)
    }

    /// Non-revoked certificates that are expired or expiring soon, soonest expiry first.
    pub fn expiry_report(&self, today: NaiveDate) -> Result<Vec<CertificateRow>, RegistryError> {
        let query = format!(
            "{LISTING_SELECT} WHERE ic.revoked = 0 AND ic.valid_until <= ?1 \
             ORDER BY ic.valid_until ASC, ic.id ASC"
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt
            .query_map([date_value(expiring_soon_horizon(today))], |row| {
                listing_row(row, today)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Counts certificates per status and per type across the whole table.
    ///
    /// Uses the same predicates as the status filter so the tab counts always
    /// match the rows each tab lists.
    pub fn stats(&self, today: NaiveDate) -> Result<CertificateStats, RegistryError> {
        let query = format!(
            "SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN {REVOKED_PREDICATE} THEN 1 ELSE 0 END), 0) AS revoked,
                COALESCE(SUM(CASE WHEN {VALID_PREDICATE} THEN 1 ELSE 0 END), 0) AS valid,
                COALESCE(SUM(CASE WHEN {EXPIRED_PREDICATE} THEN 1 ELSE 0 END), 0) AS expired,
                COALESCE(SUM(CASE WHEN {EXPIRING_SOON_PREDICATE} THEN 1 ELSE 0 END), 0) AS expiring_soon,
                COALESCE(SUM(CASE WHEN ic.certificate_type = 'fsic' THEN 1 ELSE 0 END), 0) AS fsic,
                COALESCE(SUM(CASE WHEN ic.certificate_type = 'compliance' THEN 1 ELSE 0 END), 0) AS compliance,
                COALESCE(SUM(CASE WHEN ic.certificate_type = 'provisional' THEN 1 ELSE 0 END), 0) AS provisional,
                COALESCE(SUM(CASE WHEN ic.certificate_type = 'exemption' THEN 1 ELSE 0 END), 0) AS exemption
            FROM inspection_certificates ic"
        );
        let bindings = [
            date_value(today),
            date_value(today),
            date_value(today),
            date_value(expiring_soon_horizon(today)),
        ];

        let stats = self
            .conn
            .query_row(&query, params_from_iter(bindings.iter()), |row| {
                Ok(CertificateStats {
                    total: count(row, "total")?,
                    revoked: count(row, "revoked")?,
                    valid: count(row, "valid")?,
                    expired: count(row, "expired")?,
                    expiring_soon: count(row, "expiring_soon")?,
                    fsic: count(row, "fsic")?,
                    compliance: count(row, "compliance")?,
                    provisional: count(row, "provisional")?,
                    exemption: count(row, "exemption")?,
                })
            })?;
        Ok(stats)
    }

    /// Distinct non-empty barangays, sorted.
    pub fn barangays(&self) -> Result<Vec<String>, RegistryError> {
        self.distinct_column(
            "SELECT DISTINCT barangay FROM inspection_establishments \
             WHERE barangay IS NOT NULL AND barangay != '' ORDER BY barangay",
        )
    }

    /// Distinct non-empty establishment types, sorted.
    pub fn establishment_types(&self) -> Result<Vec<String>, RegistryError> {
        self.distinct_column(
            "SELECT DISTINCT establishment_type FROM inspection_establishments \
             WHERE establishment_type IS NOT NULL AND establishment_type != '' \
             ORDER BY establishment_type",
        )
    }

    fn distinct_column(&self, query: &str) -> Result<Vec<String>, RegistryError> {
        let mut stmt = self.conn.prepare(query)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Loads one certificate with the data printed on it.
    pub fn detail(&self, id: i64) -> Result<Option<CertificateDetail>, RegistryError> {
        let detail = self
            .conn
            .query_row(DETAIL_SELECT, [id], |row| {
                Ok(CertificateDetail {
                    id: row.get("id")?,
                    certificate_number: row.get("certificate_number")?,
                    certificate_type: certificate_type(row)?,
                    issue_date: row.get("issue_date")?,
                    valid_until: row.get("valid_until")?,
                    revoked: row.get("revoked")?,
                    establishment_name: row.get("establishment_name")?,
                    establishment_type: row.get("establishment_type")?,
                    address: row.get("address")?,
                    barangay: row.get("barangay")?,
                    owner_name: row.get("owner_name")?,
                    business_permit_number: row.get("business_permit_number")?,
                    report_number: row.get("report_number")?,
                    inspection_date: row.get("inspection_date")?,
                    overall_compliance_score: row.get("overall_compliance_score")?,
                    issued_by_name: row.get("issued_by_name")?,
                })
            })
            .optional()?;
        Ok(detail)
    }

    /// Looks up a user by id.
    pub fn user(&self, id: i64) -> Result<Option<User>, RegistryError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, first_name, middle_name, last_name, role, avatar \
                 FROM users WHERE id = ?1",
                [id],
                |row| {
                    Ok(User {
                        id: row.get("id")?,
                        first_name: row.get("first_name")?,
                        middle_name: row.get("middle_name")?,
                        last_name: row.get("last_name")?,
                        role: row.get("role")?,
                        avatar: row.get("avatar")?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Revokes a certificate and stamps the establishment's last inspection date.
    ///
    /// Both updates happen in one transaction. A certificate can only be
    /// revoked once and the reason must not be blank.
    pub fn revoke(&mut self, revocation: &Revocation) -> Result<(), RegistryError> {
        let reason = revocation.reason.trim();
        if reason.is_empty() {
            return Err(RegistryError::MissingReason);
        }

        let tx = self.conn.transaction()?;

        let revoked: Option<bool> = tx
            .query_row(
                "SELECT revoked FROM inspection_certificates WHERE id = ?1",
                [revocation.certificate_id],
                |row| row.get(0),
            )
            .optional()?;
        match revoked {
            None => return Err(RegistryError::NotFound(revocation.certificate_id)),
            Some(true) => return Err(RegistryError::AlreadyRevoked(revocation.certificate_id)),
            Some(false) => {}
        }

        tx.execute(
            "UPDATE inspection_certificates
             SET revoked = 1, revoked_at = ?1, revoked_reason = ?2, revoked_by = ?3
             WHERE id = ?4",
            params![
                revocation.revoked_at,
                reason,
                revocation.revoked_by,
                revocation.certificate_id
            ],
        )?;

        tx.execute(
            "UPDATE inspection_establishments
             SET last_inspection_date = (
                 SELECT ic.issue_date FROM inspection_certificates ic WHERE ic.id = ?1
             )
             WHERE id = (
                 SELECT ic.establishment_id FROM inspection_certificates ic WHERE ic.id = ?1
             )",
            [revocation.certificate_id],
        )?;

        tx.commit()?;
        info!(
            "certificate {} revoked by user {}",
            revocation.certificate_id, revocation.revoked_by
        );
        Ok(())
    }
}

fn count(row: &Row<'_>, column: &str) -> rusqlite::Result<u64> {
    let value: i64 = row.get(column)?;
    Ok(value.max(0) as u64)
}

fn certificate_type(row: &Row<'_>) -> rusqlite::Result<CertificateType> {
    let code: String = row.get("certificate_type")?;
    Ok(CertificateType::from_code(&code))
}

fn listing_row(row: &Row<'_>, today: NaiveDate) -> rusqlite::Result<CertificateRow> {
    let valid_until: NaiveDate = row.get("valid_until")?;
    let revoked: bool = row.get("revoked")?;

    Ok(CertificateRow {
        id: row.get("id")?,
        certificate_number: row.get("certificate_number")?,
        certificate_type: certificate_type(row)?,
        issue_date: row.get("issue_date")?,
        valid_until,
        revoked,
        revoked_at: row.get("revoked_at")?,
        revoked_reason: row.get("revoked_reason")?,
        issued_by_name: row.get("issued_by_name")?,
        revoked_by_name: row.get("revoked_by_name")?,
        establishment_name: row.get("establishment_name")?,
        establishment_type: row.get("establishment_type")?,
        barangay: row.get("barangay")?,
        address: row.get("address")?,
        owner_name: row.get("owner_name")?,
        report_number: row.get("report_number")?,
        inspection_date: row.get("inspection_date")?,
        overall_compliance_score: row.get("overall_compliance_score")?,
        risk_assessment: row.get("risk_assessment")?,
        fire_hazard_level: row.get("fire_hazard_level")?,
        days_remaining: days_remaining(today, valid_until),
        status: derive_status(today, valid_until, revoked),
    })
}
