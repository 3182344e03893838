use chrono::NaiveDate;
use fsic_registry::CertificateStore;

/// Fixed "today" used by every fixture.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date")
}

/// Seeds users, establishments, reports and one certificate per status.
///
/// | id | number    | type        | issued     | valid until | state          |
/// |----|-----------|-------------|------------|-------------|----------------|
/// | 1  | FSIC-0001 | fsic        | 2026-10-17 | 2027-10-17  | valid          |
/// | 2  | FSIC-0002 | compliance  | 2026-10-16 | 2026-11-16  | expiring soon  |
/// | 3  | FSIC-0003 | provisional | 2025-09-01 | 2026-10-16  | expired        |
/// | 4  | FSIC-0004 | exemption   | 2026-08-01 | 2027-08-01  | revoked        |
/// | 5  | FSIC-0005 | fsic        | 2026-10-10 | 2026-10-17  | expiring today |
pub fn seeded_store() -> CertificateStore {
    let store = CertificateStore::open_in_memory().expect("open in-memory store");
    store
        .connection()
        .execute_batch(
            "
            INSERT INTO users (id, first_name, middle_name, last_name, role) VALUES
                (1, 'Ana', 'Cruz', 'Reyes', 'ADMIN'),
                (2, 'Ben', NULL, 'Lim', 'INSPECTOR');

            INSERT INTO inspection_establishments
                (id, establishment_name, establishment_type, barangay, address, owner_name,
                 business_permit_number, last_inspection_date)
            VALUES
                (1, 'Holy Spirit Bakery', 'Commercial', 'Holy Spirit', '5 Luzon Ave', 'Carla Diaz', 'BP-100', NULL),
                (2, 'Batasan 100% Hardware', 'Mercantile', 'Batasan Hills', '12 IBP Road', 'Dan Uy', 'BP-200', NULL),
                (3, 'Commonwealth Dormitory', 'Residential', 'Commonwealth', '8 Ecol St', 'Eva Sy', NULL, NULL),
                (4, 'Payatas Warehouse', 'Storage', '', '1 Payatas Rd', 'Fred Go', NULL, '2020-01-01');

            INSERT INTO inspection_reports
                (id, report_number, inspection_date, overall_compliance_score, risk_assessment, fire_hazard_level)
            VALUES
                (1, 'IR-2026-001', '2026-10-10', 92.5, 'Low', 'Low'),
                (2, 'IR-2026-002', '2026-10-01', 81.0, 'Moderate', 'Moderate');

            INSERT INTO inspection_certificates
                (id, certificate_number, certificate_type, establishment_id, inspection_id,
                 issue_date, valid_until, issued_by, revoked, revoked_at, revoked_reason, revoked_by)
            VALUES
                (1, 'FSIC-0001', 'fsic', 1, 1, '2026-10-17', '2027-10-17', 1, 0, NULL, NULL, NULL),
                (2, 'FSIC-0002', 'compliance', 2, 2, '2026-10-16', '2026-11-16', 1, 0, NULL, NULL, NULL),
                (3, 'FSIC-0003', 'provisional', 3, NULL, '2025-09-01', '2026-10-16', 2, 0, NULL, NULL, NULL),
                (4, 'FSIC-0004', 'exemption', 4, NULL, '2026-08-01', '2027-08-01', 1, 1,
                    '2026-09-01 10:00:00', 'Unsafe wiring', 1),
                (5, 'FSIC-0005', 'fsic', 1, NULL, '2026-10-10', '2026-10-17', 1, 0, NULL, NULL, NULL);
            ",
        )
        .expect("seed fixtures");
    store
}
