//! HTTP surface: the certificate page, revocation and PDF downloads.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::NaiveDate;
use fsic_registry::filter::FilterParams;
use fsic_registry::model::{Revocation, User};
use fsic_registry::page::{ListingPage, PAGE_PATH};
use fsic_registry::pdf::{render_certificate, render_expiry_report};
use fsic_registry::{CertificateFilter, CertificateStore, RegistryError};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::AppError;

/// Header carrying the id of the user authenticated by the fronting proxy.
pub const USER_HEADER: &str = "x-user-id";

const EXPIRY_REPORT_PATH: &str = "/certificates/expiry-report";
const REVOKED_REDIRECT: &str = "/certificates?success=Certificate+revoked+successfully";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<CertificateStore>>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(store: CertificateStore, config: Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        }
    }

    /// Runs `f` against the store on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut CertificateStore) -> Result<T, RegistryError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut guard = store.lock().map_err(|_| AppError::StorePoisoned)?;
            f(&mut guard).map_err(AppError::from)
        })
        .await?
    }

    /// Resolves the acting user and checks the admin role.
    async fn require_admin(&self, headers: &HeaderMap) -> Result<User, AppError> {
        let user_id = headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or(AppError::Unauthenticated)?;

        match self.with_store(move |store| store.user(user_id)).await? {
            Some(user) if user.is_admin() => Ok(user),
            _ => Err(AppError::Forbidden(user_id)),
        }
    }

    fn today(&self) -> NaiveDate {
        self.config.today()
    }
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, RegistryError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to(PAGE_PATH) }))
        .route(PAGE_PATH, get(list_certificates).post(revoke_certificate))
        .route(EXPIRY_REPORT_PATH, get(expiry_report))
        .with_state(state)
}

/// Binds `bind` and serves until the process is stopped.
pub async fn serve(config: Config, bind: SocketAddr) -> Result<(), Box<dyn Error>> {
    let store = CertificateStore::open(&config.database)?;
    let state = AppState::new(store, config);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "serving certificate registry");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Query string accepted by the listing page.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(flatten)]
    filter: FilterParams,
    success: Option<String>,
    generate_certificate: Option<String>,
}

#[instrument(skip_all)]
async fn list_certificates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    let user = state.require_admin(&headers).await?;

    if let Some(raw_id) = query.generate_certificate.as_deref() {
        let id = parse_id(raw_id)?;
        return certificate_pdf(&state, id).await;
    }

    let filter = CertificateFilter::from_params(&query.filter);
    let today = state.today();
    let (certificates, stats, barangays, establishment_types) = state
        .with_store({
            let filter = filter.clone();
            move |store| {
                Ok((
                    store.list(&filter, today)?,
                    store.stats(today)?,
                    store.barangays()?,
                    store.establishment_types()?,
                ))
            }
        })
        .await?;

    let page = ListingPage {
        user: &user,
        filter: &filter,
        certificates: &certificates,
        stats: &stats,
        barangays: &barangays,
        establishment_types: &establishment_types,
        success_message: query.success.as_deref(),
    };
    Ok(Html(page.render()).into_response())
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest("certificate id must be a number"))
}

fn pdf_response(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn certificate_pdf(state: &AppState, id: i64) -> Result<Response, AppError> {
    let detail = state
        .with_store(move |store| store.detail(id)?.ok_or(RegistryError::NotFound(id)))
        .await?;

    let fonts_dir = state.config.fonts_dir.clone();
    let pdf = blocking(move || Ok(render_certificate(&detail, fonts_dir)?)).await?;
    info!(certificate_id = id, bytes = pdf.bytes.len(), "rendered certificate");
    Ok(pdf_response(&pdf.file_name, pdf.bytes))
}

/// Revocation form posted from the listing page.
#[derive(Debug, Deserialize)]
pub struct RevokeForm {
    revoke_certificate: Option<String>,
    certificate_id: Option<String>,
    #[serde(default)]
    revoked_reason: String,
}

#[instrument(skip_all)]
async fn revoke_certificate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RevokeForm>,
) -> Result<Response, AppError> {
    let user = state.require_admin(&headers).await?;

    if form.revoke_certificate.is_none() {
        return Err(AppError::BadRequest("unsupported form action"));
    }
    let certificate_id = parse_id(
        form.certificate_id
            .as_deref()
            .ok_or(AppError::BadRequest("certificate id is required"))?,
    )?;

    let revocation = Revocation {
        certificate_id,
        reason: form.revoked_reason,
        revoked_by: user.id,
        revoked_at: state.config.now(),
    };
    state
        .with_store(move |store| store.revoke(&revocation))
        .await?;

    Ok(Redirect::to(REVOKED_REDIRECT).into_response())
}

#[instrument(skip_all)]
async fn expiry_report(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.require_admin(&headers).await?;

    let today = state.today();
    let rows = state
        .with_store(move |store| store.expiry_report(today))
        .await?;

    let fonts_dir = state.config.fonts_dir.clone();
    let bytes = blocking(move || Ok(render_expiry_report(&rows, today, fonts_dir)?)).await?;
    let file_name = format!("Certificate_Expiry_Report_{}.pdf", today.format("%Y-%m-%d"));
    Ok(pdf_response(&file_name, bytes))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use fsic_registry::pdf::fonts;
    use tower::ServiceExt;

    use super::*;

    const SEED: &str = "
        INSERT INTO users (id, first_name, middle_name, last_name, role) VALUES
            (1, 'Ana', NULL, 'Reyes', 'ADMIN'),
            (2, 'Ben', NULL, 'Lim', 'INSPECTOR');
        INSERT INTO inspection_establishments
            (id, establishment_name, establishment_type, barangay, address, owner_name)
            VALUES (1, 'Holy Spirit Bakery', 'Commercial', 'Holy Spirit', '5 Luzon Ave', 'Carla Diaz');
        INSERT INTO inspection_certificates
            (id, certificate_number, certificate_type, establishment_id, issue_date, valid_until, issued_by)
            VALUES (1, 'FSIC-0001', 'fsic', 1, '2026-01-10', '2099-01-10', 1);
    ";

    fn state() -> AppState {
        let store = CertificateStore::open_in_memory().expect("open in-memory store");
        store
            .connection()
            .execute_batch(SEED)
            .expect("seed test data");
        AppState::new(
            store,
            Config {
                database: PathBuf::from(":memory:"),
                utc_offset_hours: 8,
                fonts_dir: None,
            },
        )
    }

    fn get(uri: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        builder.body(Body::empty()).expect("build request")
    }

    fn post_form(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(PAGE_PATH)
            .header(USER_HEADER, "1")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("build request")
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn missing_user_redirects_to_login() {
        let response = router(state())
            .oneshot(get(PAGE_PATH, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn non_admin_redirects_to_unauthorized() {
        let response = router(state())
            .oneshot(get(PAGE_PATH, Some("2")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login/unauthorized");
    }

    #[tokio::test]
    async fn admin_sees_listing() {
        let response = router(state())
            .oneshot(get("/certificates?status=valid&search=bakery", Some("1")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let html = String::from_utf8(body.to_vec()).expect("utf-8 body");
        assert!(html.contains("FSIC-0001"));
        assert!(html.contains("Holy Spirit Bakery"));
        assert!(html.contains("Ana Reyes"));
    }

    #[tokio::test]
    async fn unknown_certificate_pdf_is_not_found() {
        let response = router(state())
            .oneshot(get("/certificates?generate_certificate=999", Some("1")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn revoke_redirects_with_success_message() {
        let state = state();
        let response = router(state.clone())
            .oneshot(post_form(
                "revoke_certificate=1&certificate_id=1&revoked_reason=Blocked+fire+exits",
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), REVOKED_REDIRECT);

        let (revoked, reason, revoked_by): (bool, String, i64) = state
            .store
            .lock()
            .expect("store lock")
            .connection()
            .query_row(
                "SELECT revoked, revoked_reason, revoked_by FROM inspection_certificates WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .expect("query revoked certificate");
        assert!(revoked);
        assert_eq!(reason, "Blocked fire exits");
        assert_eq!(revoked_by, 1);
    }

    #[tokio::test]
    async fn revoke_without_reason_is_rejected() {
        let response = router(state())
            .oneshot(post_form("revoke_certificate=1&certificate_id=1&revoked_reason=+"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_certificate_id_is_bad_request() {
        let response = router(state())
            .oneshot(get("/certificates?generate_certificate=abc", Some("1")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn second_revocation_conflicts() {
        let app = router(state());
        let body = "revoke_certificate=1&certificate_id=1&revoked_reason=Expired+permit";

        let first = app.clone().oneshot(post_form(body)).await.expect("response");
        assert_eq!(first.status(), StatusCode::SEE_OTHER);

        let second = app.oneshot(post_form(body)).await.expect("response");
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn expiry_report_requires_admin() {
        let response = router(state())
            .oneshot(get(EXPIRY_REPORT_PATH, Some("2")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login/unauthorized");
    }

    #[tokio::test]
    async fn expiry_report_is_served_as_pdf() {
        if !fonts::fonts_available(None) {
            eprintln!("Skipping expiry_report_is_served_as_pdf: bundled fonts missing.");
            return;
        }

        let response = router(state())
            .oneshot(get(EXPIRY_REPORT_PATH, Some("1")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/pdf")
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        assert!(disposition.starts_with("inline; filename=\"Certificate_Expiry_Report_"));

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert!(body.starts_with(b"%PDF"));
    }
}
