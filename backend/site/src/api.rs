//! Axum handlers: the HTTP binding for [`SiteController`].

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SiteError;
use crate::payment::CopyOutcome;
use crate::prompt::Answers;
use crate::report::{ReportKind, ReportRequest};
use crate::site::{Download, SiteController, SAMPLE_REPORT_ROUTE};
use crate::views;
use crate::visitor::{Visitor, VisitorId};

/// Cookie carrying the visitor id.
pub const VISITOR_COOKIE: &str = "matrix_visitor";

pub fn router(site: Arc<SiteController>) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/health", get(health))
        .route("/plans", get(get_plans))
        .route("/plans/select", post(select_plan))
        .route("/plans/proceed", post(proceed_to_payment))
        .route("/payment/instructions", get(payment_instructions))
        .route("/payment/confirm", post(confirm_payment))
        .route("/payment/copy-address", post(copy_address))
        .route("/demo/request", post(request_demo))
        .route("/notifications/current", get(current_notification))
        .route(SAMPLE_REPORT_ROUTE, get(sample_report))
        .route("/reports/generate", post(generate_report))
        .route("/reports/templates", get(list_templates))
        .with_state(site)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SelectRequest {
    pub frequency: String,
}

/// Answers from the two payment prompts; `null` means cancelled.
#[derive(Deserialize)]
pub struct PaymentAnswers {
    pub tx_hash: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct DemoAnswers {
    pub company: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct CopyRequest {
    pub outcome: CopyOutcome,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub ready: bool,
    pub rasterizer: &'static str,
    pub templates: Vec<ReportKind>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /`
///
/// Every load starts a new visitor, so a reload resets the selection and the
/// toast.
pub async fn landing(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (id, visitor) = site.open_visitor().await;
    let plans = site.plans(&visitor).await;
    (
        jar.add(visitor_cookie(id)),
        Html(views::render_landing_page(&plans, &site.payment_instructions())),
    )
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /plans`
pub async fn get_plans(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    (jar, Json(site.plans(&visitor).await))
}

/// `POST /plans/select`
///
/// An unknown frequency changes nothing and answers `204 No Content`.
pub async fn select_plan(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
    Json(req): Json<SelectRequest>,
) -> Response {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    match site.select_plan(&visitor, &req.frequency).await {
        Some(selection) => (jar, Json(selection)).into_response(),
        None => (jar, StatusCode::NO_CONTENT).into_response(),
    }
}

/// `POST /plans/proceed`
pub async fn proceed_to_payment(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    (jar, Json(site.proceed_to_payment(&visitor).await))
}

/// `GET /payment/instructions`
pub async fn payment_instructions(State(site): State<Arc<SiteController>>) -> impl IntoResponse {
    Json(site.payment_instructions())
}

/// `POST /payment/confirm`
pub async fn confirm_payment(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
    Json(req): Json<PaymentAnswers>,
) -> impl IntoResponse {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    let mut answers = Answers::new([req.tx_hash, req.email]);
    let response = site.confirm_payment(&visitor, &mut answers).await;
    debug!(questions = answers.asked().len(), "Payment prompts replayed");
    (jar, Json(response))
}

/// `POST /payment/copy-address`
pub async fn copy_address(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
    Json(req): Json<CopyRequest>,
) -> impl IntoResponse {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    (jar, Json(site.copy_address(&visitor, req.outcome).await))
}

/// `POST /demo/request`
pub async fn request_demo(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
    Json(req): Json<DemoAnswers>,
) -> impl IntoResponse {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    let mut answers = Answers::new([req.company, req.email]);
    let response = site.request_demo(&visitor, &mut answers).await;
    debug!(questions = answers.asked().len(), "Demo prompts replayed");
    (jar, Json(response))
}

/// `GET /notifications/current`
///
/// `null` when nothing is showing.
pub async fn current_notification(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    (jar, Json(site.current_notification(&visitor).await))
}

/// `GET /reports/sample`
pub async fn sample_report(State(site): State<Arc<SiteController>>) -> Response {
    match site.sample_report().await {
        Ok(download) => deliver(download),
        Err(e) => error_response(e),
    }
}

/// `POST /reports/generate`
pub async fn generate_report(
    State(site): State<Arc<SiteController>>,
    jar: CookieJar,
    Json(req): Json<ReportRequest>,
) -> Response {
    let (jar, visitor) = resolve_visitor(&site, jar).await;
    match site.generate_report(&visitor, &req).await {
        Ok(download) => (jar, deliver(download)).into_response(),
        Err(e) => (jar, error_response(e)).into_response(),
    }
}

/// `GET /reports/templates`
pub async fn list_templates(State(site): State<Arc<SiteController>>) -> impl IntoResponse {
    let templates = site.reports().templates();
    Json(TemplatesResponse {
        ready: templates.is_ready(),
        rasterizer: site.reports().rasterizer_name(),
        templates: templates.available(),
    })
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

/// The visitor named by the cookie, or a new one, plus the jar to answer with.
async fn resolve_visitor(site: &SiteController, jar: CookieJar) -> (CookieJar, Arc<Visitor>) {
    let known = jar.get(VISITOR_COOKIE).map(|c| c.value().to_string());
    let (id, visitor) = site.visitor(known.as_deref()).await;
    (jar.add(visitor_cookie(id)), visitor)
}

fn visitor_cookie(id: VisitorId) -> Cookie<'static> {
    Cookie::build((VISITOR_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn deliver(download: Download) -> Response {
    let disposition = download.artifact.content_disposition(&download.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, download.artifact.media_type.as_str().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.artifact.bytes,
    )
        .into_response()
}

fn error_response(e: SiteError) -> Response {
    let status = match e {
        SiteError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
