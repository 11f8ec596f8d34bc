//! Quote request wizard routes.
//!
//! JSON API Endpoints:
//! - `GET    /api/v1/products`                                  product selector options
//! - `POST   /api/v1/quote-wizard`                              open a wizard session
//! - `GET    /api/v1/quote-wizard/{session_id}`                 current wizard view
//! - `DELETE /api/v1/quote-wizard/{session_id}`                 close a session
//! - `PUT    /api/v1/quote-wizard/{session_id}/fields`          set a draft field
//! - `POST   /api/v1/quote-wizard/{session_id}/line-items`      append a line item
//! - `PUT    /api/v1/quote-wizard/{session_id}/line-items/{i}`  edit a line item
//! - `DELETE /api/v1/quote-wizard/{session_id}/line-items/{i}`  remove a line item
//! - `POST   /api/v1/quote-wizard/{session_id}/certifications`  toggle a certification
//! - `POST   /api/v1/quote-wizard/{session_id}/next`            advance one step
//! - `POST   /api/v1/quote-wizard/{session_id}/previous`        go back one step
//! - `POST   /api/v1/quote-wizard/{session_id}/submit`          submit the request
//!
//! HTML Endpoints:
//! - `GET  /quote-wizard/{session_id}/review`                   read-only review page

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post, put},
    Json, Router,
};
use rfq_core::audit::{AuditContext, AuditSink};
use rfq_core::catalog::ProductCatalog;
use rfq_core::domain::product::{product_options, ProductOption};
use rfq_core::domain::quote_request::LineItemField;
use rfq_core::errors::{ApplicationError, InterfaceError};
use rfq_core::flows::wizard::SUBMIT_FAILURE_NOTICE;
use rfq_core::flows::{QuoteWizard, WizardError, WizardTransitionError, WizardView};
use rfq_core::submission::{QuoteSubmissionSink, SubmissionError, SubmissionReceipt};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::sessions::{SessionError, SessionStore, SharedWizard};

const REVIEW_TEMPLATE: &str = "quote_wizard/review.html";
const WIZARD_ACTOR: &str = "quote-wizard";

#[derive(Clone)]
pub struct QuoteWizardState {
    sessions: Arc<SessionStore>,
    catalog: Arc<dyn ProductCatalog>,
    sink: Arc<dyn QuoteSubmissionSink>,
    audit: Arc<dyn AuditSink>,
    templates: Arc<Tera>,
}

impl QuoteWizardState {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        sink: Arc<dyn QuoteSubmissionSink>,
        audit: Arc<dyn AuditSink>,
        session_capacity: usize,
        session_idle: Duration,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new(session_capacity, session_idle)),
            catalog,
            sink,
            audit,
            templates: init_templates(),
        }
    }

    async fn session(&self, session_id: &str) -> ApiResult<SharedWizard> {
        self.sessions.get(session_id).await.ok_or_else(|| {
            api_error(StatusCode::NOT_FOUND, format!("wizard session `{session_id}` not found"))
        })
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct CertificationToggle {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub view: WizardView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub session_id: String,
    pub receipt: SubmissionReceipt,
    #[serde(flatten)]
    pub view: WizardView,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductOption>,
}

#[derive(Debug, Serialize)]
pub struct WizardApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<WizardView>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<WizardApiError>)>;

fn api_error(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<WizardApiError>) {
    (status, Json(WizardApiError { error: error.into(), correlation_id: None, view: None }))
}

fn interface_error(error: InterfaceError) -> (StatusCode, Json<WizardApiError>) {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(WizardApiError {
            error: error.user_message().to_string(),
            correlation_id: Some(error.correlation_id().to_string()),
            view: None,
        }),
    )
}

/// Maps a rejected wizard action to a response. Validation and submission
/// failures carry the view so the client can render errors and the notice.
fn reject(error: WizardError, wizard: &QuoteWizard) -> (StatusCode, Json<WizardApiError>) {
    let (status, message, view) = match &error {
        WizardError::Transition(WizardTransitionError::ValidationFailed { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, error.to_string(), Some(wizard.view()))
        }
        WizardError::Transition(WizardTransitionError::InvalidTransition { .. })
        | WizardError::Domain(_) => (StatusCode::BAD_REQUEST, error.to_string(), None),
        WizardError::SubmissionInFlight | WizardError::NoSubmissionInFlight => {
            (StatusCode::CONFLICT, error.to_string(), None)
        }
        WizardError::Submission(_) => {
            (StatusCode::BAD_GATEWAY, SUBMIT_FAILURE_NOTICE.to_string(), Some(wizard.view()))
        }
    };
    (status, Json(WizardApiError { error: message, correlation_id: None, view }))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn init_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    if let Err(error) = tera.add_raw_template(
        REVIEW_TEMPLATE,
        include_str!("../../../templates/quote_wizard/review.html"),
    ) {
        warn!(
            event_name = "system.templates.load_failed",
            template = REVIEW_TEMPLATE,
            error = %error,
            "review template failed to compile"
        );
    }
    Arc::new(tera)
}

pub fn router(state: QuoteWizardState) -> Router {
    Router::new()
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/quote-wizard", post(create_session))
        .route("/api/v1/quote-wizard/{session_id}", get(get_session).delete(close_session))
        .route("/api/v1/quote-wizard/{session_id}/fields", put(set_field))
        .route("/api/v1/quote-wizard/{session_id}/line-items", post(add_line_item))
        .route(
            "/api/v1/quote-wizard/{session_id}/line-items/{index}",
            put(update_line_item).delete(remove_line_item),
        )
        .route("/api/v1/quote-wizard/{session_id}/certifications", post(toggle_certification))
        .route("/api/v1/quote-wizard/{session_id}/next", post(next_step))
        .route("/api/v1/quote-wizard/{session_id}/previous", post(previous_step))
        .route("/api/v1/quote-wizard/{session_id}/submit", post(submit))
        .route("/quote-wizard/{session_id}/review", get(review_page))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn list_products(
    State(state): State<QuoteWizardState>,
) -> ApiResult<Json<ProductsResponse>> {
    let entries = state.catalog.list().await.map_err(|error| {
        let correlation_id = Uuid::new_v4().to_string();
        warn!(
            event_name = "wizard.catalog.unavailable",
            correlation_id = %correlation_id,
            error = %error,
            "product catalog listing failed"
        );
        interface_error(
            ApplicationError::Integration(error.to_string()).into_interface(correlation_id),
        )
    })?;

    Ok(Json(ProductsResponse { products: product_options(&entries) }))
}

pub async fn create_session(
    State(state): State<QuoteWizardState>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session_id = SessionStore::new_session_id();
    let correlation_id = Uuid::new_v4().to_string();
    let context = AuditContext::new(Some(session_id.clone()), correlation_id.clone(), WIZARD_ACTOR);

    let wizard = QuoteWizard::mount(state.catalog.as_ref(), state.sink.clone())
        .await
        .with_audit(state.audit.clone(), context);
    let view = wizard.view();

    state.sessions.insert(session_id.clone(), wizard).await.map_err(|error| match error {
        SessionError::CapacityReached(_) => {
            warn!(
                event_name = "wizard.session.capacity_reached",
                correlation_id = %correlation_id,
                "refusing new wizard session"
            );
            api_error(StatusCode::SERVICE_UNAVAILABLE, error.to_string())
        }
    })?;

    let open_sessions = state.sessions.len().await;
    info!(
        event_name = "wizard.session.created",
        correlation_id = %correlation_id,
        session_id = %session_id,
        open_sessions,
        "quote wizard session opened"
    );
    Ok((StatusCode::CREATED, Json(SessionResponse { session_id, view })))
}

pub async fn get_session(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.session(&session_id).await?;
    let view = session.lock().await.view();
    Ok(Json(SessionResponse { session_id, view }))
}

pub async fn close_session(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
) -> ApiResult<StatusCode> {
    if !state.sessions.remove(&session_id).await {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("wizard session `{session_id}` not found"),
        ));
    }
    info!(event_name = "wizard.session.closed", session_id = %session_id, "quote wizard session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a synchronous wizard action under the session lock and answers with
/// the resulting view.
async fn with_wizard<F>(
    state: &QuoteWizardState,
    session_id: String,
    action: F,
) -> ApiResult<Json<SessionResponse>>
where
    F: FnOnce(&mut QuoteWizard) -> Result<(), WizardError>,
{
    let session = state.session(&session_id).await?;
    let mut wizard = session.lock().await;
    action(&mut *wizard).map_err(|error| reject(error, &wizard))?;
    Ok(Json(SessionResponse { session_id, view: wizard.view() }))
}

pub async fn set_field(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
    Json(request): Json<FieldUpdate>,
) -> ApiResult<Json<SessionResponse>> {
    with_wizard(&state, session_id, |wizard| {
        wizard.set_field_by_name(&request.field, &request.value)
    })
    .await
}

pub async fn add_line_item(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
) -> ApiResult<Json<SessionResponse>> {
    with_wizard(&state, session_id, QuoteWizard::add_line_item).await
}

pub async fn update_line_item(
    Path((session_id, index)): Path<(String, usize)>,
    State(state): State<QuoteWizardState>,
    Json(request): Json<FieldUpdate>,
) -> ApiResult<Json<SessionResponse>> {
    with_wizard(&state, session_id, |wizard| {
        let field = request.field.parse::<LineItemField>()?;
        wizard.update_line_item(index, field, &request.value)
    })
    .await
}

pub async fn remove_line_item(
    Path((session_id, index)): Path<(String, usize)>,
    State(state): State<QuoteWizardState>,
) -> ApiResult<Json<SessionResponse>> {
    with_wizard(&state, session_id, |wizard| wizard.remove_line_item(index).map(|_| ())).await
}

pub async fn toggle_certification(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
    Json(request): Json<CertificationToggle>,
) -> ApiResult<Json<SessionResponse>> {
    with_wizard(&state, session_id, |wizard| wizard.toggle_certification_by_name(&request.name))
        .await
}

pub async fn next_step(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
) -> ApiResult<Json<SessionResponse>> {
    with_wizard(&state, session_id, |wizard| wizard.next().map(|_| ())).await
}

pub async fn previous_step(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
) -> ApiResult<Json<SessionResponse>> {
    with_wizard(&state, session_id, |wizard| wizard.previous().map(|_| ())).await
}

/// The sink call runs without the session lock held; other requests against
/// the session see `submitting` and are refused until the result is applied.
/// The call and the apply run on their own task, so a dropped request still
/// leaves the session retryable once the sink answers.
pub async fn submit(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
) -> ApiResult<Json<SubmitResponse>> {
    let session = state.session(&session_id).await?;

    let (draft, sink) = {
        let mut wizard = session.lock().await;
        let draft = wizard.begin_submit().map_err(|error| reject(error, &wizard))?;
        (draft, wizard.sink())
    };

    let in_flight = session.clone();
    let task = tokio::spawn(async move {
        let result = sink.create(&draft).await;
        let mut wizard = in_flight.lock().await;
        match wizard.finish_submit(result) {
            Ok(receipt) => Ok((receipt, wizard.view())),
            Err(error) => Err(reject(error, &wizard)),
        }
    });

    match task.await {
        Ok(applied) => {
            let (receipt, view) = applied?;
            Ok(Json(SubmitResponse { session_id, receipt, view }))
        }
        Err(join_error) => {
            error!(
                event_name = "wizard.submission.task_failed",
                session_id = %session_id,
                error = %join_error,
                "quote submission task did not complete"
            );
            let mut wizard = session.lock().await;
            let outcome = wizard.finish_submit(Err(SubmissionError::Unavailable(
                "submission task aborted".to_string(),
            )));
            match outcome {
                Ok(_) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, SUBMIT_FAILURE_NOTICE)),
                Err(error) => Err(reject(error, &wizard)),
            }
        }
    }
}

pub async fn review_page(
    Path(session_id): Path<String>,
    State(state): State<QuoteWizardState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let Some(session) = state.sessions.get(&session_id).await else {
        return Err((StatusCode::NOT_FOUND, Html("<h1>Quote request not found</h1>".to_string())));
    };
    let wizard = session.lock().await;

    let mut context = Context::new();
    context.insert("step", &wizard.step().number());
    context.insert("step_title", wizard.step().title());
    context.insert("notice", &wizard.notice());
    context.insert("review", &wizard.review());

    let html = state.templates.render(REVIEW_TEMPLATE, &context).map_err(|e| {
        error!(
            event_name = "wizard.review.render_failed",
            session_id = %session_id,
            error = ?e,
            "review page failed to render"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("<h1>Template Error</h1><pre>{:?}</pre>", e)))
    })?;

    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
        Router,
    };
    use rfq_core::audit::InMemoryAuditSink;
    use rfq_core::catalog::ProductCatalog;
    use rfq_core::domain::product::{Product, ProductId};
    use rfq_core::domain::quote_request::QuoteDraft;
    use rfq_core::submission::{QuoteSubmissionSink, SubmissionError, SubmissionReceipt};
    use rfq_db::repositories::{
        FailingSubmissionSink, InMemoryProductRepository, InMemoryQuoteRequestRepository,
        UnavailableCatalog,
    };
    use serde_json::{json, Value};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use super::{router, QuoteWizardState};

    fn catalog() -> Arc<dyn ProductCatalog> {
        Arc::new(InMemoryProductRepository::with_products(vec![
            Product {
                id: ProductId("prod-cnc-machining".to_string()),
                name: "CNC Machining".to_string(),
                category: "precision-parts".to_string(),
                active: true,
            },
            Product {
                id: ProductId("prod-sheet-metal".to_string()),
                name: "Sheet Metal Fabrication".to_string(),
                category: "components".to_string(),
                active: true,
            },
        ]))
    }

    fn app_with(
        catalog: Arc<dyn ProductCatalog>,
        sink: Arc<dyn QuoteSubmissionSink>,
        capacity: usize,
    ) -> (Router, QuoteWizardState) {
        app_with_idle(catalog, sink, capacity, Duration::from_secs(3600))
    }

    fn app_with_idle(
        catalog: Arc<dyn ProductCatalog>,
        sink: Arc<dyn QuoteSubmissionSink>,
        capacity: usize,
        idle: Duration,
    ) -> (Router, QuoteWizardState) {
        let state = QuoteWizardState::new(
            catalog,
            sink,
            Arc::new(InMemoryAuditSink::default()),
            capacity,
            idle,
        );
        (router(state.clone()), state)
    }

    /// Holds every submission until `release` is notified, then refuses it.
    struct GatedSink {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl QuoteSubmissionSink for GatedSink {
        async fn create(&self, _draft: &QuoteDraft) -> Result<SubmissionReceipt, SubmissionError> {
            self.release.notified().await;
            Err(SubmissionError::Unavailable("erp timed out".to_string()))
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(body.map(|body| Body::from(body.to_string())).unwrap_or_else(Body::empty))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/v1/quote-wizard", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["sessionId"].as_str().expect("session id").to_string()
    }

    async fn set(app: &Router, session: &str, field: &str, value: &str) {
        let (status, body) = send(
            app,
            "PUT",
            &format!("/api/v1/quote-wizard/{session}/fields"),
            Some(json!({ "field": field, "value": value })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "set {field}: {body}");
    }

    async fn fill_to_review(app: &Router, session: &str) {
        set(app, session, "customerName", "Marta Kowalski").await;
        set(app, session, "company", "Kowalski Hydraulics").await;
        set(app, session, "email", "marta@kowalski-hydraulics.example").await;
        let (status, _) = send(app, "POST", &format!("/api/v1/quote-wizard/{session}/next"), None).await;
        assert_eq!(status, StatusCode::OK);

        set(app, session, "projectName", "Valve block rework").await;
        set(app, session, "timeline", "1-2weeks").await;
        let (status, _) = send(app, "POST", &format!("/api/v1/quote-wizard/{session}/next"), None).await;
        assert_eq!(status, StatusCode::OK);

        for (field, value) in [("productRef", "prod-cnc-machining"), ("quantity", "250")] {
            let (status, body) = send(
                app,
                "PUT",
                &format!("/api/v1/quote-wizard/{session}/line-items/0"),
                Some(json!({ "field": field, "value": value })),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "line item {field}: {body}");
        }
        set(app, session, "requirements", "6061-T6, hard anodized, +/-0.02 mm on bores").await;
        let (status, body) = send(
            app,
            "POST",
            &format!("/api/v1/quote-wizard/{session}/certifications"),
            Some(json!({ "name": "AS9100D" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draft"]["certifications"], json!(["AS9100D"]));

        let (status, body) =
            send(app, "POST", &format!("/api/v1/quote-wizard/{session}/next"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], 4);
    }

    #[tokio::test]
    async fn wizard_walks_to_submission_and_resets() {
        let sink = Arc::new(InMemoryQuoteRequestRepository::default());
        let (app, _) = app_with(catalog(), sink.clone(), 8);
        let session = open_session(&app).await;

        fill_to_review(&app, &session).await;

        let (status, body) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/submit"), None).await;
        assert_eq!(status, StatusCode::OK, "submit: {body}");
        assert_eq!(body["step"], 1);
        assert_eq!(body["notice"]["level"], "success");
        assert_eq!(body["draft"]["customerName"], "");
        assert!(body["receipt"]["id"].as_str().is_some());
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn blocked_step_returns_field_errors_with_view() {
        let (app, _) = app_with(catalog(), Arc::new(InMemoryQuoteRequestRepository::default()), 8);
        let session = open_session(&app).await;
        set(&app, &session, "email", "not-an-email").await;

        let (status, body) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/next"), None).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["view"]["step"], 1);
        assert_eq!(body["view"]["errors"]["email"], "Email is invalid");
        assert_eq!(body["view"]["errors"]["customerName"], "Name is required");
        assert_eq!(body["view"]["notice"]["message"], "Please correct the errors before continuing");
    }

    #[tokio::test]
    async fn unknown_inputs_are_bad_requests() {
        let (app, _) = app_with(catalog(), Arc::new(InMemoryQuoteRequestRepository::default()), 8);
        let session = open_session(&app).await;

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/quote-wizard/{session}/fields"),
            Some(json!({ "field": "favouriteColour", "value": "teal" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/quote-wizard/{session}/certifications"),
            Some(json!({ "name": "ISO 27001" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/previous"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/v1/quote-wizard/qw-missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn line_items_can_be_added_and_removed() {
        let (app, _) = app_with(catalog(), Arc::new(InMemoryQuoteRequestRepository::default()), 8);
        let session = open_session(&app).await;

        let (_, body) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/line-items"), None).await;
        assert_eq!(body["lineItems"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["lineItems"][0]["removable"], false);
        assert_eq!(body["lineItems"][1]["removable"], true);

        let (status, body) =
            send(&app, "DELETE", &format!("/api/v1/quote-wizard/{session}/line-items/1"), None)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lineItems"].as_array().map(Vec::len), Some(1));

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/quote-wizard/{session}/line-items/5"),
            Some(json!({ "field": "quantity", "value": "10" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_submission_preserves_draft_and_returns_bad_gateway() {
        let (app, _) = app_with(catalog(), Arc::new(FailingSubmissionSink::new("crm offline")), 8);
        let session = open_session(&app).await;
        fill_to_review(&app, &session).await;

        let (status, body) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/submit"), None).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to submit quote request. Please try again.");
        assert_eq!(body["view"]["step"], 4);
        assert_eq!(body["view"]["submitting"], false);
        assert_eq!(body["view"]["draft"]["customerName"], "Marta Kowalski");
    }

    #[tokio::test]
    async fn actions_during_submission_conflict() {
        let (app, state) =
            app_with(catalog(), Arc::new(InMemoryQuoteRequestRepository::default()), 8);
        let session = open_session(&app).await;
        fill_to_review(&app, &session).await;

        let wizard = state.sessions.get(&session).await.expect("session");
        wizard.lock().await.begin_submit().expect("begin submit");

        let (status, _) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/previous"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/submit"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn abandoned_submit_request_still_settles_the_session() {
        let release = Arc::new(Notify::new());
        let (app, _) =
            app_with(catalog(), Arc::new(GatedSink { release: release.clone() }), 8);
        let session = open_session(&app).await;
        fill_to_review(&app, &session).await;

        let submit_uri = format!("/api/v1/quote-wizard/{session}/submit");
        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), send(&app, "POST", &submit_uri, None))
                .await;
        assert!(abandoned.is_err(), "submission should still be waiting on the sink");

        let (status, _) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/previous"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        release.notify_one();

        let mut view = Value::Null;
        for _ in 0..100 {
            let (_, body) = send(&app, "GET", &format!("/api/v1/quote-wizard/{session}"), None).await;
            if body["submitting"] == false {
                view = body;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(view["submitting"], false, "session should leave the submitting state");
        assert_eq!(view["step"], 4);
        assert_eq!(view["notice"]["message"], "Failed to submit quote request. Please try again.");
        assert_eq!(view["draft"]["customerName"], "Marta Kowalski");

        let (status, body) =
            send(&app, "POST", &format!("/api/v1/quote-wizard/{session}/previous"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], 3);
    }

    #[tokio::test]
    async fn idle_sessions_expire_and_free_capacity() {
        let (app, _) = app_with_idle(
            catalog(),
            Arc::new(InMemoryQuoteRequestRepository::default()),
            1,
            Duration::from_millis(50),
        );
        let abandoned = open_session(&app).await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        let fresh = open_session(&app).await;
        assert_ne!(fresh, abandoned);
        let (status, _) =
            send(&app, "GET", &format!("/api/v1/quote-wizard/{abandoned}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_outage_still_opens_sessions_with_custom_option() {
        let (app, _) = app_with(
            Arc::new(UnavailableCatalog::new("connection refused")),
            Arc::new(InMemoryQuoteRequestRepository::default()),
            8,
        );

        let (status, body) = send(&app, "GET", "/api/v1/products", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "The service is temporarily unavailable. Please retry shortly.");
        assert!(body["correlation_id"].as_str().is_some());

        let (status, body) = send(&app, "POST", "/api/v1/quote-wizard", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["productOptions"], json!([{ "value": "custom", "label": "Custom/Other" }]));
    }

    #[tokio::test]
    async fn products_endpoint_appends_custom_option() {
        let (app, _) = app_with(catalog(), Arc::new(InMemoryQuoteRequestRepository::default()), 8);

        let (status, body) = send(&app, "GET", "/api/v1/products", None).await;

        assert_eq!(status, StatusCode::OK);
        let labels: Vec<&str> = body["products"]
            .as_array()
            .expect("products")
            .iter()
            .filter_map(|option| option["label"].as_str())
            .collect();
        assert_eq!(labels, vec!["CNC Machining", "Sheet Metal Fabrication", "Custom/Other"]);
    }

    #[tokio::test]
    async fn session_capacity_and_close() {
        let (app, _) = app_with(catalog(), Arc::new(InMemoryQuoteRequestRepository::default()), 1);
        let session = open_session(&app).await;

        let (status, _) = send(&app, "POST", "/api/v1/quote-wizard", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) =
            send(&app, "DELETE", &format!("/api/v1/quote-wizard/{session}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/api/v1/quote-wizard/{session}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn review_page_renders_labels_and_placeholders() {
        let (app, _) = app_with(catalog(), Arc::new(InMemoryQuoteRequestRepository::default()), 8);
        let session = open_session(&app).await;
        fill_to_review(&app, &session).await;

        let request = Request::builder()
            .uri(format!("/quote-wizard/{session}/review"))
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let html = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(html.contains("CNC Machining"));
        assert!(html.contains("1-2 weeks"));
        assert!(html.contains("Not provided"));
        assert!(html.contains("AS9100D"));
    }
}
