use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use rfq_core::domain::contact::{
    ContactMessage, CONTACT_FAILED_NOTICE, CONTACT_INVALID_NOTICE, CONTACT_SENT_NOTICE,
};
use rfq_core::submission::{ContactMessageSink, SubmissionReceipt};
use rfq_core::ValidationErrors;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ContactState {
    sink: Arc<dyn ContactMessageSink>,
}

impl ContactState {
    pub fn new(sink: Arc<dyn ContactMessageSink>) -> Self {
        Self { sink }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: &'static str,
    pub receipt: SubmissionReceipt,
}

#[derive(Debug, Serialize)]
pub struct ContactError {
    pub error: &'static str,
    #[serde(skip_serializing_if = "ValidationErrors::is_empty")]
    pub errors: ValidationErrors,
}

pub fn router(state: ContactState) -> Router {
    Router::new().route("/api/v1/contact", post(send_message)).with_state(state)
}

pub async fn send_message(
    State(state): State<ContactState>,
    Json(message): Json<ContactMessage>,
) -> Result<(StatusCode, Json<ContactResponse>), (StatusCode, Json<ContactError>)> {
    let errors = message.validate();
    if !errors.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ContactError { error: CONTACT_INVALID_NOTICE, errors }),
        ));
    }

    let receipt = state.sink.create(&message).await.map_err(|error| {
        warn!(event_name = "contact.submission.failed", error = %error, "contact message not stored");
        (
            StatusCode::BAD_GATEWAY,
            Json(ContactError { error: CONTACT_FAILED_NOTICE, errors: ValidationErrors::new() }),
        )
    })?;

    info!(
        event_name = "contact.submission.succeeded",
        contact_message_id = %receipt.id,
        "contact message stored"
    );
    Ok((StatusCode::CREATED, Json(ContactResponse { message: CONTACT_SENT_NOTICE, receipt })))
}
