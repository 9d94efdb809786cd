//! Personal-assistant email routes, nested under `/personal-assistant/email`.

use axum::Router;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{delete, get, post};
use jarvis_assistant::{Draft, EXAMPLE_TASKS, EmailMessage, EmailTask, parse_task};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

pub fn email_router() -> Router<SharedState> {
    Router::new()
        .route("/agent/process-task", post(process_task_handler))
        .route("/agent/examples", get(examples_handler))
        .route("/send", post(send_handler))
        .route("/draft", post(create_draft_handler))
        .route("/drafts", get(list_drafts_handler))
        .route("/draft/{id}/send", post(send_draft_handler))
        .route("/draft/{id}", delete(delete_draft_handler))
        .route("/settings", get(settings_handler))
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub task_description: String,
}

/// `POST /agent/process-task`
async fn process_task_handler(
    Json(request): Json<TaskRequest>,
) -> Result<Json<EmailTask>, ApiError> {
    let task = parse_task(&request.task_description)?;
    info!(action = ?task.action, to = %task.email_data.to, "Email task parsed");
    Ok(Json(task))
}

#[derive(Debug, Serialize)]
struct ExamplesResponse {
    examples: &'static [&'static str],
}

async fn examples_handler() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        examples: &EXAMPLE_TASKS,
    })
}

/// `POST /send`: deliver a structured email directly, without a draft.
async fn send_handler(
    State(state): State<SharedState>,
    Json(message): Json<EmailMessage>,
) -> Result<Json<ActionResponse>, ApiError> {
    let delivery_id = state.drafts.mailer().send(&message).await?;
    info!(to = %message.to, "Email sent");
    Ok(Json(ActionResponse {
        success: true,
        message: format!("Email sent successfully to {}", message.to),
        message_id: Some(delivery_id),
    }))
}

#[derive(Debug, Serialize)]
struct DraftCreated {
    success: bool,
    draft_id: String,
    message: &'static str,
}

async fn create_draft_handler(
    State(state): State<SharedState>,
    Json(message): Json<EmailMessage>,
) -> Json<DraftCreated> {
    let draft = state.drafts.create(message).await;
    Json(DraftCreated {
        success: true,
        draft_id: draft.id,
        message: "Email draft created. Review and send when ready.",
    })
}

#[derive(Debug, Serialize)]
struct DraftList {
    success: bool,
    drafts: Vec<Draft>,
}

async fn list_drafts_handler(State(state): State<SharedState>) -> Json<DraftList> {
    Json(DraftList {
        success: true,
        drafts: state.drafts.list().await,
    })
}

#[derive(Debug, Serialize)]
struct ActionResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
}

async fn send_draft_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    let (draft, delivery_id) = state.drafts.send(&id).await?;
    Ok(Json(ActionResponse {
        success: true,
        message: format!("Draft email sent to {}", draft.message.to),
        message_id: Some(delivery_id),
    }))
}

async fn delete_draft_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    state.drafts.delete(&id).await?;
    Ok(Json(ActionResponse {
        success: true,
        message: "Draft deleted".into(),
        message_id: None,
    }))
}

#[derive(Debug, Serialize)]
struct SettingsResponse {
    configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    message: String,
}

async fn settings_handler(State(state): State<SharedState>) -> Json<SettingsResponse> {
    let configured = state.drafts.mailer().is_configured();
    Json(SettingsResponse {
        configured,
        address: state.email.address.clone(),
        message: format!(
            "Email integration is {}configured",
            if configured { "" } else { "NOT " }
        ),
    })
}
