use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use techshop_actions::{ActionContext, ActionRegistry, RegistryError, Tracker};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct WebhookState {
    registry: Arc<ActionRegistry>,
}

/// One action call from the dialogue engine. The `domain` it also sends is
/// ignored.
#[derive(Debug, Deserialize)]
pub struct ActionCall {
    pub next_action: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub tracker: Tracker,
}

#[derive(Debug, Serialize)]
pub struct ActionNotFound {
    pub action_name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ActionList {
    pub actions: Vec<String>,
}

pub fn router(registry: Arc<ActionRegistry>) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/actions", get(list_actions))
        .with_state(WebhookState { registry })
}

pub async fn webhook(State(state): State<WebhookState>, Json(call): Json<ActionCall>) -> Response {
    let context = ActionContext { correlation_id: Uuid::new_v4().to_string() };
    let mut tracker = call.tracker;
    if tracker.sender_id.trim().is_empty() {
        if let Some(sender_id) = call.sender_id {
            tracker.sender_id = sender_id;
        }
    }

    info!(
        event_name = "webhook.action_requested",
        correlation_id = %context.correlation_id,
        sender_id = %tracker.sender_id,
        action = %call.next_action,
        "action call received"
    );

    match state.registry.run(&call.next_action, &context, &tracker).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error @ RegistryError::UnknownAction(_)) => {
            warn!(
                event_name = "webhook.unknown_action",
                correlation_id = %context.correlation_id,
                action = %call.next_action,
                "action is not registered"
            );
            let body = ActionNotFound { action_name: call.next_action, error: error.to_string() };
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
    }
}

pub async fn list_actions(State(state): State<WebhookState>) -> Json<ActionList> {
    Json(ActionList { actions: state.registry.names() })
}
