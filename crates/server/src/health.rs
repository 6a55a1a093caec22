use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use techshop_db::DbPool;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    registered_actions: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub actions: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, registered_actions: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { db_pool, registered_actions })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let actions = actions_check(state.registered_actions);
    let ready = database.status == "ready" && actions.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        actions,
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn actions_check(registered: usize) -> HealthCheck {
    if registered == 0 {
        HealthCheck { status: "degraded", detail: "no actions registered".to_string() }
    } else {
        HealthCheck { status: "ready", detail: format!("{registered} actions registered") }
    }
}

/// Queries the catalog table, so an unmigrated database reads as degraded.
async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM category").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "catalog query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("catalog query failed: {error}") }
        }
    }
}
