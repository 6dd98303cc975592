use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use hipfrog_db::DbPool;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    pub status: Readiness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installations: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub status: Readiness,
    pub store: StoreReport,
    pub checked_at: DateTime<Utc>,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(db_pool)
}

pub async fn health(State(db_pool): State<DbPool>) -> (StatusCode, Json<HealthReport>) {
    let store = probe_store(&db_pool).await;
    let status = store.status;
    let code = match status {
        Readiness::Ready => StatusCode::OK,
        Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(HealthReport { service: "hipfrog-server", status, store, checked_at: Utc::now() }))
}

async fn probe_store(pool: &DbPool) -> StoreReport {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM installation").fetch_one(pool).await {
        Ok(count) => StoreReport { status: Readiness::Ready, installations: Some(count), error: None },
        Err(error) => StoreReport {
            status: Readiness::Degraded,
            installations: None,
            error: Some(error.to_string()),
        },
    }
}
