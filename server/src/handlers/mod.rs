use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod events;
pub mod payments;
pub mod reviews;
pub mod stores;
pub mod tickets;
pub mod users;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    storage: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Response, AppError> {
    state.repo.health_check().await?;

    let payload = HealthPayload {
        status: "ok",
        service: "hanbok-api",
        storage: state.repo.backend_name(),
    };

    Ok(success(payload, "Health check successful"))
}
