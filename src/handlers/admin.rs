use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{identity, require_role, Role};
use crate::state::AppState;

// POST /api/admin/turfs/:id/activation
#[derive(Deserialize)]
pub struct TurfActivationRequest {
    pub is_active: bool,
    pub is_verified: bool,
}

pub async fn set_turf_activation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(turf_id): Path<String>,
    Json(body): Json<TurfActivationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Admin)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::set_turf_activation(&db, &turf_id, body.is_active, body.is_verified)?
    };

    if !updated {
        return Err(AppError::NotFound("turf not found".to_string()));
    }

    tracing::info!(turf_id, body.is_active, body.is_verified, "turf activation updated");
    Ok(Json(serde_json::json!({ "ok": true })))
}
