use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::{AppError, ReservationError};
use crate::handlers::{identity, require_role, Identity, Role};
use crate::models::{CommissionMode, Discount, Feedback, Turf};
use crate::state::AppState;

/// The smallest discount the platform accepts, in currency units.
const MIN_DISCOUNT_AMOUNT: i64 = 100;

fn owned_turf(
    db: &rusqlite::Connection,
    turf_id: &str,
    who: &Identity,
) -> Result<Turf, AppError> {
    let turf = queries::get_turf(db, turf_id)?
        .ok_or(AppError::Reservation(ReservationError::TurfNotFound))?;
    if turf.owner_id != who.user_id {
        return Err(AppError::Reservation(ReservationError::Forbidden));
    }
    Ok(turf)
}

// POST /api/owner/turfs
#[derive(Deserialize)]
pub struct CreateTurfRequest {
    pub turf_name: String,
    pub booking_price: i64,
    pub commission_mode: Option<CommissionMode>,
    pub commission_amount: Option<i64>,
}

pub async fn create_turf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateTurfRequest>,
) -> Result<(StatusCode, Json<Turf>), AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Owner)?;

    if body.turf_name.trim().is_empty() {
        return Err(AppError::BadRequest("turf name cannot be empty".to_string()));
    }
    if body.booking_price <= 0 {
        return Err(AppError::BadRequest(
            "booking price must be greater than zero".to_string(),
        ));
    }

    // New turfs start unverified; an admin flips activation flags.
    let turf = Turf {
        id: Uuid::new_v4().to_string(),
        owner_id: who.user_id.clone(),
        turf_name: body.turf_name.trim().to_string(),
        booking_price: body.booking_price,
        is_active: true,
        is_verified: false,
        commission_mode: body.commission_mode.unwrap_or(CommissionMode::Fixed),
        commission_amount: body.commission_amount.unwrap_or(0),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_turf(&db, &turf)?;
    }

    tracing::info!(turf_id = %turf.id, owner_id = %who.user_id, "turf created");
    Ok((StatusCode::CREATED, Json(turf)))
}

// POST /api/owner/turfs/:id/discounts
#[derive(Deserialize)]
pub struct AddDiscountRequest {
    pub discount_amount: i64,
}

pub async fn add_discount(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(turf_id): Path<String>,
    Json(body): Json<AddDiscountRequest>,
) -> Result<(StatusCode, Json<Discount>), AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Owner)?;

    if body.discount_amount < MIN_DISCOUNT_AMOUNT {
        return Err(AppError::BadRequest(format!(
            "discount amount must be at least {MIN_DISCOUNT_AMOUNT}"
        )));
    }

    let discount = Discount {
        id: Uuid::new_v4().to_string(),
        turf_id: turf_id.clone(),
        discount_amount: body.discount_amount,
        is_active: true,
        created_at: Utc::now().naive_utc(),
    };

    {
        let mut db = state.db.lock().unwrap();
        owned_turf(&db, &turf_id, &who)?;

        // A new discount becomes the turf's single active one.
        let tx = db.transaction()?;
        queries::insert_discount(&tx, &discount)?;
        queries::activate_discount(&tx, &discount)?;
        tx.commit()?;
    }

    tracing::info!(discount_id = %discount.id, turf_id, "discount added");
    Ok((StatusCode::CREATED, Json(discount)))
}

// POST /api/owner/discounts/:id/activate
pub async fn activate_discount(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(discount_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Owner)?;

    {
        let mut db = state.db.lock().unwrap();
        let discount = queries::get_discount(&db, &discount_id)?
            .ok_or_else(|| AppError::NotFound("discount not found".to_string()))?;
        owned_turf(&db, &discount.turf_id, &who)?;

        let tx = db.transaction()?;
        queries::activate_discount(&tx, &discount)?;
        tx.commit()?;
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/owner/discounts/:id/deactivate
pub async fn deactivate_discount(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(discount_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Owner)?;

    {
        let db = state.db.lock().unwrap();
        let discount = queries::get_discount(&db, &discount_id)?
            .ok_or_else(|| AppError::NotFound("discount not found".to_string()))?;
        owned_turf(&db, &discount.turf_id, &who)?;
        queries::deactivate_discount(&db, &discount_id)?;
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

// GET /api/owner/turfs/:id/feedbacks
pub async fn turf_feedbacks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(turf_id): Path<String>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Owner)?;

    let feedbacks = {
        let db = state.db.lock().unwrap();
        owned_turf(&db, &turf_id, &who)?;
        queries::feedbacks_for_turf(&db, &turf_id)?
    };

    Ok(Json(feedbacks))
}

// POST /api/owner/turfs/:id/manager
#[derive(Deserialize)]
pub struct AssignManagerRequest {
    pub manager_id: String,
}

pub async fn assign_manager(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(turf_id): Path<String>,
    Json(body): Json<AssignManagerRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Owner)?;

    {
        let db = state.db.lock().unwrap();
        owned_turf(&db, &turf_id, &who)?;
        queries::assign_manager(&db, &turf_id, &body.manager_id)?;
    }

    tracing::info!(turf_id, manager_id = %body.manager_id, "manager assigned");
    Ok(Json(serde_json::json!({ "ok": true })))
}
