use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{identity, require_role, BookingResponse, Role};
use crate::services::booking;
use crate::state::AppState;

fn managed_turf(db: &rusqlite::Connection, manager_id: &str) -> Result<String, AppError> {
    queries::turf_for_manager(db, manager_id)?
        .ok_or_else(|| AppError::NotFound("no turf assigned to this manager".to_string()))
}

// GET /api/manager/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Manager)?;

    if query.from > query.to {
        return Err(AppError::BadRequest(
            "start date cannot be after the end date".to_string(),
        ));
    }

    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(20).clamp(1, 100);

    let bookings = {
        let db = state.db.lock().unwrap();
        let turf_id = managed_turf(&db, &who.user_id)?;
        queries::bookings_for_turf_in_range(
            &db,
            &turf_id,
            query.from,
            query.to,
            size,
            (page - 1) * size,
        )?
    };

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

// POST /api/manager/bookings/:id/payment
pub async fn take_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Manager)?;

    let now = Utc::now().naive_utc();
    let (confirmed, revenue_amount) = {
        let mut db = state.db.lock().unwrap();
        let turf_id = managed_turf(&db, &who.user_id)?;
        booking::confirm_payment(&mut db, &id, &turf_id, &who.user_id, now)?
    };

    if let Err(e) = state.notifier.payment_confirmed(&confirmed).await {
        tracing::warn!(error = %e, booking_id = %confirmed.id, "payment notification failed");
    }

    Ok(Json(serde_json::json!({
        "booking": BookingResponse::from(confirmed),
        "revenue_amount": revenue_amount,
    })))
}

// POST /api/manager/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CancelBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Manager)?;

    let now = Utc::now().naive_utc();
    let cancelled = {
        let mut db = state.db.lock().unwrap();
        let turf_id = managed_turf(&db, &who.user_id)?;
        booking::cancel_by_manager(&mut db, &id, &turf_id, &body.reason, &who.user_id, now)?
    };

    if let Err(e) = state.notifier.booking_cancelled(&cancelled).await {
        tracing::warn!(error = %e, booking_id = %cancelled.id, "booking notification failed");
    }

    Ok(Json(BookingResponse::from(cancelled)))
}
