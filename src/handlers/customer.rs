use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::{identity, require_role, BookingResponse, Role};
use crate::models::{BookingWindow, Feedback};
use crate::services::{booking, validation};
use crate::state::AppState;

// POST /api/customer/bookings
#[derive(Deserialize)]
pub struct BookTurfRequest {
    pub turf_id: String,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

pub async fn book_turf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookTurfRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Customer)?;

    let now = Utc::now().naive_utc();
    let window = BookingWindow {
        reservation_date: body.reservation_date,
        start_time: body.start_time,
        end_time: body.end_time,
    };

    let created = {
        let mut db = state.db.lock().unwrap();
        booking::book(
            &mut db,
            &state.config.policy,
            &body.turf_id,
            &who.user_id,
            window,
            now,
        )?
    };

    if let Err(e) = state.notifier.booking_created(&created).await {
        tracing::warn!(error = %e, booking_id = %created.id, "booking notification failed");
    }

    Ok((StatusCode::CREATED, Json(BookingResponse::from(created))))
}

// GET /api/customer/bookings
#[derive(Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub async fn booking_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Customer)?;

    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(20).clamp(1, 100);

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::bookings_for_customer(&db, &who.user_id, size, (page - 1) * size)?
    };

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

// PUT /api/customer/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub reservation_date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Customer)?;

    let now = Utc::now().naive_utc();
    let window = BookingWindow {
        reservation_date: body.reservation_date,
        start_time: body.start_time,
        end_time: body.end_time,
    };

    let updated = {
        let mut db = state.db.lock().unwrap();
        booking::update(&mut db, &state.config.policy, &id, &who.user_id, window, now)?
    };

    if let Err(e) = state.notifier.booking_updated(&updated).await {
        tracing::warn!(error = %e, booking_id = %updated.id, "booking notification failed");
    }

    Ok(Json(BookingResponse::from(updated)))
}

// POST /api/customer/bookings/:id/extend
#[derive(Deserialize)]
pub struct ExtendBookingRequest {
    pub reservation_date: NaiveDate,
    pub end_time: NaiveDateTime,
}

pub async fn extend_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ExtendBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Customer)?;

    let now = Utc::now().naive_utc();
    let extended = {
        let mut db = state.db.lock().unwrap();
        booking::extend(
            &mut db,
            &id,
            &who.user_id,
            body.reservation_date,
            body.end_time,
            now,
        )?
    };

    if let Err(e) = state.notifier.booking_updated(&extended).await {
        tracing::warn!(error = %e, booking_id = %extended.id, "booking notification failed");
    }

    Ok(Json(BookingResponse::from(extended)))
}

// POST /api/customer/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Customer)?;

    let now = Utc::now().naive_utc();
    let cancelled = {
        let mut db = state.db.lock().unwrap();
        booking::cancel_by_customer(&mut db, &state.config.policy, &id, &who.user_id, now)?
    };

    if let Err(e) = state.notifier.booking_cancelled(&cancelled).await {
        tracing::warn!(error = %e, booking_id = %cancelled.id, "booking notification failed");
    }

    Ok(Json(BookingResponse::from(cancelled)))
}

// POST /api/customer/bookings/:id/feedback
#[derive(Deserialize)]
pub struct AddFeedbackRequest {
    pub rating: i64,
    pub feedback: String,
}

pub async fn add_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<AddFeedbackRequest>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Customer)?;

    if body.rating <= 0 {
        return Err(AppError::BadRequest("rating must be greater than zero".to_string()));
    }
    if body.feedback.trim().is_empty() {
        return Err(AppError::BadRequest("feedback text cannot be empty".to_string()));
    }

    let now = Utc::now().naive_utc();
    let feedback = {
        let mut db = state.db.lock().unwrap();
        booking::add_feedback(&mut db, &id, &who.user_id, body.rating, body.feedback.trim(), now)?
    };

    Ok((StatusCode::CREATED, Json(feedback)))
}

// GET /api/customer/turfs/available
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub reservation_date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Serialize)]
pub struct AvailableTurfResponse {
    pub id: String,
    pub turf_name: String,
    pub booking_price: i64,
    pub active_discount: Option<i64>,
}

pub async fn available_turfs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<AvailableTurfResponse>>, AppError> {
    let who = identity(&headers)?;
    require_role(&who, Role::Customer)?;

    let now = Utc::now().naive_utc();
    let window = BookingWindow {
        reservation_date: query.reservation_date,
        start_time: query.start_time,
        end_time: query.end_time,
    };
    validation::validate_window(&state.config.policy, &window, now)
        .map_err(AppError::Reservation)?;

    let response = {
        let db = state.db.lock().unwrap();
        let turfs = queries::turfs_available_for_window(
            &db,
            query.reservation_date,
            query.start_time,
            query.end_time,
        )?;

        let mut out = Vec::with_capacity(turfs.len());
        for turf in turfs {
            let discount = queries::get_active_discount(&db, &turf.id)?;
            out.push(AvailableTurfResponse {
                id: turf.id,
                turf_name: turf.turf_name,
                booking_price: turf.booking_price,
                active_discount: discount.map(|d| d.discount_amount),
            });
        }
        out
    };

    Ok(Json(response))
}
