use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Why a reservation request was rejected.
///
/// Each variant carries its own user-facing message so client UIs can react
/// precisely (offer alternate slots on `SlotAlreadyBooked`, retry on
/// `StorageConflict`, and so on). None of these are retried server-side.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("reservation date cannot be in the past")]
    PastDate,

    #[error("bookings can be made at most {0} days in advance")]
    AdvanceLimitExceeded(i64),

    #[error("slot start time cannot be in the past")]
    PastStartTime,

    #[error("start time must be in the future and fall on the reservation date")]
    InvalidStartTime,

    #[error("slot times must fall on 30-minute boundaries (e.g. 10:00, 10:30, 11:00)")]
    InvalidSlotGranularity,

    #[error("end time must fall on the reservation date or the very next day")]
    InvalidOvernightSpan,

    #[error("slot end time cannot be in the past")]
    PastEndTime,

    #[error("end time must be after start time")]
    EndBeforeStart,

    #[error("booking must be at least {0} minutes long")]
    BelowMinimumDuration(i64),

    #[error("new end time must be later than the current end time")]
    ExtensionMustIncreaseEndTime,

    #[error("turf is already booked for the selected time slot")]
    SlotAlreadyBooked,

    #[error("turf not found")]
    TurfNotFound,

    #[error("turf is not active or not verified")]
    TurfUnavailable,

    #[error("booking not found")]
    BookingNotFound,

    #[error("you are not allowed to act on this resource")]
    Forbidden,

    #[error("cancelled bookings cannot be modified")]
    UpdateNotAllowed,

    #[error("booking is already cancelled")]
    AlreadyCancelled,

    #[error("bookings cannot be modified within {0} hour(s) of the start time")]
    UpdateCutoffPassed(i64),

    #[error("bookings can only be cancelled at least {0} hours before the start time")]
    CancelCutoffPassed(i64),

    #[error("this booking is in the past and can no longer be acted on")]
    PastBookingAction,

    #[error("feedback is only allowed on confirmed bookings")]
    FeedbackNotAllowed,

    #[error("a concurrent booking hit the same slot, please retry")]
    StorageConflict,

    #[error("pricing integrity error: {0}")]
    Integrity(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ReservationError {
    pub fn status(&self) -> StatusCode {
        use ReservationError::*;
        match self {
            PastDate | AdvanceLimitExceeded(_) | PastStartTime | InvalidStartTime
            | InvalidSlotGranularity | InvalidOvernightSpan | PastEndTime | EndBeforeStart
            | BelowMinimumDuration(_) | ExtensionMustIncreaseEndTime | TurfUnavailable
            | UpdateNotAllowed | AlreadyCancelled | UpdateCutoffPassed(_)
            | CancelCutoffPassed(_) | PastBookingAction | FeedbackNotAllowed => {
                StatusCode::BAD_REQUEST
            }
            TurfNotFound | BookingNotFound => StatusCode::NOT_FOUND,
            Forbidden => StatusCode::FORBIDDEN,
            SlotAlreadyBooked | StorageConflict => StatusCode::CONFLICT,
            Integrity(_) | Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Reservation(#[from] ReservationError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("missing or invalid identity headers")]
    Unauthorized,

    #[error("role not permitted: {0}")]
    RoleNotPermitted(String),

    #[error("invalid input: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Reservation(e) => e.status(),
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RoleNotPermitted(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
