pub mod admin;
pub mod customer;
pub mod health;
pub mod manager;
pub mod owner;

use axum::http::HeaderMap;
use serde::Serialize;

use crate::db::queries::{DATETIME_FMT, DATE_FMT};
use crate::errors::AppError;
use crate::models::Booking;

/// Who is calling. Authentication happens upstream (API gateway); these
/// headers are trusted and this service only enforces ownership and role
/// gating on top of them.
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Role {
    Admin,
    Owner,
    Manager,
    Customer,
}

impl Role {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "owner" => Some(Role::Owner),
            "manager" => Some(Role::Manager),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Customer => "customer",
        }
    }
}

pub fn identity(headers: &HeaderMap) -> Result<Identity, AppError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty());
    let role = headers
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(Role::parse);

    match (user_id, role) {
        (Some(user_id), Some(role)) => Ok(Identity {
            user_id: user_id.to_string(),
            role,
        }),
        _ => Err(AppError::Unauthorized),
    }
}

pub fn require_role(who: &Identity, role: Role) -> Result<(), AppError> {
    if who.role != role {
        return Err(AppError::RoleNotPermitted(role.as_str().to_string()));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub turf_id: String,
    pub customer_id: String,
    pub reservation_date: String,
    pub start_time: String,
    pub end_time: String,
    pub total_amount: i64,
    pub payment_status: String,
    pub booking_status: String,
    pub cancelled_by: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            turf_id: b.turf_id,
            customer_id: b.customer_id,
            reservation_date: b.reservation_date.format(DATE_FMT).to_string(),
            start_time: b.start_time.format(DATETIME_FMT).to_string(),
            end_time: b.end_time.format(DATETIME_FMT).to_string(),
            total_amount: b.total_amount,
            payment_status: b.payment_status.as_str().to_string(),
            booking_status: b.booking_status.as_str().to_string(),
            cancelled_by: b.cancelled_by,
            cancel_reason: b.cancel_reason,
            created_at: b.created_at.format(DATETIME_FMT).to_string(),
            updated_at: b.updated_at.format(DATETIME_FMT).to_string(),
        }
    }
}
