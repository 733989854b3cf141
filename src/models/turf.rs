use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turf {
    pub id: String,
    pub owner_id: String,
    pub turf_name: String,
    /// Hourly rate in whole currency units.
    pub booking_price: i64,
    pub is_active: bool,
    pub is_verified: bool,
    pub commission_mode: CommissionMode,
    pub commission_amount: i64,
    pub created_at: NaiveDateTime,
}

/// How the platform's cut is computed when a booking is paid:
/// a fixed amount per booking, or a percentage of the total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CommissionMode {
    Fixed,
    Percentage,
}

impl CommissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionMode::Fixed => "fixed",
            CommissionMode::Percentage => "percentage",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "percentage" => CommissionMode::Percentage,
            _ => CommissionMode::Fixed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub id: String,
    pub turf_id: String,
    pub discount_amount: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}
