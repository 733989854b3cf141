use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Customer feedback on a completed (confirmed) booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub booking_id: String,
    pub customer_id: String,
    pub rating: i64,
    pub feedback: String,
    pub created_at: NaiveDateTime,
}
