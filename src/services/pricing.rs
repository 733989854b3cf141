use chrono::NaiveDateTime;

use crate::errors::ReservationError;
use crate::models::{Discount, Turf};

/// Whole hours in the window, truncated. A 90-minute booking prices as one
/// hour; partial hours are never rounded up.
pub fn billable_hours(start_time: NaiveDateTime, end_time: NaiveDateTime) -> i64 {
    (end_time - start_time).num_seconds() / 3600
}

/// Computes the total amount for a window on a turf, applying the active
/// discount if there is one. Deterministic for fixed inputs.
///
/// A discount larger than the computed price is a data-integrity problem,
/// not a free booking; it surfaces as an error instead of being clamped.
pub fn quote(
    turf: &Turf,
    active_discount: Option<&Discount>,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
) -> Result<i64, ReservationError> {
    let hours = billable_hours(start_time, end_time);
    let discount_amount = active_discount.map(|d| d.discount_amount).unwrap_or(0);
    let total = hours * turf.booking_price - discount_amount;

    if total < 0 {
        tracing::error!(
            turf_id = %turf.id,
            hours,
            booking_price = turf.booking_price,
            discount_amount,
            "discount exceeds computed price"
        );
        return Err(ReservationError::Integrity(format!(
            "discount {discount_amount} exceeds computed price for turf {}",
            turf.id
        )));
    }

    Ok(total)
}
