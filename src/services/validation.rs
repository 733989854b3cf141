use chrono::{Duration, NaiveDateTime, Timelike};

use crate::config::BookingPolicy;
use crate::errors::ReservationError;
use crate::models::{Booking, BookingWindow};

/// Checks a proposed window against the calendar rules. Pure, no I/O.
///
/// The checks run in a fixed order and the first failure wins; several
/// conditions can be true at once and callers depend on which one is
/// reported (the messages differ per check).
pub fn validate_window(
    policy: &BookingPolicy,
    window: &BookingWindow,
    now: NaiveDateTime,
) -> Result<(), ReservationError> {
    let today = now.date();
    let BookingWindow {
        reservation_date,
        start_time,
        end_time,
    } = *window;

    if reservation_date < today {
        return Err(ReservationError::PastDate);
    }

    if (reservation_date - today).num_days() > policy.max_advance_days {
        return Err(ReservationError::AdvanceLimitExceeded(policy.max_advance_days));
    }

    if reservation_date == today {
        if start_time < now {
            return Err(ReservationError::PastStartTime);
        }
    } else if start_time < now || start_time.date() != reservation_date {
        return Err(ReservationError::InvalidStartTime);
    }

    if !on_slot_boundary(start_time) || !on_slot_boundary(end_time) {
        return Err(ReservationError::InvalidSlotGranularity);
    }

    // An end date other than the reservation date must be exactly the next
    // day (single-night overnight booking, never multi-day).
    let end_date = end_time.date();
    if end_date != reservation_date && end_date != reservation_date + Duration::days(1) {
        return Err(ReservationError::InvalidOvernightSpan);
    }

    if end_time < now {
        return Err(ReservationError::PastEndTime);
    }

    if end_time <= start_time {
        return Err(ReservationError::EndBeforeStart);
    }

    if end_time < start_time + Duration::minutes(policy.min_duration_minutes) {
        return Err(ReservationError::BelowMinimumDuration(policy.min_duration_minutes));
    }

    Ok(())
}

/// Extension is narrower than a generic update: only the end time moves,
/// and only forward.
pub fn validate_extension(
    existing: &Booking,
    new_reservation_date: chrono::NaiveDate,
    new_end_time: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<(), ReservationError> {
    if new_reservation_date < now.date() {
        return Err(ReservationError::PastDate);
    }

    if new_end_time < existing.end_time {
        return Err(ReservationError::ExtensionMustIncreaseEndTime);
    }

    let end_date = new_end_time.date();
    if end_date != existing.reservation_date
        && end_date != existing.reservation_date + Duration::days(1)
    {
        return Err(ReservationError::InvalidOvernightSpan);
    }

    if new_end_time < now {
        return Err(ReservationError::PastEndTime);
    }

    Ok(())
}

fn on_slot_boundary(t: NaiveDateTime) -> bool {
    t.minute() == 0 || t.minute() == 30
}
