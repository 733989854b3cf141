use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::ReservationError;
use crate::models::Booking;

/// Scans non-cancelled bookings for the turf on the reservation date and
/// returns the first one whose `[start_time, end_time)` interval overlaps
/// the candidate window.
///
/// Overlap is keyed by the window's start date only: an overnight booking
/// spanning midnight lives under its reservation date, not under both days.
///
/// Bookings held by `exempt_customer` never count as conflicts, which is
/// what lets a customer re-submit or reshape their own slot. Creation
/// passes `None` since there is nothing of theirs to exempt.
///
/// Callers run this inside the same transaction as the write that follows
/// it; the shared connection lock makes the check-then-insert pair atomic.
pub fn find_conflict(
    conn: &Connection,
    turf_id: &str,
    reservation_date: NaiveDate,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    exempt_customer: Option<&str>,
) -> Result<Option<Booking>, ReservationError> {
    let existing = queries::list_for_turf_on_date(conn, turf_id, reservation_date)?;

    for booking in existing {
        if booking.start_time < end_time && booking.end_time > start_time {
            if exempt_customer == Some(booking.customer_id.as_str()) {
                continue;
            }
            return Ok(Some(booking));
        }
    }

    Ok(None)
}

/// Conflict scan for an extension. The booking's own start is fixed, so
/// only the new end boundary matters: any other customer's booking that
/// starts after the original start and before the new end blocks the
/// extension. The booking itself is excluded by id.
pub fn find_extension_conflict(
    conn: &Connection,
    booking: &Booking,
    reservation_date: NaiveDate,
    new_end_time: NaiveDateTime,
) -> Result<Option<Booking>, ReservationError> {
    let existing = queries::list_for_turf_on_date(conn, &booking.turf_id, reservation_date)?;

    for other in existing {
        if other.id == booking.id || other.customer_id == booking.customer_id {
            continue;
        }
        if other.start_time > booking.start_time && other.start_time < new_end_time {
            return Ok(Some(other));
        }
    }

    Ok(None)
}
