use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::BookingPolicy;
use crate::db::queries;
use crate::errors::ReservationError;
use crate::models::{
    Booking, BookingStatus, BookingWindow, CommissionMode, Feedback, PaymentStatus, Turf,
};
use crate::services::{conflict, pricing, validation};

/// Booking lifecycle: reserved → confirmed on payment, reserved|confirmed →
/// cancelled, cancelled terminal.
///
/// Every operation here runs its conflict check and its write inside one
/// rusqlite transaction while the caller holds the connection lock, so
/// check-then-act pairs are atomic: at most one accepted booking per
/// overlapping interval per turf. Constraint or busy failures at commit
/// surface as `StorageConflict`, the one error worth retrying.
pub fn book(
    conn: &mut Connection,
    policy: &BookingPolicy,
    turf_id: &str,
    customer_id: &str,
    window: BookingWindow,
    now: NaiveDateTime,
) -> Result<Booking, ReservationError> {
    let tx = conn.transaction()?;

    let turf = active_turf(&tx, turf_id)?;
    validation::validate_window(policy, &window, now)?;

    // No exemption on create: there is no booking of ours to re-shape yet.
    if conflict::find_conflict(
        &tx,
        turf_id,
        window.reservation_date,
        window.start_time,
        window.end_time,
        None,
    )?
    .is_some()
    {
        return Err(ReservationError::SlotAlreadyBooked);
    }

    let discount = queries::get_active_discount(&tx, turf_id)?;
    let total_amount = pricing::quote(&turf, discount.as_ref(), window.start_time, window.end_time)?;

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        turf_id: turf_id.to_string(),
        customer_id: customer_id.to_string(),
        reservation_date: window.reservation_date,
        start_time: window.start_time,
        end_time: window.end_time,
        total_amount,
        payment_status: PaymentStatus::Unpaid,
        booking_status: BookingStatus::Reserved,
        cancelled_by: None,
        cancel_reason: None,
        created_by: customer_id.to_string(),
        created_at: now,
        updated_by: None,
        updated_at: now,
    };

    queries::insert_booking(&tx, &booking).map_err(map_write_err)?;
    tx.commit().map_err(map_write_err)?;

    tracing::info!(booking_id = %booking.id, turf_id, customer_id, total_amount, "booking created");
    Ok(booking)
}

/// Reshapes a booking's whole window before the update cutoff. Only the
/// booking's customer may do this, and only while it is not cancelled.
pub fn update(
    conn: &mut Connection,
    policy: &BookingPolicy,
    booking_id: &str,
    customer_id: &str,
    new_window: BookingWindow,
    now: NaiveDateTime,
) -> Result<Booking, ReservationError> {
    let tx = conn.transaction()?;

    let booking = owned_modifiable_booking(&tx, booking_id, customer_id)?;
    validation::validate_window(policy, &new_window, now)?;

    if booking.reservation_date < now.date() {
        return Err(ReservationError::PastBookingAction);
    }

    if now > booking.start_time - Duration::hours(policy.update_cutoff_hours) {
        return Err(ReservationError::UpdateCutoffPassed(policy.update_cutoff_hours));
    }

    if conflict::find_conflict(
        &tx,
        &booking.turf_id,
        new_window.reservation_date,
        new_window.start_time,
        new_window.end_time,
        Some(customer_id),
    )?
    .is_some()
    {
        return Err(ReservationError::SlotAlreadyBooked);
    }

    let turf = active_turf(&tx, &booking.turf_id)?;
    let discount = queries::get_active_discount(&tx, &booking.turf_id)?;
    let total_amount =
        pricing::quote(&turf, discount.as_ref(), new_window.start_time, new_window.end_time)?;

    queries::update_booking_window(
        &tx,
        booking_id,
        new_window.reservation_date,
        new_window.start_time,
        new_window.end_time,
        total_amount,
        customer_id,
        now,
    )
    .map_err(map_write_err)?;

    let updated = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    tx.commit().map_err(map_write_err)?;

    tracing::info!(booking_id, customer_id, total_amount, "booking updated");
    Ok(updated)
}

/// Pushes a booking's end time later. The start is fixed; pricing runs from
/// the original start to the new end. Unlike `update` there is no lead-time
/// cutoff: a customer on the pitch can extend right up to their end time.
pub fn extend(
    conn: &mut Connection,
    booking_id: &str,
    customer_id: &str,
    new_reservation_date: NaiveDate,
    new_end_time: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<Booking, ReservationError> {
    let tx = conn.transaction()?;

    let booking = owned_modifiable_booking(&tx, booking_id, customer_id)?;
    validation::validate_extension(&booking, new_reservation_date, new_end_time, now)?;

    if booking.reservation_date < now.date() {
        return Err(ReservationError::PastBookingAction);
    }

    if conflict::find_extension_conflict(&tx, &booking, new_reservation_date, new_end_time)?
        .is_some()
    {
        return Err(ReservationError::SlotAlreadyBooked);
    }

    let turf = active_turf(&tx, &booking.turf_id)?;
    let discount = queries::get_active_discount(&tx, &booking.turf_id)?;
    let total_amount = pricing::quote(&turf, discount.as_ref(), booking.start_time, new_end_time)?;

    queries::update_booking_end(&tx, booking_id, new_end_time, total_amount, customer_id, now)
        .map_err(map_write_err)?;

    let updated = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    tx.commit().map_err(map_write_err)?;

    tracing::info!(booking_id, customer_id, total_amount, "booking extended");
    Ok(updated)
}

pub fn cancel_by_customer(
    conn: &mut Connection,
    policy: &BookingPolicy,
    booking_id: &str,
    customer_id: &str,
    now: NaiveDateTime,
) -> Result<Booking, ReservationError> {
    let tx = conn.transaction()?;

    let booking = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    if booking.customer_id != customer_id {
        return Err(ReservationError::Forbidden);
    }
    if booking.booking_status == BookingStatus::Cancelled {
        return Err(ReservationError::AlreadyCancelled);
    }

    if booking.reservation_date < now.date() {
        return Err(ReservationError::PastBookingAction);
    }

    if booking.start_time < now + Duration::hours(policy.cancel_cutoff_hours) {
        return Err(ReservationError::CancelCutoffPassed(policy.cancel_cutoff_hours));
    }

    queries::cancel_booking(&tx, booking_id, customer_id, None, now).map_err(map_write_err)?;
    let cancelled = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    tx.commit().map_err(map_write_err)?;

    tracing::info!(booking_id, customer_id, "booking cancelled by customer");
    Ok(cancelled)
}

/// Manager-initiated cancellation: no time cutoff, but the reason and
/// canceller are recorded, and the booking must belong to the manager's turf.
pub fn cancel_by_manager(
    conn: &mut Connection,
    booking_id: &str,
    manager_turf_id: &str,
    reason: &str,
    actor_id: &str,
    now: NaiveDateTime,
) -> Result<Booking, ReservationError> {
    let tx = conn.transaction()?;

    let booking = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    if booking.turf_id != manager_turf_id {
        return Err(ReservationError::Forbidden);
    }
    if booking.booking_status == BookingStatus::Cancelled {
        return Err(ReservationError::AlreadyCancelled);
    }

    queries::cancel_booking(&tx, booking_id, actor_id, Some(reason), now).map_err(map_write_err)?;
    let cancelled = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    tx.commit().map_err(map_write_err)?;

    tracing::info!(booking_id, actor_id, reason, "booking cancelled by manager");
    Ok(cancelled)
}

/// Marks a booking paid and confirmed, and records the platform's revenue
/// share in the same transaction: both commit or neither does.
///
/// Returns the updated booking and the recorded revenue amount.
pub fn confirm_payment(
    conn: &mut Connection,
    booking_id: &str,
    manager_turf_id: &str,
    actor_id: &str,
    now: NaiveDateTime,
) -> Result<(Booking, i64), ReservationError> {
    let tx = conn.transaction()?;

    let booking = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    if booking.turf_id != manager_turf_id {
        return Err(ReservationError::Forbidden);
    }
    if booking.booking_status == BookingStatus::Cancelled {
        return Err(ReservationError::AlreadyCancelled);
    }

    let turf = queries::get_turf(&tx, &booking.turf_id)?.ok_or(ReservationError::TurfNotFound)?;
    let revenue_amount = match turf.commission_mode {
        CommissionMode::Fixed => turf.commission_amount,
        CommissionMode::Percentage => booking.total_amount * turf.commission_amount / 100,
    };

    queries::mark_booking_paid(&tx, booking_id, actor_id, now).map_err(map_write_err)?;
    queries::insert_revenue(&tx, &Uuid::new_v4().to_string(), booking_id, revenue_amount)
        .map_err(map_write_err)?;

    let confirmed = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    tx.commit().map_err(map_write_err)?;

    tracing::info!(booking_id, actor_id, revenue_amount, "payment confirmed");
    Ok((confirmed, revenue_amount))
}

/// Records customer feedback on a booking. Only the booking's customer may
/// leave it, and only once the booking is confirmed (paid).
pub fn add_feedback(
    conn: &mut Connection,
    booking_id: &str,
    customer_id: &str,
    rating: i64,
    text: &str,
    now: NaiveDateTime,
) -> Result<Feedback, ReservationError> {
    let tx = conn.transaction()?;

    let booking = queries::get_booking(&tx, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    if booking.customer_id != customer_id {
        return Err(ReservationError::Forbidden);
    }
    if booking.booking_status != BookingStatus::Confirmed {
        return Err(ReservationError::FeedbackNotAllowed);
    }

    let feedback = Feedback {
        id: Uuid::new_v4().to_string(),
        booking_id: booking_id.to_string(),
        customer_id: customer_id.to_string(),
        rating,
        feedback: text.to_string(),
        created_at: now,
    };

    queries::insert_feedback(&tx, &feedback).map_err(map_write_err)?;
    tx.commit().map_err(map_write_err)?;

    tracing::info!(booking_id, customer_id, rating, "feedback added");
    Ok(feedback)
}

fn active_turf(conn: &Connection, turf_id: &str) -> Result<Turf, ReservationError> {
    let turf = queries::get_turf(conn, turf_id)?.ok_or(ReservationError::TurfNotFound)?;
    if !turf.is_active || !turf.is_verified {
        return Err(ReservationError::TurfUnavailable);
    }
    Ok(turf)
}

/// Loads a booking for update/extend: must exist, belong to the caller, and
/// not be cancelled.
fn owned_modifiable_booking(
    conn: &Connection,
    booking_id: &str,
    customer_id: &str,
) -> Result<Booking, ReservationError> {
    let booking = queries::get_booking(conn, booking_id)?.ok_or(ReservationError::BookingNotFound)?;
    if booking.customer_id != customer_id {
        return Err(ReservationError::Forbidden);
    }
    if booking.booking_status == BookingStatus::Cancelled {
        return Err(ReservationError::UpdateNotAllowed);
    }
    Ok(booking)
}

fn map_write_err(e: rusqlite::Error) -> ReservationError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation
                || f.code == rusqlite::ErrorCode::DatabaseBusy =>
        {
            ReservationError::StorageConflict
        }
        _ => ReservationError::Storage(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::NaiveDate;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn window(d: &str, start: &str, end: &str) -> BookingWindow {
        BookingWindow {
            reservation_date: date(d),
            start_time: dt(start),
            end_time: dt(end),
        }
    }

    const NOW: &str = "2025-04-20 10:00";

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO turfs (id, owner_id, turf_name, booking_price, is_active, is_verified, commission_mode, commission_amount, created_at)
             VALUES ('turf-1', 'owner-1', 'Greenfield', 1200, 1, 1, 'fixed', 100, '2025-01-01 00:00:00')",
            [],
        )
        .unwrap();
        conn
    }

    fn policy() -> BookingPolicy {
        BookingPolicy::default()
    }

    fn seed_discount(conn: &Connection, amount: i64) {
        conn.execute(
            "INSERT INTO discounts (id, turf_id, discount_amount, is_active, created_at)
             VALUES ('disc-1', 'turf-1', ?1, 1, '2025-01-01 00:00:00')",
            [amount],
        )
        .unwrap();
    }

    #[test]
    fn book_computes_amount_and_initial_state() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00"),
            dt(NOW),
        )
        .unwrap();

        assert_eq!(booking.total_amount, 6000);
        assert_eq!(booking.booking_status, BookingStatus::Reserved);
        assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
        assert_eq!(booking.created_by, "alice");
    }

    #[test]
    fn book_applies_active_discount() {
        let mut conn = setup_db();
        seed_discount(&conn, 500);

        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00"),
            dt(NOW),
        )
        .unwrap();
        assert_eq!(booking.total_amount, 5500);
    }

    #[test]
    fn book_unknown_turf() {
        let mut conn = setup_db();
        let result = book(
            &mut conn,
            &policy(),
            "nope",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        );
        assert!(matches!(result, Err(ReservationError::TurfNotFound)));
    }

    #[test]
    fn book_unverified_turf() {
        let mut conn = setup_db();
        conn.execute("UPDATE turfs SET is_verified = 0 WHERE id = 'turf-1'", [])
            .unwrap();
        let result = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        );
        assert!(matches!(result, Err(ReservationError::TurfUnavailable)));
    }

    #[test]
    fn second_customer_cannot_double_book() {
        let mut conn = setup_db();
        let w = window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00");
        book(&mut conn, &policy(), "turf-1", "alice", w, dt(NOW)).unwrap();

        let result = book(&mut conn, &policy(), "turf-1", "bob", w, dt(NOW));
        assert!(matches!(result, Err(ReservationError::SlotAlreadyBooked)));
    }

    #[test]
    fn same_customer_rebook_is_still_a_conflict_on_create() {
        let mut conn = setup_db();
        let w = window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00");
        book(&mut conn, &policy(), "turf-1", "alice", w, dt(NOW)).unwrap();

        let result = book(&mut conn, &policy(), "turf-1", "alice", w, dt(NOW));
        assert!(matches!(result, Err(ReservationError::SlotAlreadyBooked)));
    }

    #[test]
    fn update_same_window_self_exempt() {
        let mut conn = setup_db();
        let w = window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00");
        let booking = book(&mut conn, &policy(), "turf-1", "alice", w, dt(NOW)).unwrap();

        let updated = update(&mut conn, &policy(), &booking.id, "alice", w, dt(NOW)).unwrap();
        assert_eq!(updated.total_amount, 6000);
        assert_eq!(updated.updated_by.as_deref(), Some("alice"));
    }

    #[test]
    fn update_by_stranger_is_forbidden() {
        let mut conn = setup_db();
        let w = window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00");
        let booking = book(&mut conn, &policy(), "turf-1", "alice", w, dt(NOW)).unwrap();

        let result = update(&mut conn, &policy(), &booking.id, "bob", w, dt(NOW));
        assert!(matches!(result, Err(ReservationError::Forbidden)));
    }

    #[test]
    fn update_within_cutoff_rejected() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-20", "2025-04-20 13:00", "2025-04-20 15:00"),
            dt(NOW),
        )
        .unwrap();

        // 12:30 is inside the one-hour cutoff before a 13:00 start
        let result = update(
            &mut conn,
            &policy(),
            &booking.id,
            "alice",
            window("2025-04-20", "2025-04-20 13:30", "2025-04-20 15:30"),
            dt("2025-04-20 12:30"),
        );
        assert!(matches!(result, Err(ReservationError::UpdateCutoffPassed(1))));
    }

    #[test]
    fn update_cancelled_booking_rejected() {
        let mut conn = setup_db();
        let w = window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00");
        let booking = book(&mut conn, &policy(), "turf-1", "alice", w, dt(NOW)).unwrap();
        cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt(NOW)).unwrap();

        let result = update(&mut conn, &policy(), &booking.id, "alice", w, dt(NOW));
        assert!(matches!(result, Err(ReservationError::UpdateNotAllowed)));
    }

    #[test]
    fn update_over_other_customers_slot_conflicts() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();
        book(
            &mut conn,
            &policy(),
            "turf-1",
            "bob",
            window("2025-04-25", "2025-04-25 16:00", "2025-04-25 18:00"),
            dt(NOW),
        )
        .unwrap();

        let result = update(
            &mut conn,
            &policy(),
            &booking.id,
            "alice",
            window("2025-04-25", "2025-04-25 15:00", "2025-04-25 17:00"),
            dt(NOW),
        );
        assert!(matches!(result, Err(ReservationError::SlotAlreadyBooked)));
    }

    #[test]
    fn extend_recomputes_from_original_start() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();
        assert_eq!(booking.total_amount, 2400);

        let extended = extend(
            &mut conn,
            &booking.id,
            "alice",
            date("2025-04-25"),
            dt("2025-04-25 18:00"),
            dt(NOW),
        )
        .unwrap();
        assert_eq!(extended.end_time, dt("2025-04-25 18:00"));
        assert_eq!(extended.start_time, booking.start_time);
        assert_eq!(extended.total_amount, 6000);
    }

    #[test]
    fn extend_blocked_by_later_booking() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();
        book(
            &mut conn,
            &policy(),
            "turf-1",
            "bob",
            window("2025-04-25", "2025-04-25 16:00", "2025-04-25 18:00"),
            dt(NOW),
        )
        .unwrap();

        let result = extend(
            &mut conn,
            &booking.id,
            "alice",
            date("2025-04-25"),
            dt("2025-04-25 17:00"),
            dt(NOW),
        );
        assert!(matches!(result, Err(ReservationError::SlotAlreadyBooked)));
    }

    #[test]
    fn cancel_within_cutoff_rejected() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-20", "2025-04-20 13:00", "2025-04-20 15:00"),
            dt("2025-04-20 06:00"),
        )
        .unwrap();

        // 10:00 is only 3 hours before the 13:00 start; cutoff is 5 hours
        let result = cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt(NOW));
        assert!(matches!(result, Err(ReservationError::CancelCutoffPassed(5))));
    }

    #[test]
    fn cancel_records_canceller() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();

        let cancelled =
            cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt(NOW)).unwrap();
        assert_eq!(cancelled.booking_status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("alice"));
    }

    #[test]
    fn cancelling_twice_reports_already_cancelled() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();
        cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt(NOW)).unwrap();

        let result = cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt(NOW));
        assert!(matches!(result, Err(ReservationError::AlreadyCancelled)));
    }

    #[test]
    fn cancelled_slot_can_be_rebooked() {
        let mut conn = setup_db();
        let w = window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00");
        let booking = book(&mut conn, &policy(), "turf-1", "alice", w, dt(NOW)).unwrap();
        cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt(NOW)).unwrap();

        let rebooked = book(&mut conn, &policy(), "turf-1", "bob", w, dt(NOW)).unwrap();
        assert_eq!(rebooked.customer_id, "bob");
    }

    #[test]
    fn past_booking_cannot_be_cancelled() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-21", "2025-04-21 13:00", "2025-04-21 15:00"),
            dt(NOW),
        )
        .unwrap();

        let result =
            cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt("2025-04-22 10:00"));
        assert!(matches!(result, Err(ReservationError::PastBookingAction)));
    }

    #[test]
    fn manager_cancel_has_no_cutoff_and_records_reason() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-20", "2025-04-20 13:00", "2025-04-20 15:00"),
            dt("2025-04-20 06:00"),
        )
        .unwrap();

        let cancelled = cancel_by_manager(
            &mut conn,
            &booking.id,
            "turf-1",
            "waterlogged pitch",
            "manager-1",
            dt("2025-04-20 12:00"),
        )
        .unwrap();
        assert_eq!(cancelled.booking_status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("manager-1"));
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("waterlogged pitch"));
    }

    #[test]
    fn manager_cannot_touch_another_turfs_booking() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();

        let result =
            cancel_by_manager(&mut conn, &booking.id, "turf-2", "nope", "manager-2", dt(NOW));
        assert!(matches!(result, Err(ReservationError::Forbidden)));
    }

    #[test]
    fn confirm_payment_fixed_commission() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00"),
            dt(NOW),
        )
        .unwrap();

        let (confirmed, revenue) =
            confirm_payment(&mut conn, &booking.id, "turf-1", "manager-1", dt(NOW)).unwrap();
        assert_eq!(confirmed.payment_status, PaymentStatus::Paid);
        assert_eq!(confirmed.booking_status, BookingStatus::Confirmed);
        assert_eq!(revenue, 100);

        let recorded = queries::get_revenue_for_booking(&conn, &booking.id).unwrap();
        assert_eq!(recorded, Some(100));
    }

    #[test]
    fn confirm_payment_percentage_commission() {
        let mut conn = setup_db();
        conn.execute(
            "UPDATE turfs SET commission_mode = 'percentage', commission_amount = 10 WHERE id = 'turf-1'",
            [],
        )
        .unwrap();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 18:00"),
            dt(NOW),
        )
        .unwrap();

        let (_, revenue) =
            confirm_payment(&mut conn, &booking.id, "turf-1", "manager-1", dt(NOW)).unwrap();
        assert_eq!(revenue, 600);
    }

    #[test]
    fn confirm_payment_on_cancelled_booking_rejected() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();
        cancel_by_customer(&mut conn, &policy(), &booking.id, "alice", dt(NOW)).unwrap();

        let result = confirm_payment(&mut conn, &booking.id, "turf-1", "manager-1", dt(NOW));
        assert!(matches!(result, Err(ReservationError::AlreadyCancelled)));
        assert_eq!(queries::get_revenue_for_booking(&conn, &booking.id).unwrap(), None);
    }

    #[test]
    fn exact_slot_duplicate_maps_to_storage_conflict() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();

        // a write that slipped past the conflict scan lands on the partial
        // unique index over (turf_id, reservation_date, start_time)
        let mut rival = booking.clone();
        rival.id = "rival".to_string();
        rival.customer_id = "bob".to_string();
        rival.end_time = dt("2025-04-25 14:00");

        let err = queries::insert_booking(&conn, &rival).unwrap_err();
        assert!(matches!(map_write_err(err), ReservationError::StorageConflict));
    }

    #[test]
    fn feedback_on_confirmed_booking() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();
        confirm_payment(&mut conn, &booking.id, "turf-1", "manager-1", dt(NOW)).unwrap();

        let feedback =
            add_feedback(&mut conn, &booking.id, "alice", 4, "great pitch", dt(NOW)).unwrap();
        assert_eq!(feedback.rating, 4);

        let listed = queries::feedbacks_for_turf(&conn, "turf-1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].feedback, "great pitch");
    }

    #[test]
    fn feedback_before_payment_rejected() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();

        let result = add_feedback(&mut conn, &booking.id, "alice", 4, "great pitch", dt(NOW));
        assert!(matches!(result, Err(ReservationError::FeedbackNotAllowed)));
    }

    #[test]
    fn feedback_by_stranger_is_forbidden() {
        let mut conn = setup_db();
        let booking = book(
            &mut conn,
            &policy(),
            "turf-1",
            "alice",
            window("2025-04-25", "2025-04-25 13:00", "2025-04-25 15:00"),
            dt(NOW),
        )
        .unwrap();
        confirm_payment(&mut conn, &booking.id, "turf-1", "manager-1", dt(NOW)).unwrap();

        let result = add_feedback(&mut conn, &booking.id, "bob", 4, "great pitch", dt(NOW));
        assert!(matches!(result, Err(ReservationError::Forbidden)));
    }

    #[test]
    fn accepted_bookings_never_overlap() {
        let mut conn = setup_db();
        let attempts = [
            ("alice", "2025-04-25 10:00", "2025-04-25 12:00"),
            ("bob", "2025-04-25 11:00", "2025-04-25 13:00"),
            ("carol", "2025-04-25 12:00", "2025-04-25 14:00"),
            ("dave", "2025-04-25 13:30", "2025-04-25 15:00"),
            ("erin", "2025-04-25 14:00", "2025-04-25 16:00"),
        ];

        for (customer, start, end) in attempts {
            let _ = book(
                &mut conn,
                &policy(),
                "turf-1",
                customer,
                window("2025-04-25", start, end),
                dt(NOW),
            );
        }

        let accepted = queries::list_for_turf_on_date(&conn, "turf-1", date("2025-04-25")).unwrap();
        for a in &accepted {
            for b in &accepted {
                if a.id != b.id {
                    assert!(
                        a.end_time <= b.start_time || b.end_time <= a.start_time,
                        "overlap between {} and {}",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }
}
