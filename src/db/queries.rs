use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Result, Row};

use crate::models::{Booking, BookingStatus, CommissionMode, Discount, Feedback, PaymentStatus, Turf};

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ── Turfs ──

pub fn insert_turf(conn: &Connection, turf: &Turf) -> Result<()> {
    conn.execute(
        "INSERT INTO turfs (id, owner_id, turf_name, booking_price, is_active, is_verified, commission_mode, commission_amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            turf.id,
            turf.owner_id,
            turf.turf_name,
            turf.booking_price,
            turf.is_active as i32,
            turf.is_verified as i32,
            turf.commission_mode.as_str(),
            turf.commission_amount,
            turf.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_turf(conn: &Connection, id: &str) -> Result<Option<Turf>> {
    let result = conn.query_row(
        "SELECT id, owner_id, turf_name, booking_price, is_active, is_verified, commission_mode, commission_amount, created_at
         FROM turfs WHERE id = ?1",
        params![id],
        parse_turf_row,
    );

    match result {
        Ok(turf) => Ok(Some(turf)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Turfs that are active, verified and have no booking overlapping the
/// given window on the given date.
pub fn turfs_available_for_window(
    conn: &Connection,
    date: NaiveDate,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Turf>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.owner_id, t.turf_name, t.booking_price, t.is_active, t.is_verified, t.commission_mode, t.commission_amount, t.created_at
         FROM turfs t
         WHERE t.is_active = 1 AND t.is_verified = 1
           AND NOT EXISTS (
               SELECT 1 FROM bookings b
               WHERE b.turf_id = t.id
                 AND b.reservation_date = ?1
                 AND b.booking_status != 'cancelled'
                 AND b.start_time < ?3
                 AND b.end_time > ?2
           )
         ORDER BY t.turf_name ASC",
    )?;

    let rows = stmt.query_map(
        params![
            date.format(DATE_FMT).to_string(),
            start.format(DATETIME_FMT).to_string(),
            end.format(DATETIME_FMT).to_string(),
        ],
        parse_turf_row,
    )?;

    rows.collect()
}

fn parse_turf_row(row: &Row) -> Result<Turf> {
    let commission_mode: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    Ok(Turf {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        turf_name: row.get(2)?,
        booking_price: row.get(3)?,
        is_active: row.get::<_, i32>(4)? != 0,
        is_verified: row.get::<_, i32>(5)? != 0,
        commission_mode: CommissionMode::parse(&commission_mode),
        commission_amount: row.get(7)?,
        created_at: parse_datetime(&created_at)?,
    })
}

pub fn set_turf_activation(
    conn: &Connection,
    id: &str,
    is_active: bool,
    is_verified: bool,
) -> Result<bool> {
    let count = conn.execute(
        "UPDATE turfs SET is_active = ?1, is_verified = ?2 WHERE id = ?3",
        params![is_active as i32, is_verified as i32, id],
    )?;
    Ok(count > 0)
}

// ── Turf managers ──

pub fn assign_manager(conn: &Connection, turf_id: &str, manager_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO turf_managers (manager_id, turf_id) VALUES (?1, ?2)
         ON CONFLICT(manager_id) DO UPDATE SET turf_id = excluded.turf_id",
        params![manager_id, turf_id],
    )?;
    Ok(())
}

pub fn turf_for_manager(conn: &Connection, manager_id: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT turf_id FROM turf_managers WHERE manager_id = ?1",
        params![manager_id],
        |row| row.get(0),
    );

    match result {
        Ok(turf_id) => Ok(Some(turf_id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

// ── Discounts ──

pub fn insert_discount(conn: &Connection, discount: &Discount) -> Result<()> {
    conn.execute(
        "INSERT INTO discounts (id, turf_id, discount_amount, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            discount.id,
            discount.turf_id,
            discount.discount_amount,
            discount.is_active as i32,
            discount.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_discount(conn: &Connection, id: &str) -> Result<Option<Discount>> {
    let result = conn.query_row(
        "SELECT id, turf_id, discount_amount, is_active, created_at FROM discounts WHERE id = ?1",
        params![id],
        parse_discount_row,
    );

    match result {
        Ok(discount) => Ok(Some(discount)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The turf's currently active discount. Activation keeps at most one row
/// active per turf; the ordering here is the documented tie-break if older
/// data predates that rule.
pub fn get_active_discount(conn: &Connection, turf_id: &str) -> Result<Option<Discount>> {
    let result = conn.query_row(
        "SELECT id, turf_id, discount_amount, is_active, created_at
         FROM discounts WHERE turf_id = ?1 AND is_active = 1
         ORDER BY created_at DESC, id DESC LIMIT 1",
        params![turf_id],
        parse_discount_row,
    );

    match result {
        Ok(discount) => Ok(Some(discount)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Activates a discount and deactivates every sibling on the same turf.
/// Caller wraps this in a transaction.
pub fn activate_discount(conn: &Connection, discount: &Discount) -> Result<()> {
    conn.execute(
        "UPDATE discounts SET is_active = 0 WHERE turf_id = ?1 AND id != ?2",
        params![discount.turf_id, discount.id],
    )?;
    conn.execute(
        "UPDATE discounts SET is_active = 1 WHERE id = ?1",
        params![discount.id],
    )?;
    Ok(())
}

pub fn deactivate_discount(conn: &Connection, id: &str) -> Result<bool> {
    let count = conn.execute("UPDATE discounts SET is_active = 0 WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_discount_row(row: &Row) -> Result<Discount> {
    let created_at: String = row.get(4)?;
    Ok(Discount {
        id: row.get(0)?,
        turf_id: row.get(1)?,
        discount_amount: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        created_at: parse_datetime(&created_at)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, turf_id, customer_id, reservation_date, start_time, end_time, total_amount, payment_status, booking_status, cancelled_by, cancel_reason, created_by, created_at, updated_by, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, turf_id, customer_id, reservation_date, start_time, end_time, total_amount, payment_status, booking_status, cancelled_by, cancel_reason, created_by, created_at, updated_by, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            booking.id,
            booking.turf_id,
            booking.customer_id,
            booking.reservation_date.format(DATE_FMT).to_string(),
            booking.start_time.format(DATETIME_FMT).to_string(),
            booking.end_time.format(DATETIME_FMT).to_string(),
            booking.total_amount,
            booking.payment_status.as_str(),
            booking.booking_status.as_str(),
            booking.cancelled_by,
            booking.cancel_reason,
            booking.created_by,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_by,
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Non-cancelled bookings for one turf on one reservation date, the input
/// to the conflict scan.
pub fn list_for_turf_on_date(
    conn: &Connection,
    turf_id: &str,
    date: NaiveDate,
) -> Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE turf_id = ?1 AND reservation_date = ?2 AND booking_status != 'cancelled'
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![turf_id, date.format(DATE_FMT).to_string()],
        parse_booking_row,
    )?;

    rows.collect()
}

pub fn bookings_for_customer(
    conn: &Connection,
    customer_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE customer_id = ?1
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
    ))?;

    let rows = stmt.query_map(params![customer_id, limit, offset], parse_booking_row)?;
    rows.collect()
}

pub fn bookings_for_turf_in_range(
    conn: &Connection,
    turf_id: &str,
    from: NaiveDate,
    to: NaiveDate,
    limit: i64,
    offset: i64,
) -> Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE turf_id = ?1 AND reservation_date >= ?2 AND reservation_date <= ?3
         ORDER BY created_at DESC LIMIT ?4 OFFSET ?5"
    ))?;

    let rows = stmt.query_map(
        params![
            turf_id,
            from.format(DATE_FMT).to_string(),
            to.format(DATE_FMT).to_string(),
            limit,
            offset,
        ],
        parse_booking_row,
    )?;
    rows.collect()
}

pub fn update_booking_window(
    conn: &Connection,
    id: &str,
    date: NaiveDate,
    start: NaiveDateTime,
    end: NaiveDateTime,
    total_amount: i64,
    updated_by: &str,
    updated_at: NaiveDateTime,
) -> Result<()> {
    conn.execute(
        "UPDATE bookings
         SET reservation_date = ?1, start_time = ?2, end_time = ?3, total_amount = ?4,
             updated_by = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            date.format(DATE_FMT).to_string(),
            start.format(DATETIME_FMT).to_string(),
            end.format(DATETIME_FMT).to_string(),
            total_amount,
            updated_by,
            updated_at.format(DATETIME_FMT).to_string(),
            id,
        ],
    )?;
    Ok(())
}

pub fn update_booking_end(
    conn: &Connection,
    id: &str,
    end: NaiveDateTime,
    total_amount: i64,
    updated_by: &str,
    updated_at: NaiveDateTime,
) -> Result<()> {
    conn.execute(
        "UPDATE bookings SET end_time = ?1, total_amount = ?2, updated_by = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            end.format(DATETIME_FMT).to_string(),
            total_amount,
            updated_by,
            updated_at.format(DATETIME_FMT).to_string(),
            id,
        ],
    )?;
    Ok(())
}

pub fn cancel_booking(
    conn: &Connection,
    id: &str,
    cancelled_by: &str,
    reason: Option<&str>,
    updated_at: NaiveDateTime,
) -> Result<()> {
    conn.execute(
        "UPDATE bookings
         SET booking_status = 'cancelled', cancelled_by = ?1, cancel_reason = ?2,
             updated_by = ?1, updated_at = ?3
         WHERE id = ?4",
        params![
            cancelled_by,
            reason,
            updated_at.format(DATETIME_FMT).to_string(),
            id,
        ],
    )?;
    Ok(())
}

pub fn mark_booking_paid(
    conn: &Connection,
    id: &str,
    updated_by: &str,
    updated_at: NaiveDateTime,
) -> Result<()> {
    conn.execute(
        "UPDATE bookings
         SET payment_status = 'paid', booking_status = 'confirmed', updated_by = ?1, updated_at = ?2
         WHERE id = ?3",
        params![updated_by, updated_at.format(DATETIME_FMT).to_string(), id],
    )?;
    Ok(())
}

fn parse_booking_row(row: &Row) -> Result<Booking> {
    let reservation_date: String = row.get(3)?;
    let start_time: String = row.get(4)?;
    let end_time: String = row.get(5)?;
    let payment_status: String = row.get(7)?;
    let booking_status: String = row.get(8)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(14)?;

    Ok(Booking {
        id: row.get(0)?,
        turf_id: row.get(1)?,
        customer_id: row.get(2)?,
        reservation_date: parse_date(&reservation_date)?,
        start_time: parse_datetime(&start_time)?,
        end_time: parse_datetime(&end_time)?,
        total_amount: row.get(6)?,
        payment_status: PaymentStatus::parse(&payment_status),
        booking_status: BookingStatus::parse(&booking_status),
        cancelled_by: row.get(9)?,
        cancel_reason: row.get(10)?,
        created_by: row.get(11)?,
        created_at: parse_datetime(&created_at)?,
        updated_by: row.get(13)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

// ── Feedback ──

pub fn insert_feedback(conn: &Connection, feedback: &Feedback) -> Result<()> {
    conn.execute(
        "INSERT INTO feedbacks (id, booking_id, customer_id, rating, feedback, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            feedback.id,
            feedback.booking_id,
            feedback.customer_id,
            feedback.rating,
            feedback.feedback,
            feedback.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// All feedback left on a turf's bookings, oldest first.
pub fn feedbacks_for_turf(conn: &Connection, turf_id: &str) -> Result<Vec<Feedback>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.booking_id, f.customer_id, f.rating, f.feedback, f.created_at
         FROM feedbacks f
         JOIN bookings b ON b.id = f.booking_id
         WHERE b.turf_id = ?1
         ORDER BY f.created_at ASC",
    )?;

    let rows = stmt.query_map(params![turf_id], parse_feedback_row)?;
    rows.collect()
}

fn parse_feedback_row(row: &Row) -> Result<Feedback> {
    let created_at: String = row.get(5)?;
    Ok(Feedback {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        customer_id: row.get(2)?,
        rating: row.get(3)?,
        feedback: row.get(4)?,
        created_at: parse_datetime(&created_at)?,
    })
}

// ── Revenue ──

pub fn insert_revenue(
    conn: &Connection,
    id: &str,
    booking_id: &str,
    amount: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO revenues (id, booking_id, amount) VALUES (?1, ?2, ?3)",
        params![id, booking_id, amount],
    )?;
    Ok(())
}

pub fn get_revenue_for_booking(conn: &Connection, booking_id: &str) -> Result<Option<i64>> {
    let result = conn.query_row(
        "SELECT amount FROM revenues WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    );

    match result {
        Ok(amount) => Ok(Some(amount)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}
