use async_trait::async_trait;

use crate::models::Booking;

/// Fire-and-forget booking event notifications (email/SMS in production).
/// Failures are logged and swallowed by callers; a notification must never
/// block or fail the booking transaction it follows.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_created(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn booking_updated(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn booking_cancelled(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn payment_confirmed(&self, booking: &Booking) -> anyhow::Result<()>;
}

/// Default notifier: writes the event to the log and nothing else.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_created(&self, booking: &Booking) -> anyhow::Result<()> {
        tracing::info!(booking_id = %booking.id, customer_id = %booking.customer_id, "notify: booking created");
        Ok(())
    }

    async fn booking_updated(&self, booking: &Booking) -> anyhow::Result<()> {
        tracing::info!(booking_id = %booking.id, "notify: booking updated");
        Ok(())
    }

    async fn booking_cancelled(&self, booking: &Booking) -> anyhow::Result<()> {
        tracing::info!(booking_id = %booking.id, "notify: booking cancelled");
        Ok(())
    }

    async fn payment_confirmed(&self, booking: &Booking) -> anyhow::Result<()> {
        tracing::info!(booking_id = %booking.id, "notify: payment confirmed");
        Ok(())
    }
}
