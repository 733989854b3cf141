pub mod booking;
pub mod feedback;
pub mod turf;

pub use booking::{Booking, BookingStatus, BookingWindow, PaymentStatus};
pub use feedback::Feedback;
pub use turf::{CommissionMode, Discount, Turf};
