pub mod booking;
pub mod conflict;
pub mod notify;
pub mod pricing;
pub mod validation;
