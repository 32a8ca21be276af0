//! HTTP handlers, one module per resource.

pub mod advisory;
pub mod bookings;
pub mod experts;
pub mod health;
pub mod payments;
pub mod qr;
