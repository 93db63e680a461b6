pub mod bookings;
pub mod navigation;
pub mod therapists;
