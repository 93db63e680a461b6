//! # Rejuvenators Models
//!
//! Domain models and DTOs shared by the API and the CLI.
//!
//! - [`ids`]: typed UUID newtypes
//! - [`identity`]: the signed-in user
//! - [`bookings`]: bookings, status enums, lifecycle DTOs
//! - [`therapists`]: therapist profiles
//! - [`directory`]: customers and services

pub mod bookings;
pub mod directory;
pub mod identity;
pub mod ids;
pub mod therapists;

pub use bookings::{
    Booking, BookingFilterParams, BookingListItem, BookingQuery, BookingStatus, BulkDeleteDto,
    BulkFailure, BulkOutcome, BulkPaymentStatusDto, BulkStatusDto, CreateBookingDto,
    InvalidStatus, PaginatedBookingsResponse, PaymentStatus, PaymentStatusChangeDto,
    StatusChangeDto, UpdateBookingDto,
};
pub use directory::{Customer, Service};
pub use identity::Identity;
pub use ids::{BookingId, CustomerId, ServiceId, TherapistId, UserId};
pub use therapists::{TherapistProfile, TherapistProfileView, UpdateTherapistProfileDto};
