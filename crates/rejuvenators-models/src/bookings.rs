//! Booking domain models and DTOs.
//!
//! `status` and `payment_status` are separate axes. Neither DTO for the
//! generic edit nor the create DTO carries them: status changes go through
//! the lifecycle endpoints only.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rejuvenators_core::serde::{
    deserialize_nullable, deserialize_optional_filter, deserialize_optional_uuid,
};
use rejuvenators_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::ids::{BookingId, CustomerId, ServiceId, TherapistId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStatus {
    #[error("Invalid booking status: {0}")]
    Booking(String),
    #[error("Invalid payment status: {0}")]
    Payment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Requested,
    Confirmed,
    Completed,
    Cancelled,
    Declined,
    TimeoutReassigned,
    SeekingAlternate,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        BookingStatus::Requested,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Declined,
        BookingStatus::TimeoutReassigned,
        BookingStatus::SeekingAlternate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Declined => "declined",
            BookingStatus::TimeoutReassigned => "timeout_reassigned",
            BookingStatus::SeekingAlternate => "seeking_alternate",
        }
    }

    /// No lifecycle move leaves these without an override.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Declined
        )
    }

    /// Tag colour used by the console grid.
    pub fn color(&self) -> &'static str {
        match self {
            BookingStatus::Requested | BookingStatus::SeekingAlternate => "orange",
            BookingStatus::Confirmed => "blue",
            BookingStatus::Completed => "green",
            BookingStatus::Cancelled | BookingStatus::Declined => "red",
            BookingStatus::TimeoutReassigned => "purple",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus::Booking(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "orange",
            PaymentStatus::Paid => "green",
            PaymentStatus::Refunded => "red",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus::Payment(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: CustomerId,
    pub therapist_id: TherapistId,
    pub service_id: ServiceId,
    pub booking_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Price charged to the customer, in cents
    pub price_cents: i64,
    /// Amount paid out to the therapist, in cents
    pub therapist_fee_cents: i64,
    pub address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `bookings` row. Statuses are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub therapist_id: Uuid,
    pub service_id: Uuid,
    pub booking_time: DateTime<Utc>,
    pub status: String,
    pub payment_status: String,
    pub price_cents: i64,
    pub therapist_fee_cents: i64,
    pub address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = InvalidStatus;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            therapist_id: row.therapist_id.into(),
            service_id: row.service_id.into(),
            booking_time: row.booking_time,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            price_cents: row.price_cents,
            therapist_fee_cents: row.therapist_fee_cents,
            address: row.address,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A booking row joined with the names the grid displays.
#[derive(Debug, Clone, FromRow)]
pub struct BookingListRow {
    #[sqlx(flatten)]
    pub booking: BookingRow,
    pub customer_name: Option<String>,
    pub therapist_name: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingListItem {
    #[serde(flatten)]
    pub booking: Booking,
    pub customer_name: Option<String>,
    pub therapist_name: Option<String>,
    pub service_name: Option<String>,
    pub status_color: &'static str,
    pub payment_status_color: &'static str,
}

impl BookingListItem {
    pub fn new(
        booking: Booking,
        customer_name: Option<String>,
        therapist_name: Option<String>,
        service_name: Option<String>,
    ) -> Self {
        Self {
            status_color: booking.status.color(),
            payment_status_color: booking.payment_status.color(),
            booking,
            customer_name,
            therapist_name,
            service_name,
        }
    }
}

impl TryFrom<BookingListRow> for BookingListItem {
    type Error = InvalidStatus;

    fn try_from(row: BookingListRow) -> Result<Self, Self::Error> {
        Ok(BookingListItem::new(
            row.booking.try_into()?,
            row.customer_name,
            row.therapist_name,
            row.service_name,
        ))
    }
}

/// New bookings always start as `requested` / `pending`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookingDto {
    pub customer_id: CustomerId,
    pub therapist_id: TherapistId,
    pub service_id: ServiceId,
    pub booking_time: DateTime<Utc>,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[validate(range(min = 0))]
    pub therapist_fee_cents: i64,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Detail edits. Unknown fields (including `status` and `payment_status`)
/// are rejected. `"notes": null` clears the notes.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateBookingDto {
    pub customer_id: Option<CustomerId>,
    pub therapist_id: Option<TherapistId>,
    pub service_id: Option<ServiceId>,
    pub booking_time: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    #[validate(range(min = 0))]
    pub therapist_fee_cents: Option<i64>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub notes: Option<Option<String>>,
}

impl UpdateBookingDto {
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none()
            && self.therapist_id.is_none()
            && self.service_id.is_none()
            && self.booking_time.is_none()
            && self.price_cents.is_none()
            && self.therapist_fee_cents.is_none()
            && self.address.is_none()
            && self.notes.is_none()
    }

    /// Applies the present fields to `booking`.
    pub fn apply_to(&self, booking: &mut Booking) {
        if let Some(v) = self.customer_id {
            booking.customer_id = v;
        }
        if let Some(v) = self.therapist_id {
            booking.therapist_id = v;
        }
        if let Some(v) = self.service_id {
            booking.service_id = v;
        }
        if let Some(v) = self.booking_time {
            booking.booking_time = v;
        }
        if let Some(v) = self.price_cents {
            booking.price_cents = v;
        }
        if let Some(v) = self.therapist_fee_cents {
            booking.therapist_fee_cents = v;
        }
        if let Some(v) = &self.address {
            booking.address = v.clone();
        }
        if let Some(v) = &self.notes {
            booking.notes = v.clone();
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StatusChangeDto {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaymentStatusChangeDto {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkStatusDto {
    #[validate(length(min = 1, message = "Select at least one booking"))]
    pub ids: Vec<BookingId>,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkPaymentStatusDto {
    #[validate(length(min = 1, message = "Select at least one booking"))]
    pub ids: Vec<BookingId>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkDeleteDto {
    #[validate(length(min = 1, message = "Select at least one booking"))]
    pub ids: Vec<BookingId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BulkFailure {
    pub id: BookingId,
    pub reason: String,
}

/// Per-item result of a bulk operation. Applied items are never rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BulkOutcome {
    pub success: Vec<BookingId>,
    pub failed: Vec<BulkFailure>,
    pub success_count: usize,
    pub failed_count: usize,
}

impl BulkOutcome {
    pub fn succeeded(&mut self, id: BookingId) {
        self.success.push(id);
        self.success_count += 1;
    }

    pub fn failed(&mut self, id: BookingId, reason: impl Into<String>) {
        self.failed.push(BulkFailure {
            id,
            reason: reason.into(),
        });
        self.failed_count += 1;
    }

    pub fn failed_ids(&self) -> Vec<BookingId> {
        self.failed.iter().map(|f| f.id).collect()
    }
}

/// Drops repeated ids, keeping the first occurrence.
pub fn dedupe_ids(ids: &[BookingId]) -> Vec<BookingId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Query string for `GET /api/bookings`. Select filters send `all` or an
/// empty value when nothing is chosen.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct BookingFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_filter")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_filter")]
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub therapist_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub service_id: Option<Uuid>,
    /// First day of the booking date range (inclusive)
    pub from: Option<NaiveDate>,
    /// Last day of the booking date range (inclusive)
    pub to: Option<NaiveDate>,
    /// Matches customer, therapist and service names plus customer email and phone
    #[serde(default, deserialize_with = "deserialize_optional_filter")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Typed store query built from [`BookingFilterParams`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub therapist_id: Option<TherapistId>,
    pub service_id: Option<ServiceId>,
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub until: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl BookingFilterParams {
    pub fn to_query(&self) -> Result<BookingQuery, InvalidStatus> {
        Ok(BookingQuery {
            status: self.status.as_deref().map(str::parse).transpose()?,
            payment_status: self.payment_status.as_deref().map(str::parse).transpose()?,
            therapist_id: self.therapist_id.map(TherapistId::from_uuid),
            service_id: self.service_id.map(ServiceId::from_uuid),
            from: self.from.map(start_of_day),
            until: self
                .to
                .and_then(|d| d.checked_add_days(Days::new(1)))
                .map(start_of_day),
            search: self.search.clone(),
            limit: self.pagination.limit(),
            offset: self.pagination.offset(),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedBookingsResponse {
    pub data: Vec<BookingListItem>,
    pub meta: PaginationMeta,
}
