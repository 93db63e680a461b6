use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use rejuvenators_core::AppError;
use rejuvenators_models::{
    Booking, BookingFilterParams, BookingId, BulkDeleteDto, BulkOutcome, BulkPaymentStatusDto,
    BulkStatusDto, CreateBookingDto, PaginatedBookingsResponse, PaymentStatusChangeDto,
    StatusChangeDto, UpdateBookingDto,
};

use crate::middleware::auth::{
    RequireCreateBookings, RequireDeleteBookings, RequireEditBookings, RequireManagePayments,
    RequireViewBookings,
};
use crate::modules::bookings::lifecycle::TransitionError;
use crate::modules::bookings::service::BookingService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingFilterParams),
    responses(
        (status = 200, description = "Page of bookings, newest first", body = PaginatedBookingsResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canViewAllBookings or canViewOwnBookings")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_bookings(
    State(state): State<AppState>,
    RequireViewBookings(identity): RequireViewBookings,
    Query(filters): Query<BookingFilterParams>,
) -> Result<Json<PaginatedBookingsResponse>, AppError> {
    let bookings = BookingService::list_bookings(&state, &identity, filters).await?;
    Ok(Json(bookings))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingDto,
    responses(
        (status = 201, description = "Booking created as requested / pending", body = Booking),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canCreateBookings"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_booking(
    State(state): State<AppState>,
    RequireCreateBookings(identity): RequireCreateBookings,
    ValidatedJson(dto): ValidatedJson<CreateBookingDto>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .lifecycle()
        .create(&identity, dto)
        .await
        .map_err(TransitionError::into_app_error)?;

    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking details", body = Booking),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - booking is not visible to the caller"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_booking(
    State(state): State<AppState>,
    RequireViewBookings(identity): RequireViewBookings,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::get_booking(&state, &identity, id).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = UpdateBookingDto,
    responses(
        (status = 200, description = "Booking updated", body = Booking),
        (status = 400, description = "Invalid input, including status fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - booking is not editable by the caller"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_booking(
    State(state): State<AppState>,
    RequireEditBookings(identity): RequireEditBookings,
    Path(id): Path<BookingId>,
    ValidatedJson(dto): ValidatedJson<UpdateBookingDto>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingService::update_booking(&state, &identity, id, dto).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canDeleteBookings"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_booking(
    State(state): State<AppState>,
    RequireDeleteBookings(identity): RequireDeleteBookings,
    Path(id): Path<BookingId>,
) -> Result<StatusCode, AppError> {
    state
        .lifecycle()
        .delete(&identity, id)
        .await
        .map_err(TransitionError::into_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = StatusChangeDto,
    responses(
        (status = 200, description = "Status changed", body = Booking),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - not editable, or terminal without override"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking changed concurrently"),
        (status = 422, description = "Already in that status, or move not allowed")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_status(
    State(state): State<AppState>,
    RequireEditBookings(identity): RequireEditBookings,
    Path(id): Path<BookingId>,
    ValidatedJson(dto): ValidatedJson<StatusChangeDto>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .lifecycle()
        .transition_status(&identity, id, dto.status)
        .await
        .map_err(TransitionError::into_app_error)?;

    Ok(Json(booking))
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/payment-status",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = PaymentStatusChangeDto,
    responses(
        (status = 200, description = "Payment status changed", body = Booking),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canManagePayments"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Already in that payment status")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_payment_status(
    State(state): State<AppState>,
    RequireManagePayments(identity): RequireManagePayments,
    Path(id): Path<BookingId>,
    ValidatedJson(dto): ValidatedJson<PaymentStatusChangeDto>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .lifecycle()
        .transition_payment(&identity, id, dto.payment_status)
        .await
        .map_err(TransitionError::into_app_error)?;

    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings/bulk/status",
    request_body = BulkStatusDto,
    responses(
        (status = 200, description = "Per-booking outcome; applied changes are kept", body = BulkOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canEditAllBookings or canEditOwnBookings"),
        (status = 422, description = "No booking ids given")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn bulk_change_status(
    State(state): State<AppState>,
    RequireEditBookings(identity): RequireEditBookings,
    ValidatedJson(dto): ValidatedJson<BulkStatusDto>,
) -> Result<Json<BulkOutcome>, AppError> {
    let outcome = state
        .lifecycle()
        .bulk_transition_status(&identity, &dto.ids, dto.status)
        .await;

    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/bookings/bulk/payment-status",
    request_body = BulkPaymentStatusDto,
    responses(
        (status = 200, description = "Per-booking outcome; applied changes are kept", body = BulkOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canManagePayments"),
        (status = 422, description = "No booking ids given")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn bulk_change_payment_status(
    State(state): State<AppState>,
    RequireManagePayments(identity): RequireManagePayments,
    ValidatedJson(dto): ValidatedJson<BulkPaymentStatusDto>,
) -> Result<Json<BulkOutcome>, AppError> {
    let outcome = state
        .lifecycle()
        .bulk_transition_payment(&identity, &dto.ids, dto.payment_status)
        .await;

    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/bookings/bulk/delete",
    request_body = BulkDeleteDto,
    responses(
        (status = 200, description = "Per-booking outcome; deleted rows stay deleted", body = BulkOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires canDeleteBookings"),
        (status = 422, description = "No booking ids given")
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn bulk_delete_bookings(
    State(state): State<AppState>,
    RequireDeleteBookings(identity): RequireDeleteBookings,
    ValidatedJson(dto): ValidatedJson<BulkDeleteDto>,
) -> Result<Json<BulkOutcome>, AppError> {
    let outcome = state.lifecycle().bulk_delete(&identity, &dto.ids).await;
    Ok(Json(outcome))
}
