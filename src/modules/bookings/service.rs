use tracing::instrument;

use rejuvenators_core::{AppError, Capability, PaginationMeta};
use rejuvenators_models::{
    Booking, BookingFilterParams, BookingId, Identity, PaginatedBookingsResponse,
    UpdateBookingDto,
};

use super::lifecycle::TransitionError;
use crate::state::AppState;

pub struct BookingService;

impl BookingService {
    /// Lists bookings visible to `identity`. Callers who can only see their
    /// own bookings get the therapist filter forced to their profile,
    /// whatever they asked for.
    #[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
    pub async fn list_bookings(
        state: &AppState,
        identity: &Identity,
        params: BookingFilterParams,
    ) -> Result<PaginatedBookingsResponse, AppError> {
        let mut query = params.to_query().map_err(AppError::bad_request)?;

        if !state.matrix.can_access(identity.role, Capability::ViewAllBookings) {
            match identity.therapist_id {
                Some(own) => query.therapist_id = Some(own),
                None => {
                    tracing::debug!("Own-bookings viewer has no therapist profile");
                    return Ok(PaginatedBookingsResponse {
                        data: Vec::new(),
                        meta: PaginationMeta::new(0, &params.pagination),
                    });
                }
            }
        }

        let (data, total) = state
            .bookings
            .list(&query)
            .await
            .map_err(|e| TransitionError::from(e).into_app_error())?;

        Ok(PaginatedBookingsResponse {
            data,
            meta: PaginationMeta::new(total, &params.pagination),
        })
    }

    #[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
    pub async fn get_booking(
        state: &AppState,
        identity: &Identity,
        id: BookingId,
    ) -> Result<Booking, AppError> {
        let booking = Self::load(state, id).await?;

        if !state.lifecycle().can_view(identity, &booking) {
            return Err(AppError::forbidden(
                "You can only view bookings assigned to you".to_string(),
            ));
        }

        Ok(booking)
    }

    /// Edits booking details. Status fields cannot be changed here.
    #[instrument(skip(state, identity, dto), fields(user_id = %identity.user_id))]
    pub async fn update_booking(
        state: &AppState,
        identity: &Identity,
        id: BookingId,
        dto: UpdateBookingDto,
    ) -> Result<Booking, AppError> {
        if dto.is_empty() {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "No fields to update"
            )));
        }

        let mut booking = Self::load(state, id).await?;
        let lifecycle = state.lifecycle();

        if !lifecycle.can_edit(identity, &booking) {
            return Err(AppError::forbidden(
                "You can only edit bookings assigned to you".to_string(),
            ));
        }

        dto.apply_to(&mut booking);

        // Own-booking editors cannot hand a booking to someone else.
        if !lifecycle.can_edit(identity, &booking) {
            return Err(AppError::forbidden(
                "Reassigning a booking requires canEditAllBookings".to_string(),
            ));
        }

        let updated = state
            .bookings
            .update_details(&booking)
            .await
            .map_err(|e| TransitionError::from(e).into_app_error())?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Booking not found")))?;

        tracing::info!(booking_id = %id, "Booking details updated");
        Ok(updated)
    }

    async fn load(state: &AppState, id: BookingId) -> Result<Booking, AppError> {
        state
            .bookings
            .get(id)
            .await
            .map_err(|e| TransitionError::from(e).into_app_error())?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Booking not found")))
    }
}
