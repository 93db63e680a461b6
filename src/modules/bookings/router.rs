use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    bulk_change_payment_status, bulk_change_status, bulk_delete_bookings, change_payment_status,
    change_status, create_booking, delete_booking, get_booking, get_bookings, update_booking,
};

pub fn init_bookings_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_bookings).post(create_booking))
        .route(
            "/{id}",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/{id}/status", patch(change_status))
        .route("/{id}/payment-status", patch(change_payment_status))
        .route("/bulk/status", post(bulk_change_status))
        .route("/bulk/payment-status", post(bulk_change_payment_status))
        .route("/bulk/delete", post(bulk_delete_bookings))
}
