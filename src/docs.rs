use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use rejuvenators_core::{PaginationMeta, PaginationParams, ResourceDescriptor, Role};
use rejuvenators_models::therapists::TherapistListResponse;
use rejuvenators_models::{
    Booking, BookingFilterParams, BookingListItem, BookingStatus, BulkDeleteDto, BulkFailure,
    BulkOutcome, BulkPaymentStatusDto, BulkStatusDto, CreateBookingDto, PaginatedBookingsResponse,
    PaymentStatus, PaymentStatusChangeDto, StatusChangeDto, TherapistProfile,
    TherapistProfileView, UpdateBookingDto, UpdateTherapistProfileDto,
};

use crate::modules::navigation::controller::NavigationResponse;
use crate::router::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health_check,
        crate::modules::navigation::controller::get_navigation,
        crate::modules::bookings::controller::get_bookings,
        crate::modules::bookings::controller::create_booking,
        crate::modules::bookings::controller::get_booking,
        crate::modules::bookings::controller::update_booking,
        crate::modules::bookings::controller::delete_booking,
        crate::modules::bookings::controller::change_status,
        crate::modules::bookings::controller::change_payment_status,
        crate::modules::bookings::controller::bulk_change_status,
        crate::modules::bookings::controller::bulk_change_payment_status,
        crate::modules::bookings::controller::bulk_delete_bookings,
        crate::modules::therapists::controller::get_therapists,
        crate::modules::therapists::controller::get_therapist,
        crate::modules::therapists::controller::get_my_profile,
        crate::modules::therapists::controller::update_my_profile,
        crate::modules::therapists::controller::upload_my_photo,
    ),
    components(
        schemas(
            HealthResponse,
            Role,
            ResourceDescriptor,
            NavigationResponse,
            Booking,
            BookingStatus,
            PaymentStatus,
            BookingListItem,
            BookingFilterParams,
            PaginatedBookingsResponse,
            CreateBookingDto,
            UpdateBookingDto,
            StatusChangeDto,
            PaymentStatusChangeDto,
            BulkStatusDto,
            BulkPaymentStatusDto,
            BulkDeleteDto,
            BulkFailure,
            BulkOutcome,
            TherapistProfile,
            TherapistProfileView,
            TherapistListResponse,
            UpdateTherapistProfileDto,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Navigation", description = "Console menu for the signed-in user"),
        (name = "Bookings", description = "Booking list, details and lifecycle"),
        (name = "Therapists", description = "Therapist directory"),
        (name = "My Profile", description = "The signed-in therapist's own profile")
    ),
    info(
        title = "Rejuvenators Admin API",
        version = "0.1.0",
        description = "Admin console API for the Rejuvenators massage booking service.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
