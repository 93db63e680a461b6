/// Booking lifecycle settings.
///
/// `BOOKING_STRICT_TRANSITIONS=true` restricts status changes to the
/// adjacency table instead of allowing any non-terminal move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookingPolicyConfig {
    pub strict_transitions: bool,
}

impl BookingPolicyConfig {
    pub fn from_env() -> Self {
        Self {
            strict_transitions: crate::env_or("BOOKING_STRICT_TRANSITIONS", false),
        }
    }
}
