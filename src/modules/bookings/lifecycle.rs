//! Booking lifecycle engine.
//!
//! Every status or payment change goes through [`BookingLifecycle`]. For a
//! status change the checks run in a fixed order: the booking must exist,
//! the caller must be allowed to edit it, the target must differ from the
//! current status, leaving a terminal status needs
//! `canOverrideTerminalStatus`, and finally the [`TransitionPolicy`] must
//! allow the move. The write itself is conditional on the status read in
//! step one, so a concurrent change surfaces as [`TransitionError::Conflict`].
//!
//! Bulk operations apply each id on its own and report per-item outcomes.
//! Nothing that succeeded is rolled back.

use std::sync::Arc;

use chrono::Utc;

use rejuvenators_config::BookingPolicyConfig;
use rejuvenators_core::{AppError, Capability, PermissionMatrix};
use rejuvenators_models::bookings::dedupe_ids;
use rejuvenators_models::{
    Booking, BookingId, BookingStatus, BulkOutcome, CreateBookingDto, Identity, PaymentStatus,
};
use rejuvenators_observability::{
    track_booking_created, track_booking_deleted, track_booking_transition, track_bulk_operation,
};

use super::store::BookingStore;
use crate::store::StoreError;

/// Which status moves are allowed between non-terminal statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any non-terminal status may move to any other status.
    #[default]
    Permissive,
    /// Only the moves listed in [`TransitionPolicy::strict_targets`].
    Strict,
}

impl TransitionPolicy {
    pub fn from_config(config: &BookingPolicyConfig) -> Self {
        if config.strict_transitions {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }

    /// Adjacency table used by the strict policy.
    pub fn strict_targets(from: BookingStatus) -> &'static [BookingStatus] {
        use BookingStatus::*;

        match from {
            Requested => &[
                Confirmed,
                Declined,
                Cancelled,
                TimeoutReassigned,
                SeekingAlternate,
            ],
            Confirmed => &[Completed, Cancelled],
            TimeoutReassigned => &[Confirmed, Declined, Cancelled, SeekingAlternate],
            SeekingAlternate => &[Confirmed, Cancelled, Declined],
            Completed | Cancelled | Declined => &[],
        }
    }

    pub fn allows(&self, from: BookingStatus, to: BookingStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => Self::strict_targets(from).contains(&to),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("Booking {0} not found")]
    NotFound(BookingId),

    #[error("Not allowed to change booking {id}: {reason}")]
    Forbidden { id: BookingId, reason: String },

    #[error("Booking {id} is already {status}")]
    AlreadyInStatus { id: BookingId, status: String },

    #[error("Booking {id} is {status}; changing it requires canOverrideTerminalStatus")]
    TerminalStatus { id: BookingId, status: BookingStatus },

    #[error("Booking {id} cannot move from {from} to {to}")]
    NotAllowed {
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Booking {0} was changed by someone else; reload and try again")]
    Conflict(BookingId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransitionError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionError::NotFound(_) => "not_found",
            TransitionError::Forbidden { .. } => "forbidden",
            TransitionError::AlreadyInStatus { .. } => "already_in_status",
            TransitionError::TerminalStatus { .. } => "terminal",
            TransitionError::NotAllowed { .. } => "not_allowed",
            TransitionError::Conflict(_) => "conflict",
            TransitionError::Store(_) => "store_error",
        }
    }

    /// Maps the error onto an HTTP status at the controller boundary.
    pub fn into_app_error(self) -> AppError {
        match self {
            TransitionError::NotFound(_) => AppError::not_found(self),
            TransitionError::Forbidden { .. } | TransitionError::TerminalStatus { .. } => {
                AppError::forbidden(self.to_string())
            }
            TransitionError::AlreadyInStatus { .. } | TransitionError::NotAllowed { .. } => {
                AppError::unprocessable(self)
            }
            TransitionError::Conflict(_) => AppError::conflict(self),
            TransitionError::Store(err) => {
                tracing::error!(error = %err, "Booking store failure");
                AppError::database(err)
            }
        }
    }
}

#[derive(Clone)]
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
    matrix: Arc<PermissionMatrix>,
    policy: TransitionPolicy,
}

impl BookingLifecycle {
    pub fn new(
        store: Arc<dyn BookingStore>,
        matrix: Arc<PermissionMatrix>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            store,
            matrix,
            policy,
        }
    }

    fn can(&self, identity: &Identity, capability: Capability) -> bool {
        self.matrix.can_access(identity.role, capability)
    }

    /// Edit-all, or edit-own on a booking assigned to the caller.
    pub fn can_edit(&self, identity: &Identity, booking: &Booking) -> bool {
        self.can(identity, Capability::EditAllBookings)
            || (self.can(identity, Capability::EditOwnBookings)
                && identity.owns(booking.therapist_id))
    }

    /// View-all, or view-own on a booking assigned to the caller.
    pub fn can_view(&self, identity: &Identity, booking: &Booking) -> bool {
        self.can(identity, Capability::ViewAllBookings)
            || (self.can(identity, Capability::ViewOwnBookings)
                && identity.owns(booking.therapist_id))
    }

    /// Checks two to five of a status change, against an already loaded
    /// booking. Touches nothing.
    pub fn check_status_change(
        &self,
        identity: &Identity,
        booking: &Booking,
        target: BookingStatus,
    ) -> Result<(), TransitionError> {
        if !self.can_edit(identity, booking) {
            return Err(TransitionError::Forbidden {
                id: booking.id,
                reason: "requires canEditAllBookings, or canEditOwnBookings on an assigned booking"
                    .to_string(),
            });
        }

        if booking.status == target {
            return Err(TransitionError::AlreadyInStatus {
                id: booking.id,
                status: target.to_string(),
            });
        }

        let overriding = booking.status.is_terminal();
        if overriding && !self.can(identity, Capability::OverrideTerminalStatus) {
            return Err(TransitionError::TerminalStatus {
                id: booking.id,
                status: booking.status,
            });
        }

        if !overriding && !self.policy.allows(booking.status, target) {
            return Err(TransitionError::NotAllowed {
                id: booking.id,
                from: booking.status,
                to: target,
            });
        }

        Ok(())
    }

    async fn load(&self, id: BookingId) -> Result<Booking, TransitionError> {
        self.store
            .get(id)
            .await?
            .ok_or(TransitionError::NotFound(id))
    }

    pub async fn create(
        &self,
        identity: &Identity,
        dto: CreateBookingDto,
    ) -> Result<Booking, TransitionError> {
        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            customer_id: dto.customer_id,
            therapist_id: dto.therapist_id,
            service_id: dto.service_id,
            booking_time: dto.booking_time,
            status: BookingStatus::Requested,
            payment_status: PaymentStatus::Pending,
            price_cents: dto.price_cents,
            therapist_fee_cents: dto.therapist_fee_cents,
            address: dto.address,
            notes: dto.notes,
            created_at: now,
            updated_at: now,
        };

        if !self.can(identity, Capability::CreateBookings) {
            return Err(TransitionError::Forbidden {
                id: booking.id,
                reason: "requires canCreateBookings".to_string(),
            });
        }

        let created = self.store.insert(&booking).await?;
        track_booking_created();
        tracing::info!(booking_id = %created.id, user_id = %identity.user_id, "Booking created");
        Ok(created)
    }

    pub async fn transition_status(
        &self,
        identity: &Identity,
        id: BookingId,
        target: BookingStatus,
    ) -> Result<Booking, TransitionError> {
        let result = self.apply_status(identity, id, target).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.kind(),
        };
        track_booking_transition("status", target.as_str(), outcome);
        result
    }

    async fn apply_status(
        &self,
        identity: &Identity,
        id: BookingId,
        target: BookingStatus,
    ) -> Result<Booking, TransitionError> {
        let booking = self.load(id).await?;
        self.check_status_change(identity, &booking, target)?;

        match self
            .store
            .update_status_if(id, booking.status, target)
            .await?
        {
            Some(updated) => {
                tracing::info!(
                    booking_id = %id,
                    user_id = %identity.user_id,
                    from = %booking.status,
                    to = %target,
                    "Booking status changed"
                );
                Ok(updated)
            }
            None => match self.store.get(id).await? {
                Some(_) => Err(TransitionError::Conflict(id)),
                None => Err(TransitionError::NotFound(id)),
            },
        }
    }

    pub async fn bulk_transition_status(
        &self,
        identity: &Identity,
        ids: &[BookingId],
        target: BookingStatus,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in dedupe_ids(ids) {
            match self.transition_status(identity, id, target).await {
                Ok(_) => outcome.succeeded(id),
                Err(err) => outcome.failed(id, err.to_string()),
            }
        }
        self.finish_bulk("status", &outcome);
        outcome
    }

    /// Payment changes never touch `status`. Concurrent payment writes are
    /// last-write-wins.
    pub async fn transition_payment(
        &self,
        identity: &Identity,
        id: BookingId,
        target: PaymentStatus,
    ) -> Result<Booking, TransitionError> {
        let result = self.apply_payment(identity, id, target).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.kind(),
        };
        track_booking_transition("payment", target.as_str(), outcome);
        result
    }

    async fn apply_payment(
        &self,
        identity: &Identity,
        id: BookingId,
        target: PaymentStatus,
    ) -> Result<Booking, TransitionError> {
        let booking = self.load(id).await?;

        if !self.can(identity, Capability::ManagePayments) || !self.can_view(identity, &booking) {
            return Err(TransitionError::Forbidden {
                id,
                reason: "requires canManagePayments on a visible booking".to_string(),
            });
        }

        if booking.payment_status == target {
            return Err(TransitionError::AlreadyInStatus {
                id,
                status: target.to_string(),
            });
        }

        let updated = self
            .store
            .update_payment_status(id, target)
            .await?
            .ok_or(TransitionError::NotFound(id))?;

        tracing::info!(
            booking_id = %id,
            user_id = %identity.user_id,
            from = %booking.payment_status,
            to = %target,
            "Booking payment status changed"
        );
        Ok(updated)
    }

    pub async fn bulk_transition_payment(
        &self,
        identity: &Identity,
        ids: &[BookingId],
        target: PaymentStatus,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in dedupe_ids(ids) {
            match self.transition_payment(identity, id, target).await {
                Ok(_) => outcome.succeeded(id),
                Err(err) => outcome.failed(id, err.to_string()),
            }
        }
        self.finish_bulk("payment_status", &outcome);
        outcome
    }

    /// Irreversible. Reports success only once the store confirms the row
    /// is gone.
    pub async fn delete(&self, identity: &Identity, id: BookingId) -> Result<(), TransitionError> {
        let result = self.apply_delete(identity, id).await;
        track_booking_deleted(match &result {
            Ok(()) => "success",
            Err(err) => err.kind(),
        });
        result
    }

    async fn apply_delete(&self, identity: &Identity, id: BookingId) -> Result<(), TransitionError> {
        if !self.can(identity, Capability::DeleteBookings) {
            return Err(TransitionError::Forbidden {
                id,
                reason: "requires canDeleteBookings".to_string(),
            });
        }

        if !self.store.delete(id).await? {
            return Err(TransitionError::NotFound(id));
        }

        tracing::info!(booking_id = %id, user_id = %identity.user_id, "Booking deleted");
        Ok(())
    }

    pub async fn bulk_delete(&self, identity: &Identity, ids: &[BookingId]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in dedupe_ids(ids) {
            match self.delete(identity, id).await {
                Ok(()) => outcome.succeeded(id),
                Err(err) => outcome.failed(id, err.to_string()),
            }
        }
        self.finish_bulk("delete", &outcome);
        outcome
    }

    fn finish_bulk(&self, operation: &str, outcome: &BulkOutcome) {
        track_bulk_operation(operation, outcome.success_count, outcome.failed_count);
        if outcome.failed_count > 0 {
            tracing::warn!(
                operation = %operation,
                succeeded = outcome.success_count,
                failed = outcome.failed_count,
                "Bulk booking operation partially failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::bookings::store::InMemoryBookingStore;
    use rejuvenators_core::Role;
    use rejuvenators_models::{CustomerId, ServiceId, TherapistId, UserId};

    fn identity(role: Role, therapist_id: Option<TherapistId>) -> Identity {
        Identity {
            user_id: UserId::new(),
            email: format!("{}@test.com", role),
            role: Some(role),
            therapist_id,
        }
    }

    fn booking(therapist_id: TherapistId, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId::new(),
            customer_id: CustomerId::new(),
            therapist_id,
            service_id: ServiceId::new(),
            booking_time: now,
            status,
            payment_status: PaymentStatus::Pending,
            price_cents: 10_000,
            therapist_fee_cents: 7_000,
            address: "1 Beach Rd".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn engine(policy: TransitionPolicy) -> (BookingLifecycle, Arc<InMemoryBookingStore>) {
        let store = Arc::new(InMemoryBookingStore::new());
        let lifecycle = BookingLifecycle::new(
            store.clone(),
            Arc::new(PermissionMatrix::standard().clone()),
            policy,
        );
        (lifecycle, store)
    }

    #[test]
    fn test_strict_table_has_no_exits_from_terminal() {
        for status in BookingStatus::ALL {
            let targets = TransitionPolicy::strict_targets(status);
            assert_eq!(targets.is_empty(), status.is_terminal(), "{status}");
            assert!(!targets.contains(&status));
        }
    }

    #[test]
    fn test_policy_allows() {
        use BookingStatus::*;
        assert!(TransitionPolicy::Strict.allows(Requested, Confirmed));
        assert!(!TransitionPolicy::Strict.allows(Requested, Completed));
        assert!(TransitionPolicy::Permissive.allows(Requested, Completed));
    }

    #[test]
    fn test_check_order() {
        let (lifecycle, _) = engine(TransitionPolicy::Strict);
        let mine = TherapistId::new();
        let therapist = identity(Role::Therapist, Some(mine));

        let foreign = booking(TherapistId::new(), BookingStatus::Requested);
        assert!(matches!(
            lifecycle.check_status_change(&therapist, &foreign, BookingStatus::Requested),
            Err(TransitionError::Forbidden { .. })
        ));

        let own = booking(mine, BookingStatus::Requested);
        assert!(matches!(
            lifecycle.check_status_change(&therapist, &own, BookingStatus::Requested),
            Err(TransitionError::AlreadyInStatus { .. })
        ));
        assert!(matches!(
            lifecycle.check_status_change(&therapist, &own, BookingStatus::Completed),
            Err(TransitionError::NotAllowed { .. })
        ));
        assert!(
            lifecycle
                .check_status_change(&therapist, &own, BookingStatus::Confirmed)
                .is_ok()
        );

        let done = booking(mine, BookingStatus::Completed);
        assert!(matches!(
            lifecycle.check_status_change(&therapist, &done, BookingStatus::Confirmed),
            Err(TransitionError::TerminalStatus { .. })
        ));
    }

    #[test]
    fn test_override_bypasses_adjacency() {
        let (lifecycle, _) = engine(TransitionPolicy::Strict);
        let super_admin = identity(Role::SuperAdmin, None);
        let admin = identity(Role::Admin, None);
        let cancelled = booking(TherapistId::new(), BookingStatus::Cancelled);

        assert!(
            lifecycle
                .check_status_change(&super_admin, &cancelled, BookingStatus::Requested)
                .is_ok()
        );
        assert!(matches!(
            lifecycle.check_status_change(&admin, &cancelled, BookingStatus::Requested),
            Err(TransitionError::TerminalStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_therapist_confirms_own_booking_only() {
        let (lifecycle, store) = engine(TransitionPolicy::Permissive);
        let mine = TherapistId::new();
        let therapist = identity(Role::Therapist, Some(mine));

        let own = store
            .insert(&booking(mine, BookingStatus::Requested))
            .await
            .unwrap();
        let other = store
            .insert(&booking(TherapistId::new(), BookingStatus::Requested))
            .await
            .unwrap();

        let updated = lifecycle
            .transition_status(&therapist, own.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);

        let err = lifecycle
            .transition_status(&therapist, other.id, BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));
        assert_eq!(
            store.get(other.id).await.unwrap().unwrap().status,
            BookingStatus::Requested
        );
    }

    #[tokio::test]
    async fn test_missing_booking_is_not_found() {
        let (lifecycle, _) = engine(TransitionPolicy::Permissive);
        let err = lifecycle
            .transition_status(
                &identity(Role::Admin, None),
                BookingId::new(),
                BookingStatus::Confirmed,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotFound(_)));
        assert_eq!(err.into_app_error().status.as_u16(), 404);
    }

    #[tokio::test]
    async fn test_payment_change_leaves_status_alone() {
        let (lifecycle, store) = engine(TransitionPolicy::Permissive);
        let admin = identity(Role::Admin, None);
        let b = store
            .insert(&booking(TherapistId::new(), BookingStatus::Confirmed))
            .await
            .unwrap();

        let paid = lifecycle
            .transition_payment(&admin, b.id, PaymentStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.status, BookingStatus::Confirmed);

        let again = lifecycle
            .transition_payment(&admin, b.id, PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(again, TransitionError::AlreadyInStatus { .. }));

        // Therapists do not manage payments, even on their own bookings.
        let therapist = identity(Role::Therapist, Some(b.therapist_id));
        let err = lifecycle
            .transition_payment(&therapist, b.id, PaymentStatus::Refunded)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_bulk_status_dedupes_and_reports_per_item() {
        let (lifecycle, store) = engine(TransitionPolicy::Permissive);
        let admin = identity(Role::Admin, None);
        let a = store
            .insert(&booking(TherapistId::new(), BookingStatus::Requested))
            .await
            .unwrap();
        let done = store
            .insert(&booking(TherapistId::new(), BookingStatus::Completed))
            .await
            .unwrap();
        let missing = BookingId::new();

        let outcome = lifecycle
            .bulk_transition_status(&admin, &[a.id, done.id, a.id, missing], BookingStatus::Cancelled)
            .await;

        assert_eq!(outcome.success, vec![a.id]);
        assert_eq!(outcome.failed_ids(), vec![done.id, missing]);
        assert_eq!(outcome.success_count + outcome.failed_count, 3);
    }

    #[tokio::test]
    async fn test_create_starts_requested_and_pending() {
        let (lifecycle, _) = engine(TransitionPolicy::Permissive);
        let dto = CreateBookingDto {
            customer_id: CustomerId::new(),
            therapist_id: TherapistId::new(),
            service_id: ServiceId::new(),
            booking_time: Utc::now(),
            price_cents: 9_000,
            therapist_fee_cents: 6_000,
            address: "3 Bay St".to_string(),
            notes: None,
        };

        let created = lifecycle
            .create(&identity(Role::Admin, None), dto.clone())
            .await
            .unwrap();
        assert_eq!(created.status, BookingStatus::Requested);
        assert_eq!(created.payment_status, PaymentStatus::Pending);

        let err = lifecycle
            .create(&identity(Role::Therapist, Some(TherapistId::new())), dto)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_delete_needs_its_own_capability() {
        let (lifecycle, store) = engine(TransitionPolicy::Permissive);
        let mine = TherapistId::new();
        let b = store
            .insert(&booking(mine, BookingStatus::Requested))
            .await
            .unwrap();

        let err = lifecycle
            .delete(&identity(Role::Therapist, Some(mine)), b.id)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));

        lifecycle
            .delete(&identity(Role::Admin, None), b.id)
            .await
            .unwrap();
        let err = lifecycle
            .delete(&identity(Role::Admin, None), b.id)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotFound(_)));
    }
}
