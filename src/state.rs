use std::sync::Arc;

use rejuvenators_config::{
    BookingPolicyConfig, CorsConfig, JwtConfig, StorageConfig, StoreBackend,
};
use rejuvenators_core::PermissionMatrix;
use rejuvenators_core::file_storage::{FileStorage, LocalFileStorage};
use rejuvenators_db::{init_db_pool, run_migrations};

use crate::authz::IdentityResolver;
use crate::modules::bookings::lifecycle::{BookingLifecycle, TransitionPolicy};
use crate::modules::bookings::store::{BookingStore, InMemoryBookingStore, PgBookingStore};
use crate::modules::therapists::store::{
    InMemoryTherapistStore, PgTherapistStore, TherapistStore,
};

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingStore>,
    pub therapists: Arc<dyn TherapistStore>,
    pub files: Arc<dyn FileStorage>,
    pub matrix: Arc<PermissionMatrix>,
    pub identity: IdentityResolver,
    pub policy: TransitionPolicy,
    pub cors_config: CorsConfig,
    pub storage_config: StorageConfig,
}

impl AppState {
    /// State over the given stores with the standard permission matrix and
    /// the permissive transition policy.
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        therapists: Arc<dyn TherapistStore>,
        identity: IdentityResolver,
        storage_config: StorageConfig,
    ) -> Self {
        let files = LocalFileStorage::with_max_size(
            storage_config.upload_dir.clone(),
            storage_config.public_files_url.clone(),
            storage_config.max_upload_bytes,
        );

        Self {
            bookings,
            therapists,
            files: Arc::new(files),
            matrix: Arc::new(PermissionMatrix::standard().clone()),
            identity,
            policy: TransitionPolicy::default(),
            cors_config: CorsConfig::from_env(),
            storage_config,
        }
    }

    pub fn lifecycle(&self) -> BookingLifecycle {
        BookingLifecycle::new(self.bookings.clone(), self.matrix.clone(), self.policy)
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let storage_config = StorageConfig::from_env();
    let identity = IdentityResolver::ready(JwtConfig::from_env());

    let (bookings, therapists): (Arc<dyn BookingStore>, Arc<dyn TherapistStore>) =
        match storage_config.backend {
            StoreBackend::Postgres => {
                let db = init_db_pool().await?;
                run_migrations(&db).await?;
                (
                    Arc::new(PgBookingStore::new(db.clone())),
                    Arc::new(PgTherapistStore::new(db)),
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data is lost on restart");
                (
                    Arc::new(InMemoryBookingStore::new()),
                    Arc::new(InMemoryTherapistStore::new()),
                )
            }
        };

    let mut state = AppState::new(bookings, therapists, identity, storage_config);
    state.policy = TransitionPolicy::from_config(&BookingPolicyConfig::from_env());

    tracing::info!(
        backend = %state.storage_config.backend,
        policy = ?state.policy,
        "Application state ready"
    );
    Ok(state)
}
