//! Shared application state handed to every handler.

use std::sync::Arc;

use sqlx::PgPool;

use cartage_engine::{
    DashboardProjector, DistanceResolver, FlatRateEstimator, IdentityProvider, LogNotifier,
    MissionLifecycleEngine, Notifier,
};
use cartage_store::{AcceptanceLedger, MissionStore, UserDirectory};

/// Application state. All fields are cheaply clonable handles; axum clones
/// the whole struct per request.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MissionLifecycleEngine>,
    pub projector: Arc<DashboardProjector>,
    pub missions: Arc<MissionStore>,
    pub acceptances: Arc<AcceptanceLedger>,
    pub users: Arc<UserDirectory>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Write-through persistence; `None` runs in-memory only.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Assemble state around fresh in-memory stores with the default
    /// collaborators. Used by main with production adapters swapped in via
    /// [`AppState::with_collaborators`], and by tests as-is.
    pub fn in_memory(identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_collaborators(
            identity,
            Arc::new(FlatRateEstimator::default()),
            Arc::new(LogNotifier),
        )
    }

    /// Assemble state with explicit distance and notification adapters.
    pub fn with_collaborators(
        identity: Arc<dyn IdentityProvider>,
        distance: Arc<dyn DistanceResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let missions = Arc::new(MissionStore::new());
        let acceptances = Arc::new(AcceptanceLedger::new());
        let users = Arc::new(UserDirectory::new());

        let engine = Arc::new(MissionLifecycleEngine::new(
            Arc::clone(&missions),
            Arc::clone(&acceptances),
            Arc::clone(&users),
            distance,
            notifier,
        ));
        let projector = Arc::new(DashboardProjector::new(
            Arc::clone(&missions),
            Arc::clone(&acceptances),
            Arc::clone(&users),
        ));

        Self {
            engine,
            projector,
            missions,
            acceptances,
            users,
            identity,
            db_pool: None,
        }
    }

    /// Attach a Postgres pool for write-through persistence.
    pub fn with_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }
}
