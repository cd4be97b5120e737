use std::sync::Arc;

use tg_domain::config::Config;
use tg_records::RecordStore;

use crate::api::auth::IdentityVerifier;
use crate::pipeline::dispatch::SideEffectDispatcher;
use crate::pipeline::rate_limit::FixedWindowLimiter;
use crate::pipeline::TutorPipeline;

/// Shared application state passed to all API handlers.
///
/// Everything here is constructed once in [`crate::bootstrap`] and
/// injected; there are no process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<TutorPipeline>,
    /// Shared with the pipeline; also guards the non-generation routes.
    pub limiter: Arc<FixedWindowLimiter>,
    /// Handle for draining pending writes on shutdown.
    pub dispatcher: SideEffectDispatcher,
    pub store: Arc<dyn RecordStore>,
    pub identity: Arc<IdentityVerifier>,
}
