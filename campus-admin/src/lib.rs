//! Directory and exam issue pages for the Campus admin.
//!
//! Wires the filter pipeline from `campus-filters` to HTTP: every listing
//! request resolves the session-held filter, narrows and orders the tenant's
//! records, stores the filter back and renders rows plus the visible controls.

pub mod config;
pub mod error;
pub mod forms;
pub mod orchestrator;
pub mod projection;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use campus_filters::InMemorySessionBackend;

pub use config::{AdminConfig, FilterDefaults};
pub use error::{AppError, AppResult};
pub use orchestrator::{PageOrchestrator, PageOutcome, PageRequest};
pub use repository::{InMemoryRepository, IssueSource, PgIssueSource, PgUserSource, UserSource};
pub use routes::{build_router, AppState};

/// State backed by in-memory records and sessions.
pub fn in_memory_state(config: AdminConfig, repository: InMemoryRepository) -> AppState {
    let repository = Arc::new(repository);
    AppState::new(
        repository.clone(),
        repository,
        Arc::new(InMemorySessionBackend::new()),
        config,
    )
}
