//! Campus: filtered, sorted and session-aware listing pages for the school admin.
//!
//! The workspace is split into three crates:
//!
//! * `campus-core`: errors, configuration, logging, database pool and validation
//! * `campus-filters`: filter state, filter and sort pipelines, session persistence
//! * `campus-admin`: the HTTP pages for the alumni directory and the exam issue tracker
//!
//! This facade re-exports the pieces most callers need.

pub use campus_admin::{
    build_router, in_memory_state, AdminConfig, AppState, FilterDefaults, InMemoryRepository,
};
pub use campus_core::{CampusError, CoreResult, ValidationReport, Validator};
pub use campus_filters::{
    FilterApplicator, FilterContext, FilterState, FilterVisibility, Issue, Navigation,
    PageFamily, SessionFilterStore, SortDirection, SortKey, SortSpec, User,
};
