//! Filtering, sorting and session-held filter state for the Campus admin pages.
//!
//! A page turns its [`FilterState`] into a [`FilterApplicator`], narrows the
//! fetched entities through it, orders the survivors with a [`SortSpec`] and
//! keeps the state between requests in a [`SessionFilterStore`]. Everything
//! here is synchronous and pure apart from the session backend.

mod criterion;
mod dates;
mod entity;
mod error;
mod filter;
mod session;
mod sort;
mod state;

pub use criterion::Criterion;
pub use dates::{parse_bound, Bound, LocalZone};
pub use entity::{Filterable, Issue, SearchField, Sortable, StatusToggle, User};
pub use error::SessionError;
pub use filter::{FilterApplicator, FilterContext, FilteredView};
pub use session::{
    InMemorySessionBackend, Navigation, PageFamily, SessionBackend, SessionFilterStore,
    DEFAULT_SESSION_IDLE_TTL,
};
pub use sort::{SortDirection, SortField, SortKey, SortSpec};
pub use state::{FilterState, FilterVisibility};
