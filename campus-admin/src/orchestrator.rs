use campus_filters::{
    FilterApplicator, FilterContext, FilterState, Filterable, Navigation, PageFamily,
    SessionBackend, SessionError, SessionFilterStore, SortSpec, Sortable,
};
use tracing::{debug, warn};

use crate::config::FilterDefaults;

/// Everything a page render needs besides the entities themselves.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub session_id: &'a str,
    pub family: PageFamily,
    pub navigation: Navigation,
    pub sort: SortSpec,
    pub context: FilterContext,
    /// Criteria from an explicit "apply filter" submission.
    pub submission: Option<FilterState>,
}

/// Filtered, ordered entities plus the state that produced them.
#[derive(Debug, Clone)]
pub struct PageOutcome<E> {
    pub state: FilterState,
    pub sort: SortSpec,
    pub items: Vec<E>,
    pub total: usize,
}

/// Glue between the session store, the filter and the sort for one page family.
#[derive(Clone)]
pub struct PageOrchestrator<B> {
    filters: SessionFilterStore<B>,
    defaults: FilterDefaults,
}

impl<B: SessionBackend> PageOrchestrator<B> {
    pub fn new(backend: B, defaults: FilterDefaults) -> Self {
        Self {
            filters: SessionFilterStore::new(backend),
            defaults,
        }
    }

    pub fn defaults(&self) -> &FilterDefaults {
        &self.defaults
    }

    /// Resolves the filter state, narrows and orders `entities`, then persists
    /// the state. A failed save is logged and the page still renders.
    pub fn run<E>(&self, request: PageRequest<'_>, entities: Vec<E>) -> PageOutcome<E>
    where
        E: Filterable + Sortable,
    {
        let defaults = self.defaults.for_family(request.family);
        let mut state = self.filters.resolve(
            request.session_id,
            request.family,
            &request.navigation,
            defaults,
        );
        if let Some(submitted) = request.submission {
            state.replace_criteria(submitted);
        }

        let total = entities.len();
        let applicator = FilterApplicator::from_state(&state, &request.context);
        let matched: Vec<E> = entities
            .into_iter()
            .filter(|entity| applicator.matches(entity))
            .collect();
        let items = request.sort.apply(matched);
        debug!(
            family = ?request.family,
            criteria = applicator.criteria().len(),
            total,
            shown = items.len(),
            "page rendered"
        );

        if let Err(err) = self.filters.save(request.session_id, request.family, &state) {
            warn!(?err, family = ?request.family, "failed to persist filter state");
        }

        PageOutcome {
            state,
            sort: request.sort,
            items,
            total,
        }
    }

    /// Drops the stored filter for `family` and returns its defaults.
    pub fn reset(&self, session_id: &str, family: PageFamily) -> Result<FilterState, SessionError> {
        self.filters.clear(session_id, family)?;
        Ok(self.defaults.for_family(family).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_filters::{InMemorySessionBackend, SortDirection, SortKey, User};
    use chrono::Utc;
    use mockall::mock;
    use uuid::Uuid;

    mock! {
        pub Backend {}

        impl SessionBackend for Backend {
            fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, SessionError>;
            fn set(&self, session_id: &str, key: &str, value: String) -> Result<(), SessionError>;
            fn remove(&self, session_id: &str, key: &str) -> Result<(), SessionError>;
        }
    }

    fn user(first: &str, last: &str, active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id: "school".into(),
            first_name: first.into(),
            last_name: last.into(),
            user_name: first.to_lowercase(),
            class_name: Some("10A".into()),
            active,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    fn request(referer: Option<&str>, submission: Option<FilterState>) -> PageRequest<'static> {
        PageRequest {
            session_id: "session-1",
            family: PageFamily::Directory,
            navigation: Navigation::new(
                "/tenants/school/directory",
                referer.map(str::to_string),
            ),
            sort: SortSpec::new(SortKey::FirstName, SortDirection::Ascending),
            context: FilterContext::default(),
            submission,
        }
    }

    #[test]
    fn submission_is_persisted_for_same_page() {
        let orchestrator =
            PageOrchestrator::new(InMemorySessionBackend::new(), FilterDefaults::default());
        let users = vec![user("Dana", "Levi", true), user("Avi", "Cohen", false)];

        let mut submitted = FilterState::new();
        submitted.show_active_or_open = true;
        let first = orchestrator.run(
            request(Some("/tenants/school/directory"), Some(submitted)),
            users.clone(),
        );
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.total, 2);

        let second = orchestrator.run(request(Some("/tenants/school/directory"), None), users);
        assert!(second.state.show_active_or_open);
        assert_eq!(second.items[0].first_name, "Dana");
    }

    #[test]
    fn context_switch_restores_defaults() {
        let orchestrator =
            PageOrchestrator::new(InMemorySessionBackend::new(), FilterDefaults::default());
        let users = vec![user("Dana", "Levi", true), user("Avi", "Cohen", false)];

        let mut submitted = FilterState::new();
        submitted.show_active_or_open = true;
        orchestrator.run(
            request(Some("/tenants/school/directory"), Some(submitted)),
            users.clone(),
        );

        let outcome = orchestrator.run(request(Some("/tenants/school/issues"), None), users);
        assert_eq!(&outcome.state, orchestrator.defaults().for_family(PageFamily::Directory));
        let names: Vec<_> = outcome.items.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(names, vec!["Avi", "Dana"]);
    }

    #[test]
    fn backend_failures_still_render() {
        let mut backend = MockBackend::new();
        backend
            .expect_get()
            .times(1)
            .returning(|_, _| Err(SessionError::Backend("unavailable".into())));
        backend
            .expect_set()
            .times(1)
            .returning(|_, _, _| Err(SessionError::Backend("unavailable".into())));

        let orchestrator = PageOrchestrator::new(backend, FilterDefaults::default());
        let outcome = orchestrator.run(
            request(Some("/tenants/school/directory"), None),
            vec![user("Noa", "Peretz", true)],
        );
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(&outcome.state, orchestrator.defaults().for_family(PageFamily::Directory));
    }

    #[test]
    fn missing_referer_clears_stored_state() {
        let mut backend = MockBackend::new();
        backend.expect_remove().times(1).returning(|_, _| Ok(()));
        backend.expect_get().never();
        backend.expect_set().times(1).returning(|_, _, _| Ok(()));

        let orchestrator = PageOrchestrator::new(backend, FilterDefaults::default());
        let outcome = orchestrator.run(request(None, None), vec![user("Noa", "Peretz", true)]);
        assert_eq!(outcome.items.len(), 1);
    }

    #[test]
    fn reset_returns_family_defaults() {
        let mut backend = MockBackend::new();
        backend.expect_remove().times(1).returning(|_, _| Ok(()));

        let orchestrator = PageOrchestrator::new(backend, FilterDefaults::default());
        let state = orchestrator
            .reset("session-1", PageFamily::Issues)
            .expect("reset");
        assert!(state.display.subject_search);
    }
}
