use chrono::{DateTime, Utc};
use tracing::debug;

use crate::criterion::Criterion;
use crate::entity::{Filterable, SearchField, StatusToggle};
use crate::state::FilterState;

/// Request-scoped facts the filter needs besides the state itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterContext {
    pub viewer_last_login: Option<DateTime<Utc>>,
}

/// Conjunction of criteria applied to a sequence of entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterApplicator {
    criteria: Vec<Criterion>,
}

impl FilterApplicator {
    /// Construct an applicator from explicit criteria.
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }

    /// Translates the enabled parts of a filter state into criteria.
    pub fn from_state(state: &FilterState, context: &FilterContext) -> Self {
        let mut criteria = Vec::new();

        let searches = [
            (SearchField::Description, &state.description_search),
            (SearchField::UserName, &state.user_name_search),
            (SearchField::Subject, &state.subject_search),
        ];
        criteria.extend(searches.into_iter().filter_map(|(field, text)| {
            text.as_deref()
                .and_then(|text| Criterion::contains_text(field, text))
        }));

        if state.show_active_or_open {
            criteria.push(Criterion::Status {
                toggle: StatusToggle::ActiveOrOpen,
            });
        }
        if state.show_closed {
            criteria.push(Criterion::Status {
                toggle: StatusToggle::Closed,
            });
        }

        if let Some(bound) = state.from_date() {
            criteria.push(Criterion::OnOrAfter { bound });
        }
        if let Some(bound) = state.to_date() {
            criteria.push(Criterion::OnOrBefore { bound });
        }
        if state.has_inverted_range() {
            debug!("filter range is inverted; result will be empty");
        }

        if state.show_newer_than_last_login {
            match context.viewer_last_login {
                Some(since) => criteria.push(Criterion::ChangedAfter { since }),
                None => debug!("viewer last login unknown; newer-than filter skipped"),
            }
        }

        debug!(criteria = criteria.len(), "built filter criteria");
        Self { criteria }
    }

    /// Borrow the underlying criteria.
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Whether no criterion is enabled.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Combines two applicators; an entity must satisfy both.
    pub fn and(mut self, other: FilterApplicator) -> Self {
        self.criteria.extend(other.criteria);
        self
    }

    pub fn matches<E: Filterable + ?Sized>(&self, entity: &E) -> bool {
        self.criteria
            .iter()
            .all(|criterion| criterion.matches(entity))
    }

    /// Lazily filtered view over `items`. Nothing is evaluated until iterated.
    pub fn apply<'a, E: Filterable>(&'a self, items: &'a [E]) -> FilteredView<'a, E> {
        FilteredView {
            items,
            applicator: self,
        }
    }
}

/// Re-iterable, lazily evaluated result of [`FilterApplicator::apply`].
#[derive(Debug)]
pub struct FilteredView<'a, E> {
    items: &'a [E],
    applicator: &'a FilterApplicator,
}

impl<E> Clone for FilteredView<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for FilteredView<'_, E> {}

impl<'a, E: Filterable> FilteredView<'a, E> {
    pub fn iter(&self) -> impl Iterator<Item = &'a E> + 'a {
        let applicator = self.applicator;
        self.items
            .iter()
            .filter(move |item| applicator.matches(*item))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn to_refs(&self) -> Vec<&'a E> {
        self.iter().collect()
    }

    pub fn to_vec(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.iter().cloned().collect()
    }
}
