use std::collections::BTreeMap;

use campus_filters::{FilterState, Issue, PageFamily, SortSpec, User};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::orchestrator::PageOutcome;

/// Directory row as rendered by the page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub user_name: String,
    pub class_name: Option<String>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserRow {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            user_name: user.user_name,
            class_name: user.class_name,
            active: user.active,
            last_login: user.last_login,
        }
    }
}

/// Issue tracker row as rendered by the page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IssueRow {
    pub id: Uuid,
    pub student: String,
    pub class_name: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub reporter: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Issue> for IssueRow {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            student: issue.student_name(),
            class_name: issue.class_name,
            subject: issue.subject,
            description: issue.description,
            reporter: issue.reporter,
            status: if issue.closed { "closed" } else { "open" },
            created_at: issue.created_at,
            updated_at: issue.updated_at,
        }
    }
}

/// Current value of every control the page renders. Hidden controls are omitted.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FilterPanel(BTreeMap<&'static str, Value>);

impl FilterPanel {
    pub fn from_state(state: &FilterState) -> Self {
        let display = &state.display;
        let controls = [
            (display.show_closed, "show_closed", json!(state.show_closed)),
            (
                display.show_newer_than_last_login,
                "show_newer_than_last_login",
                json!(state.show_newer_than_last_login),
            ),
            (
                display.show_active_or_open,
                "show_active_or_open",
                json!(state.show_active_or_open),
            ),
            (
                display.description_search,
                "description_search",
                json!(state.description_search),
            ),
            (
                display.user_name_search,
                "user_name_search",
                json!(state.user_name_search),
            ),
            (display.subject_search, "subject_search", json!(state.subject_search)),
            (display.from_date, "from_date", json!(state.from_date())),
            (display.to_date, "to_date", json!(state.to_date())),
        ];

        Self(
            controls
                .into_iter()
                .filter(|(visible, _, _)| *visible)
                .map(|(_, name, value)| (name, value))
                .collect(),
        )
    }

    pub fn get(&self, control: &str) -> Option<&Value> {
        self.0.get(control)
    }

    pub fn controls(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

/// Response body of a listing page.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<R> {
    pub family: PageFamily,
    pub sort: SortSpec,
    pub total: usize,
    pub shown: usize,
    pub filter: FilterPanel,
    pub rows: Vec<R>,
}

impl<R> PageResponse<R> {
    pub fn from_outcome<E>(family: PageFamily, outcome: PageOutcome<E>) -> Self
    where
        R: From<E>,
    {
        Self {
            family,
            sort: outcome.sort,
            total: outcome.total,
            shown: outcome.items.len(),
            filter: FilterPanel::from_state(&outcome.state),
            rows: outcome.items.into_iter().map(R::from).collect(),
        }
    }
}
