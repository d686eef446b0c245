use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sort::{SortField, SortKey};

/// Free-text fields a filter can search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Description,
    UserName,
    Subject,
}

/// Status toggles. Each entity kind answers for the toggle it honours and
/// returns `None` for the other one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusToggle {
    ActiveOrOpen,
    Closed,
}

/// Read-only view an entity exposes to the filter pipeline.
pub trait Filterable {
    /// Candidate texts for a search field. `None` when the entity kind has no
    /// such field; an empty list when the field exists but holds no value.
    fn search_candidates(&self, field: SearchField) -> Option<Vec<Cow<'_, str>>>;

    /// Whether the entity satisfies the toggle, or `None` when the toggle does
    /// not apply to this entity kind.
    fn status(&self, toggle: StatusToggle) -> Option<bool>;

    /// Timestamp checked against the from/to range.
    fn range_timestamp(&self) -> Option<DateTime<Utc>>;

    /// Timestamp compared with the viewer's last login.
    fn changed_at(&self) -> Option<DateTime<Utc>>;
}

/// Read-only view an entity exposes to the sort pipeline.
pub trait Sortable {
    fn sort_field(&self, key: SortKey) -> SortField<'_>;

    /// Terminal tie-break key.
    fn record_id(&self) -> Uuid;
}

impl<T: Filterable + ?Sized> Filterable for &T {
    fn search_candidates(&self, field: SearchField) -> Option<Vec<Cow<'_, str>>> {
        (**self).search_candidates(field)
    }

    fn status(&self, toggle: StatusToggle) -> Option<bool> {
        (**self).status(toggle)
    }

    fn range_timestamp(&self) -> Option<DateTime<Utc>> {
        (**self).range_timestamp()
    }

    fn changed_at(&self) -> Option<DateTime<Utc>> {
        (**self).changed_at()
    }
}

impl<T: Sortable + ?Sized> Sortable for &T {
    fn sort_field(&self, key: SortKey) -> SortField<'_> {
        (**self).sort_field(key)
    }

    fn record_id(&self) -> Uuid {
        (**self).record_id()
    }
}

/// Directory member (student, alumnus or staff account).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub class_name: Option<String>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

impl Filterable for User {
    fn search_candidates(&self, field: SearchField) -> Option<Vec<Cow<'_, str>>> {
        match field {
            SearchField::UserName => Some(vec![
                Cow::Borrowed(self.user_name.as_str()),
                Cow::Owned(self.full_name()),
            ]),
            SearchField::Description | SearchField::Subject => None,
        }
    }

    fn status(&self, toggle: StatusToggle) -> Option<bool> {
        match toggle {
            StatusToggle::ActiveOrOpen => Some(self.active),
            StatusToggle::Closed => None,
        }
    }

    fn range_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    fn changed_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl Sortable for User {
    fn sort_field(&self, key: SortKey) -> SortField<'_> {
        match key {
            SortKey::FirstName => SortField::Text(Some(&self.first_name)),
            SortKey::LastName => SortField::Text(Some(&self.last_name)),
            SortKey::Class => SortField::Text(self.class_name.as_deref()),
            SortKey::LastLogin => SortField::Time(self.last_login),
            SortKey::CreatedAt => SortField::Time(Some(self.created_at)),
            SortKey::Status => SortField::Flag(self.active),
            SortKey::Subject | SortKey::None => SortField::Absent,
        }
    }

    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// Exam issue raised for a student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: Uuid,
    pub tenant_id: String,
    pub student_first_name: String,
    pub student_last_name: String,
    pub class_name: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub reporter: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    pub fn student_name(&self) -> String {
        join_name(&self.student_first_name, &self.student_last_name)
    }
}

impl Filterable for Issue {
    fn search_candidates(&self, field: SearchField) -> Option<Vec<Cow<'_, str>>> {
        let candidates = match field {
            SearchField::Description => self
                .description
                .as_deref()
                .map(Cow::Borrowed)
                .into_iter()
                .collect(),
            SearchField::Subject => vec![Cow::Borrowed(self.subject.as_str())],
            SearchField::UserName => vec![
                Cow::Borrowed(self.reporter.as_str()),
                Cow::Owned(self.student_name()),
            ],
        };
        Some(candidates)
    }

    fn status(&self, toggle: StatusToggle) -> Option<bool> {
        match toggle {
            StatusToggle::Closed => Some(self.closed),
            StatusToggle::ActiveOrOpen => None,
        }
    }

    fn range_timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn changed_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }
}

impl Sortable for Issue {
    fn sort_field(&self, key: SortKey) -> SortField<'_> {
        match key {
            SortKey::FirstName => SortField::Text(Some(&self.student_first_name)),
            SortKey::LastName => SortField::Text(Some(&self.student_last_name)),
            SortKey::Class => SortField::Text(self.class_name.as_deref()),
            SortKey::Subject => SortField::Text(Some(&self.subject)),
            SortKey::CreatedAt => SortField::Time(Some(self.created_at)),
            SortKey::Status => SortField::Flag(self.closed),
            SortKey::LastLogin | SortKey::None => SortField::Absent,
        }
    }

    fn record_id(&self) -> Uuid {
        self.id
    }
}

fn join_name(first: &str, last: &str) -> String {
    match (first.trim(), last.trim()) {
        ("", last) => last.to_string(),
        (first, "") => first.to_string(),
        (first, last) => format!("{first} {last}"),
    }
}
