use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::LocalZone;

/// Which filter controls a page renders. Never consulted by the predicates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterVisibility {
    pub show_closed: bool,
    pub show_newer_than_last_login: bool,
    pub show_active_or_open: bool,
    pub description_search: bool,
    pub user_name_search: bool,
    pub subject_search: bool,
    pub from_date: bool,
    pub to_date: bool,
}

impl Default for FilterVisibility {
    fn default() -> Self {
        Self {
            show_closed: true,
            show_newer_than_last_login: false,
            show_active_or_open: false,
            description_search: false,
            user_name_search: false,
            subject_search: false,
            from_date: true,
            to_date: true,
        }
    }
}

impl FilterVisibility {
    /// Every control hidden.
    pub fn none() -> Self {
        Self {
            show_closed: false,
            show_newer_than_last_login: false,
            show_active_or_open: false,
            description_search: false,
            user_name_search: false,
            subject_search: false,
            from_date: false,
            to_date: false,
        }
    }
}

/// Filter criteria for a page plus the visibility of each control.
///
/// Dates are stored in UTC; the setters convert whatever zone they are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterState {
    pub show_closed: bool,
    pub show_newer_than_last_login: bool,
    pub show_active_or_open: bool,
    pub description_search: Option<String>,
    pub user_name_search: Option<String>,
    pub subject_search: Option<String>,
    from_date: Option<DateTime<Utc>>,
    to_date: Option<DateTime<Utc>>,
    pub display: FilterVisibility,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state with the given control visibility and no criteria.
    pub fn with_visibility(display: FilterVisibility) -> Self {
        Self {
            display,
            ..Self::default()
        }
    }

    pub fn from_date(&self) -> Option<DateTime<Utc>> {
        self.from_date
    }

    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        self.to_date
    }

    pub fn set_from_date<Tz: TimeZone>(&mut self, value: Option<DateTime<Tz>>) {
        self.from_date = value.map(|value| value.with_timezone(&Utc));
    }

    pub fn set_to_date<Tz: TimeZone>(&mut self, value: Option<DateTime<Tz>>) {
        self.to_date = value.map(|value| value.with_timezone(&Utc));
    }

    /// Sets the lower bound from a wall-clock time in `zone`.
    pub fn set_from_local(&mut self, value: Option<NaiveDateTime>, zone: LocalZone) {
        self.from_date = value.map(|naive| zone.to_utc(naive));
    }

    /// Sets the upper bound from a wall-clock time in `zone`.
    pub fn set_to_local(&mut self, value: Option<NaiveDateTime>, zone: LocalZone) {
        self.to_date = value.map(|naive| zone.to_utc(naive));
    }

    /// True when `from > to`; such a range matches nothing.
    pub fn has_inverted_range(&self) -> bool {
        matches!((self.from_date, self.to_date), (Some(from), Some(to)) if from > to)
    }

    /// Copies the criteria of `other` while keeping this state's visibility.
    pub fn replace_criteria(&mut self, other: FilterState) {
        let display = self.display;
        *self = FilterState { display, ..other };
    }
}
