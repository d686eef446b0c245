use std::sync::OnceLock;

use campus_core::validation::{not_blank, within_length};
use campus_core::{ValidationReport, Validator};
use campus_filters::{parse_bound, Bound, FilterState, LocalZone};
use serde::Deserialize;

const MAX_SEARCH_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Body of an "apply filter" submission.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterSubmission {
    pub show_closed: bool,
    pub show_newer_than_last_login: bool,
    pub show_active_or_open: bool,
    pub description_search: Option<String>,
    pub user_name_search: Option<String>,
    pub subject_search: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

fn filter_validator() -> &'static Validator<FilterSubmission> {
    static VALIDATOR: OnceLock<Validator<FilterSubmission>> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        let too_long = format!("must be at most {MAX_SEARCH_LEN} characters");
        Validator::new()
            .rule("description_search", too_long.clone(), |form: &FilterSubmission| {
                within_length(form.description_search.as_deref(), MAX_SEARCH_LEN)
            })
            .rule("user_name_search", too_long.clone(), |form: &FilterSubmission| {
                within_length(form.user_name_search.as_deref(), MAX_SEARCH_LEN)
            })
            .rule("subject_search", too_long, |form: &FilterSubmission| {
                within_length(form.subject_search.as_deref(), MAX_SEARCH_LEN)
            })
    })
}

impl FilterSubmission {
    pub fn validate(&self) -> ValidationReport {
        filter_validator().validate(self)
    }

    /// Criteria of this submission as a filter state. Dates without an
    /// offset are read in `zone`; unparseable dates leave the bound open.
    pub fn into_state(self, zone: LocalZone) -> FilterState {
        let mut state = FilterState::new();
        state.show_closed = self.show_closed;
        state.show_newer_than_last_login = self.show_newer_than_last_login;
        state.show_active_or_open = self.show_active_or_open;
        state.description_search = self.description_search;
        state.user_name_search = self.user_name_search;
        state.subject_search = self.subject_search;
        state.set_from_date(
            self.from_date
                .as_deref()
                .and_then(|raw| parse_bound(raw, zone, Bound::Lower)),
        );
        state.set_to_date(
            self.to_date
                .as_deref()
                .and_then(|raw| parse_bound(raw, zone, Bound::Upper)),
        );
        state
    }
}

/// Body of a new exam issue.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewIssue {
    pub student_first_name: String,
    pub student_last_name: String,
    pub class_name: String,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn issue_validator() -> &'static Validator<NewIssue> {
    static VALIDATOR: OnceLock<Validator<NewIssue>> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        Validator::new()
            .rule("student_first_name", "is required", |issue: &NewIssue| {
                not_blank(&issue.student_first_name)
            })
            .rule("student_last_name", "is required", |issue: &NewIssue| {
                not_blank(&issue.student_last_name)
            })
            .rule("class_name", "is required", |issue: &NewIssue| {
                not_blank(&issue.class_name)
            })
            .rule("subject", "is required", |issue: &NewIssue| not_blank(&issue.subject))
            .rule(
                "description",
                format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
                |issue: &NewIssue| within_length(issue.description.as_deref(), MAX_DESCRIPTION_LEN),
            )
    })
}

impl NewIssue {
    pub fn validate(&self) -> ValidationReport {
        issue_validator().validate(self)
    }

    /// Trims every field and drops a blank description.
    pub fn normalized(self) -> Self {
        Self {
            student_first_name: self.student_first_name.trim().to_string(),
            student_last_name: self.student_last_name.trim().to_string(),
            class_name: self.class_name.trim().to_string(),
            subject: self.subject.trim().to_string(),
            description: self
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
        }
    }
}

/// Body of an open/close toggle.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct IssueStatusUpdate {
    pub closed: bool,
}
