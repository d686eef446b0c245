use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Filterable, SearchField, StatusToggle};

/// Single predicate produced from a filter. Each variant reads one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    /// Case-insensitive substring match. `needle` is stored lower-cased.
    ContainsText { field: SearchField, needle: String },
    /// Entity must satisfy the status toggle when the toggle applies to it.
    Status { toggle: StatusToggle },
    /// Range timestamp at or after the bound.
    OnOrAfter { bound: DateTime<Utc> },
    /// Range timestamp at or before the bound.
    OnOrBefore { bound: DateTime<Utc> },
    /// Changed strictly after the instant.
    ChangedAfter { since: DateTime<Utc> },
}

impl Criterion {
    /// Builds a text criterion. Blank text yields `None` (no constraint).
    pub fn contains_text(field: SearchField, text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Criterion::ContainsText {
            field,
            needle: trimmed.to_lowercase(),
        })
    }

    pub fn matches<E: Filterable + ?Sized>(&self, entity: &E) -> bool {
        match self {
            Criterion::ContainsText { field, needle } => entity
                .search_candidates(*field)
                .map(|candidates| {
                    candidates
                        .iter()
                        .any(|candidate| candidate.to_lowercase().contains(needle.as_str()))
                })
                .unwrap_or(true),
            Criterion::Status { toggle } => entity.status(*toggle).unwrap_or(true),
            Criterion::OnOrAfter { bound } => entity
                .range_timestamp()
                .map(|timestamp| timestamp >= *bound)
                .unwrap_or(false),
            Criterion::OnOrBefore { bound } => entity
                .range_timestamp()
                .map(|timestamp| timestamp <= *bound)
                .unwrap_or(false),
            Criterion::ChangedAfter { since } => entity
                .changed_at()
                .map(|timestamp| timestamp > *since)
                .unwrap_or(false),
        }
    }
}
