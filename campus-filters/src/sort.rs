use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::Sortable;

/// Keys a page may sort by. `None` selects the default chain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    None,
    FirstName,
    LastName,
    Class,
    LastLogin,
    Subject,
    CreatedAt,
    Status,
}

impl SortKey {
    /// Parses a query value. Anything unrecognised falls back to [`SortKey::None`].
    pub fn parse_lossy(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return SortKey::None;
        };
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "firstname" | "first" => SortKey::FirstName,
            "lastname" | "last" => SortKey::LastName,
            "class" | "classname" => SortKey::Class,
            "lastlogin" => SortKey::LastLogin,
            "subject" => SortKey::Subject,
            "createdat" | "created" | "date" => SortKey::CreatedAt,
            "status" => SortKey::Status,
            _ => {
                if !normalized.is_empty() {
                    debug!(sort = %raw, "unrecognised sort key, using default ordering");
                }
                SortKey::None
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::None => "none",
            SortKey::FirstName => "first_name",
            SortKey::LastName => "last_name",
            SortKey::Class => "class",
            SortKey::LastLogin => "last_login",
            SortKey::Subject => "subject",
            SortKey::CreatedAt => "created_at",
            SortKey::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Parses a query value. Anything other than a descending marker is ascending.
    pub fn parse_lossy(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("desc" | "descending" | "d") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn orient(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Comparable value an entity exposes for a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField<'a> {
    Text(Option<&'a str>),
    Time(Option<DateTime<Utc>>),
    Flag(bool),
    /// The entity kind has no value for this key.
    Absent,
}

impl SortField<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortField::Absent => 0,
            SortField::Flag(_) => 1,
            SortField::Time(_) => 2,
            SortField::Text(_) => 3,
        }
    }
}

impl Ord for SortField<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortField::Text(left), SortField::Text(right)) => match (left, right) {
                (Some(left), Some(right)) => compare_text(left, right),
                _ => left.is_some().cmp(&right.is_some()),
            },
            (SortField::Time(left), SortField::Time(right)) => left.cmp(right),
            (SortField::Flag(left), SortField::Flag(right)) => left.cmp(right),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortField<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Case-insensitive first, then byte order so distinct strings never tie.
fn compare_text(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
        .then_with(|| left.cmp(right))
}

const DEFAULT_CHAIN: [SortKey; 3] = [SortKey::Class, SortKey::FirstName, SortKey::LastName];

/// Requested ordering for a page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Builds a spec from raw query values, applying the documented fallbacks.
    pub fn from_query(sort: Option<&str>, direction: Option<&str>) -> Self {
        Self::new(
            SortKey::parse_lossy(sort),
            SortDirection::parse_lossy(direction),
        )
    }

    /// Direction actually applied. The default chain is always ascending.
    pub fn effective_direction(&self) -> SortDirection {
        match self.key {
            SortKey::None => SortDirection::Ascending,
            _ => self.direction,
        }
    }

    /// Ordered keys compared before the terminal record id.
    pub fn chain(&self) -> Vec<SortKey> {
        let mut chain = Vec::with_capacity(DEFAULT_CHAIN.len() + 1);
        if self.key != SortKey::None {
            chain.push(self.key);
        }
        chain.extend(DEFAULT_CHAIN.iter().copied().filter(|key| *key != self.key));
        chain
    }

    pub fn compare<E: Sortable>(&self, left: &E, right: &E) -> Ordering {
        self.compare_along(&self.chain(), left, right)
    }

    fn compare_along<E: Sortable>(&self, chain: &[SortKey], left: &E, right: &E) -> Ordering {
        let ordering = chain
            .iter()
            .map(|key| left.sort_field(*key).cmp(&right.sort_field(*key)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| left.record_id().cmp(&right.record_id()));
        self.effective_direction().orient(ordering)
    }

    /// Returns the items in the requested total order.
    pub fn apply<E: Sortable>(&self, mut items: Vec<E>) -> Vec<E> {
        let chain = self.chain();
        items.sort_by(|left, right| self.compare_along(&chain, left, right));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("last_name"), SortKey::LastName ; "snake case")]
    #[test_case(Some("LastName"), SortKey::LastName ; "pascal case")]
    #[test_case(Some("first-name"), SortKey::FirstName ; "kebab case")]
    #[test_case(Some("CLASS"), SortKey::Class ; "upper case")]
    #[test_case(Some("lastlogin"), SortKey::LastLogin ; "last login")]
    #[test_case(Some("created"), SortKey::CreatedAt ; "created alias")]
    #[test_case(Some("shoe_size"), SortKey::None ; "unknown key")]
    #[test_case(Some(""), SortKey::None ; "empty key")]
    #[test_case(None, SortKey::None ; "missing key")]
    fn parses_sort_keys(raw: Option<&str>, expected: SortKey) {
        assert_eq!(SortKey::parse_lossy(raw), expected);
    }

    #[test_case(Some("desc"), SortDirection::Descending ; "short")]
    #[test_case(Some(" Descending "), SortDirection::Descending ; "long padded")]
    #[test_case(Some("asc"), SortDirection::Ascending ; "ascending")]
    #[test_case(Some("sideways"), SortDirection::Ascending ; "unknown")]
    #[test_case(None, SortDirection::Ascending ; "missing")]
    fn parses_directions(raw: Option<&str>, expected: SortDirection) {
        assert_eq!(SortDirection::parse_lossy(raw), expected);
    }

    #[test]
    fn default_chain_ignores_direction() {
        let spec = SortSpec::new(SortKey::None, SortDirection::Descending);
        assert_eq!(spec.effective_direction(), SortDirection::Ascending);
        assert_eq!(
            spec.chain(),
            vec![SortKey::Class, SortKey::FirstName, SortKey::LastName]
        );
    }

    #[test]
    fn explicit_key_leads_chain_without_duplicates() {
        let spec = SortSpec::new(SortKey::FirstName, SortDirection::Ascending);
        assert_eq!(
            spec.chain(),
            vec![SortKey::FirstName, SortKey::Class, SortKey::LastName]
        );

        let spec = SortSpec::new(SortKey::LastLogin, SortDirection::Ascending);
        assert_eq!(spec.chain().len(), 4);
    }

    #[test]
    fn text_compares_case_insensitively_then_bytewise() {
        assert_eq!(compare_text("alice", "Bob"), Ordering::Less);
        assert_eq!(compare_text("Bob", "bob"), Ordering::Less);
        assert_eq!(compare_text("bob", "bob"), Ordering::Equal);
    }

    #[test]
    fn missing_values_sort_first() {
        assert!(SortField::Text(None) < SortField::Text(Some("a")));
        assert!(SortField::Time(None) < SortField::Time(Some(Utc::now())));
    }

    struct Row {
        id: uuid::Uuid,
        first: &'static str,
        class: Option<&'static str>,
    }

    impl Sortable for Row {
        fn sort_field(&self, key: SortKey) -> SortField<'_> {
            match key {
                SortKey::FirstName => SortField::Text(Some(self.first)),
                SortKey::Class => SortField::Text(self.class),
                _ => SortField::Absent,
            }
        }

        fn record_id(&self) -> uuid::Uuid {
            self.id
        }
    }

    #[test_case(SortKey::None, SortDirection::Ascending ; "default chain")]
    #[test_case(SortKey::FirstName, SortDirection::Descending ; "first name descending")]
    #[test_case(SortKey::Class, SortDirection::Ascending ; "class ascending")]
    fn apply_agrees_with_pairwise_compare(key: SortKey, direction: SortDirection) {
        let rows: Vec<Row> = [
            ("Noa", Some("11B")),
            ("avi", Some("12A")),
            ("Dana", None),
            ("Noa", Some("11B")),
            ("dana", Some("12A")),
        ]
        .into_iter()
        .map(|(first, class)| Row {
            id: uuid::Uuid::new_v4(),
            first,
            class,
        })
        .collect();

        let spec = SortSpec::new(key, direction);
        let sorted = spec.apply(rows);
        assert!(sorted
            .windows(2)
            .all(|pair| spec.compare(&pair[0], &pair[1]) == Ordering::Less));
    }
}
