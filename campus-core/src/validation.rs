//! Declarative validation kept apart from the data it checks.
//!
//! A [`Validator`] owns an ordered list of [`ValidationRule`]s. Each rule names
//! the field it guards, the message reported on failure and a predicate that
//! returns `true` when the value is acceptable.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::CampusError;

/// Single declared rule: `predicate(value) == false` reports `message` for `field`.
pub struct ValidationRule<T> {
    pub field: &'static str,
    pub message: String,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> ValidationRule<T> {
    pub fn new<F>(field: &'static str, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            field,
            message: message.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn check(&self, value: &T) -> bool {
        (self.predicate)(value)
    }
}

impl<T> std::fmt::Debug for ValidationRule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRule")
            .field("field", &self.field)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Field-keyed failures collected by a [`Validator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }

    fn push(&mut self, field: &'static str, message: String) {
        self.errors.entry(field).or_default().push(message);
    }

    /// Converts a failed report into the canonical error, joining all messages.
    pub fn into_result(self) -> Result<(), CampusError> {
        if self.is_valid() {
            return Ok(());
        }
        let summary = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        Err(CampusError::ValidationError(summary))
    }
}

/// Ordered set of rules evaluated against a value.
#[derive(Debug)]
pub struct Validator<T> {
    rules: Vec<ValidationRule<T>>,
    fail_fast: bool,
}

impl<T> Default for Validator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Validator<T> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fail_fast: false,
        }
    }

    /// Stop at the first failing rule.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn rule<F>(mut self, field: &'static str, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.rules
            .push(ValidationRule::new(field, message, predicate));
        self
    }

    pub fn rules(&self) -> &[ValidationRule<T>] {
        &self.rules
    }

    pub fn validate(&self, value: &T) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            if !rule.check(value) {
                report.push(rule.field, rule.message.clone());
                if self.fail_fast {
                    break;
                }
            }
        }
        report
    }
}

/// Returns `true` when the text has at least one non-whitespace character.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Returns `true` when the optional text is absent or at most `max` characters.
pub fn within_length(value: Option<&str>, max: usize) -> bool {
    value.map(|text| text.chars().count() <= max).unwrap_or(true)
}
