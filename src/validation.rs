//! Field rules checked by the stores before a write, and the mapping from
//! store failures to the client-facing `{"errors": [...]}` list.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::StoreError;

/// A single violated field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Required, non-empty text column.
pub struct TextRule {
    pub field: &'static str,
    pub missing: &'static str,
    pub empty: &'static str,
}

impl TextRule {
    /// Records a violation, or hands the value back when it passes.
    pub fn take(&self, value: Option<String>, out: &mut Vec<Violation>) -> Option<String> {
        match value {
            None => {
                out.push(Violation::new(self.field, self.missing));
                None
            }
            Some(v) if v.is_empty() => {
                out.push(Violation::new(self.field, self.empty));
                None
            }
            Some(v) => Some(v),
        }
    }

    /// Same as [`take`](Self::take) for a partial update; absent keys are skipped.
    pub fn take_patch(&self, value: Option<Option<String>>, out: &mut Vec<Violation>) -> Option<String> {
        value.and_then(|v| self.take(v, out))
    }
}

/// Required, syntactically valid email column.
pub struct EmailRule {
    pub field: &'static str,
    pub missing: &'static str,
    pub invalid: &'static str,
}

impl EmailRule {
    pub fn take(&self, value: Option<String>, out: &mut Vec<Violation>) -> Option<String> {
        match value {
            None => {
                out.push(Violation::new(self.field, self.missing));
                None
            }
            Some(v) if !is_valid_email(&v) => {
                out.push(Violation::new(self.field, self.invalid));
                None
            }
            Some(v) => Some(v),
        }
    }

    pub fn take_patch(&self, value: Option<Option<String>>, out: &mut Vec<Violation>) -> Option<String> {
        value.and_then(|v| self.take(v, out))
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Ordered list of messages returned to the client with a 400.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}

impl From<Vec<Violation>> for ValidationErrors {
    fn from(violations: Vec<Violation>) -> Self {
        Self {
            errors: violations.into_iter().map(|v| v.message).collect(),
        }
    }
}

/// Field-rule and uniqueness failures become a message list. Everything else
/// is handed back as a fatal error.
pub fn normalize(err: StoreError) -> Result<ValidationErrors, anyhow::Error> {
    match err {
        StoreError::Validation(violations) | StoreError::UniqueConstraint(violations) => {
            Ok(violations.into())
        }
        StoreError::Database(e) => Err(anyhow::Error::new(e).context("store operation failed")),
        StoreError::Other(e) => Err(e),
    }
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
