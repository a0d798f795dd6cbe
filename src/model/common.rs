use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque handle to one remote object or collection, as issued by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty reference means "nothing to fetch"
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Work-item type named by the reference path, e.g. `testcase` for `.../testcase/123`
    pub fn item_type(&self) -> Option<&str> {
        let path = self.0.split(['?', '#']).next().unwrap_or_default();
        let mut segments = path.trim_end_matches('/').rsplit('/');
        let _id = segments.next()?;
        segments.next().filter(|segment| !segment.is_empty())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Reference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("ID missing")]
    Missing,
    #[error("Invalid ID")]
    Invalid(String),
}

/// A human-facing identifier such as `TC1234`: a letter prefix followed by digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedId {
    raw: String,
    numeric_start: usize,
}

impl FormattedId {
    /// Strip the leading run of ASCII letters and require the rest to be digits
    pub fn parse(raw: Option<&str>) -> Result<Self, IdError> {
        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(IdError::Missing),
        };

        let numeric_start = raw
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(raw.len());
        let numeric = &raw[numeric_start..];

        if numeric.is_empty() || !numeric.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::Invalid(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            numeric_start,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The digits the service is queried with
    pub fn numeric(&self) -> &str {
        &self.raw[self.numeric_start..]
    }
}

impl fmt::Display for FormattedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lower-case the first character of a field name: `WorkProduct` -> `workProduct`
pub fn camel_key(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
