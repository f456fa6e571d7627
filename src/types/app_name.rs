// ABOUTME: Validated application name for platform apps.
// ABOUTME: Derives the "venerable" name used while an app is being replaced.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Suffix appended to the name of an app that is about to be retired.
pub const VENERABLE_SUFFIX: &str = "-venerable";

const MAX_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppNameError {
    #[error("app name cannot be empty")]
    Empty,

    #[error("app name exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("app name cannot start or end with whitespace")]
    SurroundingWhitespace,

    #[error("invalid control character in app name: {0:?}")]
    ControlChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppName(String);

impl AppName {
    pub fn new(value: &str) -> Result<Self, AppNameError> {
        if value.is_empty() {
            return Err(AppNameError::Empty);
        }

        if value.chars().count() > MAX_LEN {
            return Err(AppNameError::TooLong);
        }

        if value.trim() != value {
            return Err(AppNameError::SurroundingWhitespace);
        }

        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(AppNameError::ControlChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name given to the origin app while its replacement is stood up.
    pub fn venerable(&self) -> AppName {
        AppName(format!("{}{}", self.0, VENERABLE_SUFFIX))
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AppName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AppName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AppName::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venerable_appends_suffix() {
        let name = AppName::new("billing").unwrap();
        assert_eq!(name.venerable().as_str(), "billing-venerable");
    }

    #[test]
    fn rejects_empty_and_padded_names() {
        assert_eq!(AppName::new(""), Err(AppNameError::Empty));
        assert_eq!(
            AppName::new(" billing"),
            Err(AppNameError::SurroundingWhitespace)
        );
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(
            AppName::new("bill\ning"),
            Err(AppNameError::ControlChar('\n'))
        );
    }

    #[test]
    fn accepts_mixed_case_and_punctuation() {
        assert!(AppName::new("My_App.v2").is_ok());
    }
}
