// ABOUTME: Secret-friendly config values: a literal or a reference to an environment variable.
// ABOUTME: Lets the API token stay out of the config file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

// Literal values are usually tokens.
impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(_) => f.write_str("Literal([redacted])"),
            EnvValue::FromEnv { var, .. } => f.debug_struct("FromEnv").field("var", var).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_resolves_to_itself() {
        let value = EnvValue::Literal("abc".into());
        assert_eq!(value.resolve().unwrap(), "abc");
    }

    #[test]
    fn env_reference_uses_variable() {
        temp_env::with_var("CFSHIP_TEST_TOKEN", Some("from-env"), || {
            let value = EnvValue::FromEnv {
                var: "CFSHIP_TEST_TOKEN".into(),
                default: None,
            };
            assert_eq!(value.resolve().unwrap(), "from-env");
        });
    }

    #[test]
    fn env_reference_falls_back_to_default() {
        temp_env::with_var_unset("CFSHIP_TEST_UNSET", || {
            let value = EnvValue::FromEnv {
                var: "CFSHIP_TEST_UNSET".into(),
                default: Some("fallback".into()),
            };
            assert_eq!(value.resolve().unwrap(), "fallback");
        });
    }

    #[test]
    fn missing_env_without_default_is_error() {
        temp_env::with_var_unset("CFSHIP_TEST_UNSET", || {
            let value = EnvValue::FromEnv {
                var: "CFSHIP_TEST_UNSET".into(),
                default: None,
            };
            assert!(matches!(value.resolve(), Err(Error::MissingEnvVar(v)) if v == "CFSHIP_TEST_UNSET"));
        });
    }

    #[test]
    fn debug_hides_literal() {
        let value = EnvValue::Literal("secret-token".into());
        assert!(!format!("{:?}", value).contains("secret"));
    }
}
