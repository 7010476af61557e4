// ABOUTME: Configuration values resolved from the process environment.
// ABOUTME: Debug output redacts literals since these carry tokens and webhook URLs.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// A config value that is either written inline or pulled from the
/// environment when the pipeline runs.
///
/// Vault tokens and webhook URLs flow through this type, so the manual
/// `Debug` impl never prints literal contents.
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

impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(_) => write!(f, "Literal(<redacted>)"),
            EnvValue::FromEnv { var, .. } => write!(f, "FromEnv({var})"),
        }
    }
}

pub fn resolve_env_map(map: &HashMap<String, EnvValue>) -> Result<HashMap<String, String>> {
    map.iter()
        .map(|(k, v)| v.resolve().map(|resolved| (k.clone(), resolved)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_literal_contents() {
        let value = EnvValue::Literal("hvs.SECRETTOKEN".to_string());
        let printed = format!("{value:?}");
        assert!(!printed.contains("SECRETTOKEN"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn debug_shows_env_var_name() {
        let value = EnvValue::FromEnv {
            var: "VAULT_TOKEN".to_string(),
            default: None,
        };
        assert_eq!(format!("{value:?}"), "FromEnv(VAULT_TOKEN)");
    }
}
