//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid ledger mode value.
    #[error("invalid mode: {value} (expected production or sandbox)")]
    InvalidMode { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated event identifier.
    ///
    /// Event IDs must be non-empty strings. Fresh IDs are UUID v4 strings, but
    /// any non-empty value read back from the ledger is accepted.
    EventId, "event ID"
);

define_string_id!(
    /// A validated tenant identifier.
    ///
    /// Each tenant owns one ledger per [`Mode`].
    TenantId, "tenant ID"
);

/// Execution mode of a ledger.
///
/// Production and sandbox data live in disjoint namespaces and are never
/// mixed in one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[serde(alias = "release")]
    Production,
    #[default]
    #[serde(alias = "debug")]
    Sandbox,
}

impl Mode {
    /// String representation used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }

    /// Suffix of the storage key for this mode.
    const fn key_suffix(self) -> &'static str {
        match self {
            Self::Production => "ts_events",
            Self::Sandbox => "ts_debug",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" | "release" => Ok(Self::Production),
            "sandbox" | "debug" => Ok(Self::Sandbox),
            _ => Err(ValidationError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

/// A `(tenant, mode)` partition of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub tenant: TenantId,
    pub mode: Mode,
}

impl Namespace {
    pub const fn new(tenant: TenantId, mode: Mode) -> Self {
        Self { tenant, mode }
    }

    /// The same tenant in the other mode.
    #[must_use]
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            tenant: self.tenant.clone(),
            mode,
        }
    }

    /// Storage key of the ordered collection, e.g. `user:alice:ts_events`.
    pub fn key(&self) -> String {
        format!("user:{}:{}", self.tenant, self.mode.key_suffix())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ids_are_rejected() {
        assert_eq!(
            EventId::new("").unwrap_err(),
            ValidationError::Empty { field: "event ID" }
        );
        assert!(TenantId::new("").is_err());
    }

    #[test]
    fn namespace_keys_separate_modes() {
        let tenant = TenantId::new("alice").unwrap();
        let production = Namespace::new(tenant.clone(), Mode::Production);
        let sandbox = Namespace::new(tenant, Mode::Sandbox);

        assert_eq!(production.key(), "user:alice:ts_events");
        assert_eq!(sandbox.key(), "user:alice:ts_debug");
        assert_eq!(production.with_mode(Mode::Sandbox), sandbox);
    }

    #[test]
    fn mode_parses_legacy_names() {
        assert_eq!("release".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!("debug".parse::<Mode>().unwrap(), Mode::Sandbox);
        assert_eq!("sandbox".parse::<Mode>().unwrap(), Mode::Sandbox);
        assert!("staging".parse::<Mode>().is_err());
    }

    #[test]
    fn mode_deserializes_legacy_names() {
        let production: Mode = serde_json::from_str("\"release\"").unwrap();
        let sandbox: Mode = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(production, Mode::Production);
        assert_eq!(sandbox, Mode::Sandbox);
        assert_eq!(serde_json::to_string(&production).unwrap(), "\"production\"");
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&Mode::Production).unwrap();
        assert_eq!(json, r#""production""#);
    }
}
