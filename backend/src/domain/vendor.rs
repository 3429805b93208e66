//! Backing store vendors recognised by the persistence selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Family of backing store a persistence driver talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbVendor {
    /// Document store (MongoDB).
    #[default]
    Mongo,
    /// Relational store (PostgreSQL).
    Sql,
}

/// Raised by [`DbVendor::from_str`] for unrecognised names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown database vendor '{0}'; expected mongo, sql, sequelize, postgres or postgresql")]
pub struct UnknownVendorError(pub String);

impl FromStr for DbVendor {
    type Err = UnknownVendorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "sql" | "sequelize" | "postgres" | "postgresql" => Ok(Self::Sql),
            _ => Err(UnknownVendorError(raw.to_owned())),
        }
    }
}

impl DbVendor {
    /// Resolve a configured vendor name.
    ///
    /// Missing or blank values select the document store. Unrecognised values
    /// also fall back to the document store, with a warning.
    pub fn from_setting(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
            return Self::default();
        };
        raw.parse().unwrap_or_else(|error: UnknownVendorError| {
            warn!(%error, fallback = %Self::default(), "unrecognised DB_VENDOR");
            Self::default()
        })
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mongo => "mongo",
            Self::Sql => "sql",
        }
    }
}

impl fmt::Display for DbVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mongo", DbVendor::Mongo)]
    #[case("MongoDB", DbVendor::Mongo)]
    #[case("sql", DbVendor::Sql)]
    #[case("Sequelize", DbVendor::Sql)]
    #[case(" postgres ", DbVendor::Sql)]
    #[case("POSTGRESQL", DbVendor::Sql)]
    fn parses_recognised_names(#[case] raw: &str, #[case] expected: DbVendor) {
        assert_eq!(raw.parse::<DbVendor>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_names_when_parsing_strictly() {
        let err = "oracle".parse::<DbVendor>().expect_err("unknown vendor");
        assert!(err.to_string().contains("oracle"));
    }

    #[rstest]
    #[case(None, DbVendor::Mongo)]
    #[case(Some(""), DbVendor::Mongo)]
    #[case(Some("oracle"), DbVendor::Mongo)]
    #[case(Some("postgres"), DbVendor::Sql)]
    fn settings_fall_back_to_document_store(
        #[case] raw: Option<&str>,
        #[case] expected: DbVendor,
    ) {
        assert_eq!(DbVendor::from_setting(raw), expected);
    }
}
