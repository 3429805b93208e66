//! Opaque, backend-assigned record identifiers.
//!
//! The document store hands out ObjectId hex strings and the relational store
//! hands out decimal sequence values. Domain code treats both as opaque text;
//! only the driver that issued an identifier knows how to parse it.

use std::fmt;

/// Validation errors raised when constructing an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIdError {
    Empty,
    SurroundingWhitespace,
}

impl fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier must not be empty"),
            Self::SurroundingWhitespace => {
                write!(f, "identifier must not contain surrounding whitespace")
            }
        }
    }
}

impl std::error::Error for RecordIdError {}

fn validate(id: &str) -> Result<(), RecordIdError> {
    if id.trim().is_empty() {
        return Err(RecordIdError::Empty);
    }
    if id.trim() != id {
        return Err(RecordIdError::SurroundingWhitespace);
    }
    Ok(())
}

macro_rules! define_record_id {
    ($(#[$meta:meta])* pub struct $name:ident;) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the identifier.
            pub fn new(id: impl Into<String>) -> Result<Self, RecordIdError> {
                let id = id.into();
                validate(&id)?;
                Ok(Self(id))
            }

            /// Borrow the identifier text.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = RecordIdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

define_record_id! {
    /// Identifier of a registered user.
    pub struct UserId;
}

define_record_id! {
    /// Identifier of a playlist.
    pub struct PlaylistId;
}

define_record_id! {
    /// Identifier of a song catalog entry.
    pub struct SongId;
}
