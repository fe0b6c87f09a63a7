//! Strongly typed identifiers
//!
//! Task ids are assigned by the backend and treated as opaque strings (the
//! CRM backend hands out integers, the in-memory gateway hands out whatever it
//! likes). Column ids are slugs derived from the column title.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier string
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_id!(
    /// Identifier of a task, as assigned by the persistence gateway
    TaskId
);

define_id!(
    /// Identifier of a board column (`todo`, `in-progress`, `done`, or a user slug)
    ColumnId
);

impl ColumnId {
    /// The column every orphaned task falls back to
    pub fn todo() -> Self {
        Self::from_string(super::board::TODO)
    }

    /// Derive a column id from a display title: trimmed and lower-cased
    pub fn from_title(title: &str) -> Self {
        Self(title.trim().to_lowercase())
    }
}
