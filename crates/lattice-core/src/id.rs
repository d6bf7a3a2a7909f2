// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sortable, prefixed identifiers.
//!
//! Every entity ID is `<prefix>_<ulid>`. ULIDs embed a millisecond timestamp
//! in their first 10 characters, so lexicographic order of the whole string
//! equals creation order (spec.md "Identifiers" — I1).

use std::fmt;
use std::sync::Mutex;
use ulid::Ulid;

/// Define a newtype ID wrapper around `String` with a fixed, validated prefix.
///
/// Generates `new()`, `as_str()`, `Display`, `FromStr`, `From<String>`,
/// `PartialEq<str>`, and `Borrow<str>` implementations, plus a `generate`
/// constructor that mints a fresh sortable ID.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident, prefix = $prefix:literal;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// The required prefix for this ID type, e.g. `"task"`.
            pub const PREFIX: &'static str = $prefix;

            /// Wrap an existing string as this ID type without validation.
            ///
            /// Used when reading IDs back from storage, where we trust the
            /// on-disk shape was produced by `generate()`.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a fresh, sortable ID with this type's prefix.
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, new_ulid_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if the string has this ID type's prefix and a
            /// syntactically valid ULID suffix.
            pub fn is_well_formed(s: &str) -> bool {
                match s.strip_prefix(concat!($prefix, "_")) {
                    Some(rest) => rest.len() == 26 && rest.chars().all(|c| c.is_ascii_alphanumeric()),
                    None => false,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// A task's identifier, prefix `task_`.
    pub struct TaskId, prefix = "task";
}

define_id! {
    /// An event's identifier, prefix `ev_`.
    pub struct EventId, prefix = "ev";
}

define_id! {
    /// An artifact's identifier, prefix `art_`.
    pub struct ArtifactId, prefix = "art";
}

define_id! {
    /// A resource's identifier, prefix `res_`.
    pub struct ResourceId, prefix = "res";
}

/// Monotonic ULID source shared by all ID generation in a process.
///
/// A plain `Ulid::new()` call reads the system clock and a random
/// component each time; wrapping it in a mutex-guarded monotonic generator
/// guarantees strictly increasing IDs even for events minted within the
/// same millisecond by the same process, which is what I1 requires for a
/// single writer's transaction.
static GENERATOR: Mutex<Option<ulid::Generator>> = Mutex::new(None);

fn new_ulid_string() -> String {
    #[allow(clippy::expect_used)]
    let mut guard = GENERATOR.lock().expect("ulid generator mutex poisoned");
    let generator = guard.get_or_insert_with(ulid::Generator::new);
    #[allow(clippy::expect_used)]
    let ulid = generator
        .generate()
        .expect("monotonic ulid generator exhausted this millisecond");
    ulid.to_string()
}

/// Construct a `Ulid` from an explicit timestamp, for deterministic tests
/// and for rebuild paths that must not read the wall clock.
pub fn ulid_from_timestamp(ts: chrono::DateTime<chrono::Utc>) -> Ulid {
    Ulid::from_datetime(ts.into())
}

/// `PROJECT[-SUB]-N` short ID shape, e.g. `DEMO-1` or `DEMO-BE-42`.
///
/// `PROJECT`/`SUB` are 1-5 uppercase ASCII letters; `N` is a positive
/// integer with no leading zero.
pub fn validate_short_id(s: &str) -> bool {
    parse_short_id(s).is_some()
}

/// Split a short ID into its `(prefix, n)` parts, e.g. `"DEMO-BE-42"` ->
/// `("DEMO-BE", 42)`. Returns `None` if the shape does not match.
pub fn parse_short_id(s: &str) -> Option<(String, u64)> {
    let (head, tail) = s.rsplit_once('-')?;
    if tail.is_empty() || (tail.len() > 1 && tail.starts_with('0')) {
        return None;
    }
    let n: u64 = tail.parse().ok()?;
    if n == 0 {
        return None;
    }
    let segments: Vec<&str> = head.split('-').collect();
    if segments.is_empty() || segments.len() > 2 {
        return None;
    }
    for seg in &segments {
        if seg.is_empty() || seg.len() > 5 || !seg.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
    }
    Some((head.to_string(), n))
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
