//! Error types for the program-data model.
//!
//! Absence of a declaration, definition or scope is NOT an error: resolution
//! and queries express it as an empty `Option`/`Vec`. The variants here cover
//! the cases a caller must be able to tell apart from "not found":
//!
//! - [`ParseError`]: one translation unit could not be turned into a scope tree
//! - [`Error::LockTimeout`]: the data may exist but the lock was contended
//! - [`MergeConflict`]: a unit's contribution was rejected by the global merge
//! - [`Error::Cancelled`]: an async query was cancelled before completing

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::base::SourceLocation;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which side of the working-set lock timed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockAccess {
    Read,
    Write,
}

impl fmt::Display for LockAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockAccess::Read => f.write_str("read"),
            LockAccess::Write => f.write_str("write"),
        }
    }
}

/// A translation unit could not be converted into a scope tree.
///
/// Parse errors are isolated per file: they are logged and counted, and the
/// previous contribution of the file stays in the working set.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{file}: {reason}{}", location_suffix(.location))]
pub struct ParseError {
    pub file: Arc<str>,
    pub location: Option<SourceLocation>,
    pub reason: String,
}

impl ParseError {
    pub fn new(file: impl Into<Arc<str>>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            location: None,
            reason: reason.into(),
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

fn location_suffix(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(" (line {}, column {})", loc.start_line(), loc.start_column()),
        None => String::new(),
    }
}

/// Two non-mergeable entities claim the same qualified name.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{file}: '{qualified_name}' declared as {incoming} conflicts with existing {existing}")]
pub struct MergeConflict {
    /// The unit whose contribution was rejected.
    pub file: Arc<str>,
    pub qualified_name: String,
    /// Description of the entity already in the working set.
    pub existing: String,
    /// Description of the entity the unit tried to add.
    pub incoming: String,
    pub location: Option<SourceLocation>,
}

/// Unified error type for working-set operations and queries.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("timed out after {timeout:?} waiting for the {access} lock")]
    LockTimeout {
        access: LockAccess,
        timeout: Duration,
    },

    #[error("merge conflict: {0}")]
    MergeConflict(#[from] MergeConflict),

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("working set has been disposed")]
    Disposed,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Background(String),
}

impl Error {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::LockTimeout { .. })
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("a.cpp", "function without a name")
            .at(SourceLocation::new("a.cpp", 4, 2));
        assert_eq!(
            err.to_string(),
            "a.cpp: function without a name (line 4, column 2)"
        );
    }

    #[test]
    fn test_lock_timeout_is_transient() {
        let err = Error::LockTimeout {
            access: LockAccess::Read,
            timeout: Duration::from_millis(5),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("read lock"));
        assert!(!Error::Cancelled.is_transient());
    }

    #[test]
    fn test_merge_conflict_converts() {
        let conflict = MergeConflict {
            file: Arc::from("B.java"),
            qualified_name: "com.acme.Widget".into(),
            existing: "class from A.java".into(),
            incoming: "class".into(),
            location: None,
        };
        let err: Error = conflict.clone().into();
        assert!(matches!(err, Error::MergeConflict(ref c) if *c == conflict));
    }
}
