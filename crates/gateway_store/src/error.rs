// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for gateway and store operations.

use std::fmt;

use crate::ItemIdentity;

/// The category of a failed operation.
///
/// Store errors surface to gateway callers unchanged, so the kind observed by
/// a caller is always the kind the backing store reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The addressed item does not exist.
    NotFound,
    /// An item with the same id already exists in the partition.
    DuplicateKey,
    /// The backing store could not be reached or did not answer in time.
    StoreUnavailable,
    /// The operation or its options are malformed.
    InvalidOperation,
}

impl ErrorKind {
    /// Returns a stable, lowercase name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DuplicateKey => "duplicate_key",
            Self::StoreUnavailable => "store_unavailable",
            Self::InvalidOperation => "invalid_operation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a store or gateway operation.
///
/// Every error carries an [`ErrorKind`]; the underlying cause, if any, is
/// available through [`std::error::Error::source()`].
///
/// # Examples
///
/// ```
/// use gateway_store::{Error, ErrorKind};
///
/// let error = Error::unavailable("connection reset");
/// assert_eq!(error.kind(), ErrorKind::StoreUnavailable);
/// ```
#[ohno::error]
#[display("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind without a cause.
    #[must_use]
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind)
    }

    /// Creates an error of the given kind with an attached cause.
    pub fn with_cause(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Creates a [`ErrorKind::NotFound`] error for the given item.
    #[must_use]
    pub fn not_found(identity: &ItemIdentity) -> Self {
        Self::caused_by(ErrorKind::NotFound, format!("item {identity} does not exist"))
    }

    /// Creates a [`ErrorKind::DuplicateKey`] error for the given item.
    #[must_use]
    pub fn duplicate_key(identity: &ItemIdentity) -> Self {
        Self::caused_by(ErrorKind::DuplicateKey, format!("item {identity} already exists"))
    }

    /// Creates a [`ErrorKind::StoreUnavailable`] error.
    pub fn unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::StoreUnavailable, cause)
    }

    /// Creates a [`ErrorKind::InvalidOperation`] error.
    pub fn invalid_operation(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::InvalidOperation, cause)
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A specialized [`Result`] type for store and gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_starts_with_kind_and_contains_cause() {
        let error = Error::not_found(&ItemIdentity::new("doc", "pk"));
        let display = error.to_string();

        assert!(display.starts_with("not_found"), "unexpected display: {display}");
        assert!(display.contains("doc[pk]"), "unexpected display: {display}");
    }

    #[test]
    fn constructors_set_kind() {
        assert_eq!(Error::from_kind(ErrorKind::DuplicateKey).kind(), ErrorKind::DuplicateKey);
        assert_eq!(Error::duplicate_key(&ItemIdentity::new("a", "b")).kind(), ErrorKind::DuplicateKey);
        assert_eq!(Error::unavailable("timeout").kind(), ErrorKind::StoreUnavailable);
        assert_eq!(Error::invalid_operation("bad").kind(), ErrorKind::InvalidOperation);
        assert_eq!(
            Error::with_cause(ErrorKind::NotFound, "gone").kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn debug_contains_cause_message() {
        let error = Error::unavailable("connection reset by peer");
        let debug = format!("{error:?}");
        assert!(debug.contains("connection reset by peer"), "unexpected debug: {debug}");
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::DuplicateKey.as_str(), "duplicate_key");
        assert_eq!(ErrorKind::StoreUnavailable.as_str(), "store_unavailable");
        assert_eq!(ErrorKind::InvalidOperation.as_str(), "invalid_operation");
    }
}
