//! Error types returned by `ChainTable`.

use thiserror::Error;

/// Reasons a table operation can be rejected.
///
/// Lookups and removals of absent keys are not errors; they return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    /// `ChainTable` needs at least one bucket.
    #[error("bucket count must be positive")]
    ZeroBuckets,
    /// Keys must contain at least one byte.
    #[error("key must not be empty")]
    EmptyKey,
    /// Growing the bucket array or a bucket chain failed. The table is left
    /// as it was before the call.
    #[error("allocation failed while growing the table")]
    AllocFailed,
}

/// A rejected `try_put`, handing the value back to the caller.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PutError<V> {
    pub error: TableError,
    pub value: V,
}

impl<V> PutError<V> {
    pub(crate) fn new(error: TableError, value: V) -> Self {
        Self { error, value }
    }

    pub fn into_value(self) -> V {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            TableError::ZeroBuckets.to_string(),
            "bucket count must be positive"
        );
        assert_eq!(TableError::EmptyKey.to_string(), "key must not be empty");
    }

    /// Invariant: a rejected put returns the value untouched.
    #[test]
    fn put_error_returns_value() {
        let err = PutError::new(TableError::EmptyKey, vec![1, 2, 3]);
        assert_eq!(err.to_string(), "key must not be empty");
        assert_eq!(err.error, TableError::EmptyKey);
        assert_eq!(err.into_value(), vec![1, 2, 3]);
    }
}
