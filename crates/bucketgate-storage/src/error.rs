//! Fetch error type.

/// Outcome of a failed object fetch.
///
/// Callers branch on the variant: [`NotFound`](Self::NotFound) is a client
/// visible 404, everything else is an opaque internal failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The object does not exist in the bucket.
    #[error("object {key:?} not found in bucket {bucket:?}")]
    NotFound {
        /// Bucket that was searched.
        bucket: String,
        /// Key that was requested.
        key: String,
    },

    /// Any other failure (credentials, network, permissions, missing bucket).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    /// Build a [`FetchError::NotFound`].
    #[must_use]
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Whether this is a [`FetchError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
