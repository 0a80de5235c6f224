//! Alias table and request path routing.
//!
//! An alias is a short path segment that stands in for a bucket name. A
//! request for `/static/css/app.css` with the alias `static -> my-bucket`
//! resolves to the object `css/app.css` in `my-bucket`.
//!
//! # Matching
//!
//! A path matches an alias when it starts with `/` + alias. This is a plain
//! string prefix test, so `/staticfiles` also matches the alias `static`. The
//! object key is then the path with the *first* occurrence of `/alias/`
//! removed. When the path does not contain `/alias/` at all (e.g. `/static`
//! or `/staticfiles/x`), the key is the unmodified path.
//!
//! [`AliasTable::new`] rejects aliases that are prefixes of one another, so at
//! most one alias can match any path and iteration order never changes the
//! outcome.

use std::fmt;

use tracing::trace;

use crate::error::{GatewayError, GatewayResult};

/// Validated, immutable mapping from alias to bucket name.
///
/// Entries are kept sorted by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    /// Build a table from `(alias, bucket)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidAlias`] when an alias is empty, contains
    /// `/`, starts with `_`, or maps to an empty bucket name, and
    /// [`GatewayError::OverlappingAliases`] when one alias is a prefix of
    /// another (duplicates included).
    pub fn new<I, A, B>(aliases: I) -> GatewayResult<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut entries = aliases
            .into_iter()
            .map(|(alias, bucket)| {
                let (alias, bucket) = (alias.into(), bucket.into());
                validate_alias(&alias, &bucket)?;
                Ok((alias, bucket))
            })
            .collect::<GatewayResult<Vec<_>>>()?;

        entries.sort_by(|a, b| a.0.cmp(&b.0));

        // In sorted order every alias sharing a prefix `p` directly follows `p`,
        // so comparing neighbours is enough.
        for pair in entries.windows(2) {
            let (shorter, longer) = (&pair[0].0, &pair[1].0);
            if longer.starts_with(shorter.as_str()) {
                return Err(GatewayError::OverlappingAliases {
                    shorter: shorter.clone(),
                    longer: longer.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Look up the bucket for an alias.
    #[must_use]
    pub fn bucket(&self, alias: &str) -> Option<&str> {
        self.entries
            .binary_search_by(|(a, _)| a.as_str().cmp(alias))
            .ok()
            .map(|idx| self.entries[idx].1.as_str())
    }

    /// Iterate over `(alias, bucket)` pairs in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// Number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no aliases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_alias(alias: &str, bucket: &str) -> GatewayResult<()> {
    let reason = if alias.is_empty() {
        "alias must not be empty"
    } else if alias.contains('/') {
        "alias must not contain '/'"
    } else if alias.starts_with('_') {
        "aliases starting with '_' are reserved for gateway endpoints"
    } else if bucket.is_empty() {
        "bucket name must not be empty"
    } else {
        return Ok(());
    };

    Err(GatewayError::InvalidAlias {
        alias: alias.to_owned(),
        reason,
    })
}

/// The object a request path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRoute<'a> {
    /// The alias that matched.
    pub alias: &'a str,
    /// Bucket the alias maps to.
    pub bucket: &'a str,
    /// Object key inside the bucket.
    pub key: String,
}

impl fmt::Display for ObjectRoute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Maps request paths to bucket objects.
#[derive(Debug, Clone)]
pub struct AliasRouter {
    table: AliasTable,
    index_document: Option<String>,
}

impl AliasRouter {
    /// Create a router.
    ///
    /// When `index_document` is `Some`, keys ending in an empty segment
    /// (`""`, `sub/`) are resolved to that document name.
    #[must_use]
    pub fn new(table: AliasTable, index_document: Option<String>) -> Self {
        Self {
            table,
            index_document,
        }
    }

    /// The underlying alias table.
    #[must_use]
    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    /// The index document name, if index-document mode is enabled.
    #[must_use]
    pub fn index_document(&self) -> Option<&str> {
        self.index_document.as_deref()
    }

    /// Resolve a request path, or `None` if no alias matches.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<ObjectRoute<'_>> {
        let (alias, bucket) = self.table.iter().find(|(alias, _)| {
            path.strip_prefix('/')
                .is_some_and(|rest| rest.starts_with(alias))
        })?;

        let mut key = derive_object_key(path, alias);
        if let Some(doc) = &self.index_document {
            key = replace_empty_base(&key, doc);
        }

        trace!(path, alias, bucket, key = %key, "resolved alias route");
        Some(ObjectRoute { alias, bucket, key })
    }
}

/// Derive the object key by removing the first occurrence of `/alias/`.
///
/// If `/alias/` does not occur, the path is returned unchanged.
#[must_use]
pub fn derive_object_key(path: &str, alias: &str) -> String {
    path.replacen(&format!("/{alias}/"), "", 1)
}

/// Replace an empty final `/`-delimited segment with `replacement`.
///
/// `""` becomes `replacement` and `sub/` becomes `sub/replacement`. Keys whose
/// last segment is non-empty are returned unchanged.
#[must_use]
pub fn replace_empty_base(key: &str, replacement: &str) -> String {
    if key.is_empty() || key.ends_with('/') {
        format!("{key}{replacement}")
    } else {
        key.to_owned()
    }
}
