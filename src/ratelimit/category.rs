//! Limit category labels.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::key::BucketKey;
use super::request::{bucket_key_for, KeyInputs};
use crate::error::{KeyError, Result};

/// Label for an independent rate limit pool, e.g. `comments` or `posts`.
///
/// Always non-empty. The label is used verbatim as the middle segment of the
/// bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LimitCategory(String);

impl LimitCategory {
    /// Create a category, rejecting the empty label.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(KeyError::InvalidCategory(label));
        }
        Ok(Self(label))
    }

    /// The raw label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the bucket key for `request` in this category.
    pub fn derive<R: KeyInputs + ?Sized>(&self, request: &R) -> BucketKey {
        bucket_key_for(request, &self.0)
    }
}

impl TryFrom<String> for LimitCategory {
    type Error = KeyError;

    fn try_from(label: String) -> Result<Self> {
        Self::new(label)
    }
}

impl From<LimitCategory> for String {
    fn from(category: LimitCategory) -> Self {
        category.0
    }
}

impl AsRef<str> for LimitCategory {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LimitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
