//! Request views consumed by key derivation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::key::{derive_key, BucketKey};

/// The wire-level request values a bucket key may depend on.
///
/// Implementors expose exactly these two values; anything else a request
/// carries is out of reach of key derivation.
pub trait KeyInputs {
    /// Raw `Authorization` header value, if present.
    fn authorization(&self) -> Option<&str>;

    /// Resolved client network address, if known.
    fn network_address(&self) -> Option<&str>;
}

impl<'a> KeyInputs for (Option<&'a str>, Option<&'a str>) {
    fn authorization(&self) -> Option<&str> {
        self.0
    }

    fn network_address(&self) -> Option<&str> {
        self.1
    }
}

impl<T: KeyInputs + ?Sized> KeyInputs for &T {
    fn authorization(&self) -> Option<&str> {
        (**self).authorization()
    }

    fn network_address(&self) -> Option<&str> {
        (**self).network_address()
    }
}

/// Derive the bucket key for any request exposing [`KeyInputs`].
pub fn bucket_key_for<R: KeyInputs + ?Sized>(request: &R, category: &str) -> BucketKey {
    derive_key(request.authorization(), request.network_address(), category)
}

/// A framework-independent view of an incoming request.
///
/// `attributes` holds values attached by later pipeline stages (for example an
/// authenticated user id). They travel with the request but never affect its
/// bucket key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParts {
    /// Raw `Authorization` header value
    #[serde(default)]
    pub authorization: Option<String>,

    /// Client network address
    #[serde(default, alias = "address")]
    pub network_address: Option<String>,

    /// Attributes populated downstream
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl RequestParts {
    /// Create an empty request view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Authorization` header value.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Set the client network address.
    pub fn with_network_address(mut self, addr: impl Into<String>) -> Self {
        self.network_address = Some(addr.into());
        self
    }

    /// Attach a downstream attribute.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Derive this request's bucket key for `category`.
    pub fn bucket_key(&self, category: &str) -> BucketKey {
        bucket_key_for(self, category)
    }
}

impl KeyInputs for RequestParts {
    fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    fn network_address(&self) -> Option<&str> {
        self.network_address.as_deref()
    }
}
