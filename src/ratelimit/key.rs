//! Bucket key derivation.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Authorization scheme prefix recognised as a caller credential.
///
/// Matched case-sensitively, including the single trailing space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Identifier used when a request carries neither a bearer token nor an address.
pub const ANONYMOUS_IDENTIFIER: &str = "anonymous";

/// Which branch of the resolution order produced an identifier.
///
/// Safe to log; unlike the identifier it never contains the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySource {
    /// Taken from an `Authorization: Bearer` header
    Bearer,
    /// Taken from the client network address
    Address,
    /// Neither was available
    Anonymous,
}

impl KeySource {
    /// Short lowercase label for this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Bearer => "bearer",
            KeySource::Address => "address",
            KeySource::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller-specific portion of a bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Everything after `"Bearer "`, verbatim. May be empty.
    Bearer(String),
    /// The client network address as supplied.
    Address(String),
    /// Shared bucket for requests with no usable identity.
    Anonymous,
}

impl Identifier {
    /// Resolve the identifier from the wire-level inputs.
    ///
    /// Order: bearer token, then non-empty network address, then anonymous.
    pub fn resolve(authorization: Option<&str>, network_address: Option<&str>) -> Self {
        if let Some(token) = authorization.and_then(|h| h.strip_prefix(BEARER_PREFIX)) {
            return Identifier::Bearer(token.to_string());
        }

        match network_address {
            Some(addr) if !addr.is_empty() => Identifier::Address(addr.to_string()),
            _ => Identifier::Anonymous,
        }
    }

    /// The identifier segment as it appears in the key.
    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Bearer(token) => token,
            Identifier::Address(addr) => addr,
            Identifier::Anonymous => ANONYMOUS_IDENTIFIER,
        }
    }

    /// The branch that produced this identifier.
    pub fn source(&self) -> KeySource {
        match self {
            Identifier::Bearer(_) => KeySource::Bearer,
            Identifier::Address(_) => KeySource::Address,
            Identifier::Anonymous => KeySource::Anonymous,
        }
    }
}

/// A key that uniquely identifies a rate limit bucket.
///
/// Rendered as `rl:{category}:{identifier}`. Colons inside the identifier are
/// not escaped; the identifier is always the suffix after the second colon.
///
/// Equality and hashing follow the rendered string, so any two keys a store
/// would treat as one bucket compare equal. This includes a bearer token that
/// happens to equal an address, or a category containing a colon.
#[derive(Debug, Clone)]
pub struct BucketKey {
    category: String,
    identifier: Identifier,
}

impl BucketKey {
    /// Leading segment of every rendered key.
    pub const PREFIX: &'static str = "rl";

    /// The limit category this key belongs to.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The resolved caller identifier.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Shorthand for `self.identifier().source()`.
    pub fn source(&self) -> KeySource {
        self.identifier.source()
    }

    /// Render the key for use by a counting store.
    pub fn into_string(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            Self::PREFIX,
            self.category,
            self.identifier.as_str()
        )
    }
}

impl PartialEq for BucketKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for BucketKey {}

impl Hash for BucketKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl From<BucketKey> for String {
    fn from(key: BucketKey) -> Self {
        key.into_string()
    }
}

/// Derive the bucket key for a request.
///
/// Only the raw `Authorization` header and the client address are consulted,
/// so nothing attached to the request by later middleware can influence the
/// result. Never fails and has no side effects.
pub fn derive_key(
    authorization: Option<&str>,
    network_address: Option<&str>,
    category: &str,
) -> BucketKey {
    BucketKey {
        category: category.to_string(),
        identifier: Identifier::resolve(authorization, network_address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(authorization: Option<&str>, address: Option<&str>, category: &str) -> String {
        derive_key(authorization, address, category).to_string()
    }

    #[test]
    fn test_bearer_token_used_as_identifier() {
        assert_eq!(
            key(Some("Bearer abc123"), Some("10.0.0.1"), "posts"),
            "rl:posts:abc123"
        );
    }

    #[test]
    fn test_bearer_token_without_address() {
        assert_eq!(key(Some("Bearer abc123"), None, "posts"), "rl:posts:abc123");
    }

    #[test]
    fn test_bearer_token_ignores_empty_address() {
        assert_eq!(
            key(Some("Bearer abc123"), Some(""), "posts"),
            "rl:posts:abc123"
        );
    }

    #[test]
    fn test_production_api_key_example() {
        assert_eq!(
            key(
                Some("Bearer moltbook_sk_8Xn6T1MLuY_IdgrayuN65FQ_L0AdLt2C"),
                Some("172.17.0.1"),
                "comments"
            ),
            "rl:comments:moltbook_sk_8Xn6T1MLuY_IdgrayuN65FQ_L0AdLt2C"
        );
    }

    #[test]
    fn test_no_header_falls_back_to_address() {
        assert_eq!(
            key(None, Some("192.168.1.7"), "requests"),
            "rl:requests:192.168.1.7"
        );
    }

    #[test]
    fn test_ipv6_address_passed_through() {
        assert_eq!(key(None, Some("::1"), "requests"), "rl:requests:::1");
    }

    #[test]
    fn test_no_header_no_address_is_anonymous() {
        assert_eq!(key(None, None, "requests"), "rl:requests:anonymous");
    }

    #[test]
    fn test_empty_address_is_anonymous() {
        assert_eq!(key(None, Some(""), "requests"), "rl:requests:anonymous");
    }

    #[test]
    fn test_bare_bearer_falls_back_to_address() {
        assert_eq!(
            key(Some("Bearer"), Some("10.1.1.1"), "posts"),
            "rl:posts:10.1.1.1"
        );
    }

    #[test]
    fn test_bare_bearer_without_address_is_anonymous() {
        assert_eq!(key(Some("Bearer"), None, "posts"), "rl:posts:anonymous");
    }

    #[test]
    fn test_lowercase_scheme_falls_back() {
        assert_eq!(
            key(Some("bearer token"), Some("10.1.1.1"), "posts"),
            "rl:posts:10.1.1.1"
        );
        assert_eq!(
            key(Some("BEARER token"), None, "posts"),
            "rl:posts:anonymous"
        );
    }

    #[test]
    fn test_missing_space_falls_back() {
        assert_eq!(
            key(Some("BearerX token"), Some("10.1.1.1"), "posts"),
            "rl:posts:10.1.1.1"
        );
        assert_eq!(
            key(Some("BearerUppercase token"), Some("10.1.1.1"), "posts"),
            "rl:posts:10.1.1.1"
        );
    }

    #[test]
    fn test_tab_separator_falls_back() {
        assert_eq!(
            key(Some("Bearer\ttoken"), Some("10.1.1.1"), "posts"),
            "rl:posts:10.1.1.1"
        );
    }

    #[test]
    fn test_other_schemes_fall_back() {
        assert_eq!(
            key(Some("Basic dXNlcjpwYXNz"), Some("10.1.1.1"), "posts"),
            "rl:posts:10.1.1.1"
        );
        assert_eq!(key(Some("Token abc"), None, "posts"), "rl:posts:anonymous");
    }

    #[test]
    fn test_leading_whitespace_in_header_falls_back() {
        assert_eq!(
            key(Some(" Bearer abc"), Some("10.1.1.1"), "posts"),
            "rl:posts:10.1.1.1"
        );
    }

    #[test]
    fn test_extra_space_preserved() {
        assert_eq!(
            key(Some("Bearer  x"), Some("10.1.1.1"), "comments"),
            "rl:comments: x"
        );
    }

    #[test]
    fn test_trailing_whitespace_preserved() {
        let derived = derive_key(Some("Bearer abc \t"), None, "posts");
        assert_eq!(
            derived.identifier(),
            &Identifier::Bearer("abc \t".to_string())
        );
        assert_eq!(derived.to_string(), "rl:posts:abc \t");
    }

    #[test]
    fn test_empty_token_yields_empty_identifier() {
        let derived = derive_key(Some("Bearer "), Some("10.1.1.1"), "posts");
        assert_eq!(derived.source(), KeySource::Bearer);
        assert_eq!(derived.to_string(), "rl:posts:");
    }

    #[test]
    fn test_long_token_not_truncated() {
        let token = "k".repeat(4096);
        let header = format!("Bearer {}", token);
        let derived = derive_key(Some(&header), None, "posts");
        assert_eq!(derived.identifier().as_str().len(), 4096);
        assert_eq!(derived.to_string(), format!("rl:posts:{}", token));
    }

    #[test]
    fn test_token_with_colons_passed_through() {
        assert_eq!(
            key(Some("Bearer user:secret:v2"), None, "posts"),
            "rl:posts:user:secret:v2"
        );
    }

    #[test]
    fn test_token_shape_not_validated() {
        assert_eq!(
            key(Some("Bearer Bearer x"), None, "posts"),
            "rl:posts:Bearer x"
        );
        assert_eq!(key(Some("Bearer !@#$%"), None, "posts"), "rl:posts:!@#$%");
    }

    #[test]
    fn test_literal_anonymous_token_is_bearer() {
        let derived = derive_key(Some("Bearer anonymous"), None, "posts");
        assert_eq!(derived.source(), KeySource::Bearer);
        assert_eq!(derived.to_string(), "rl:posts:anonymous");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let first = derive_key(Some("Bearer abc"), Some("10.0.0.1"), "posts");
        let second = derive_key(Some("Bearer abc"), Some("10.0.0.1"), "posts");
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_categories_produce_distinct_keys() {
        let posts = derive_key(Some("Bearer abc"), None, "posts");
        let comments = derive_key(Some("Bearer abc"), None, "comments");
        assert_ne!(posts, comments);
        assert_ne!(posts.to_string(), comments.to_string());
    }

    #[test]
    fn test_equality_follows_rendered_key() {
        let bearer = derive_key(Some("Bearer 10.0.0.1"), None, "posts");
        let address = derive_key(None, Some("10.0.0.1"), "posts");
        assert_ne!(bearer.source(), address.source());
        assert_eq!(bearer, address);
    }

    #[test]
    fn test_colon_in_category_matches_rendered_key() {
        use std::collections::HashSet;

        let split_category = derive_key(Some("Bearer c"), None, "a:b");
        let split_token = derive_key(Some("Bearer b:c"), None, "a");
        assert_eq!(split_category.to_string(), "rl:a:b:c");
        assert_eq!(split_token.to_string(), "rl:a:b:c");
        assert_eq!(split_category, split_token);

        let buckets: HashSet<BucketKey> = [split_category, split_token].into_iter().collect();
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn test_identifier_sources() {
        assert_eq!(
            Identifier::resolve(Some("Bearer t"), Some("a")).source(),
            KeySource::Bearer
        );
        assert_eq!(
            Identifier::resolve(Some("Basic t"), Some("a")).source(),
            KeySource::Address
        );
        assert_eq!(
            Identifier::resolve(None, None).source(),
            KeySource::Anonymous
        );
    }

    #[test]
    fn test_key_source_labels() {
        assert_eq!(KeySource::Bearer.to_string(), "bearer");
        assert_eq!(KeySource::Address.to_string(), "address");
        assert_eq!(KeySource::Anonymous.to_string(), "anonymous");
    }

    #[test]
    fn test_bucket_key_accessors() {
        let derived = derive_key(None, Some("10.0.0.9"), "requests");
        assert_eq!(derived.category(), "requests");
        assert_eq!(derived.identifier().as_str(), "10.0.0.9");
        let rendered: String = derived.into();
        assert_eq!(rendered, "rl:requests:10.0.0.9");
    }

    #[test]
    fn test_bucket_key_usable_as_map_key() {
        use std::collections::HashMap;

        let mut counts: HashMap<BucketKey, u32> = HashMap::new();
        for _ in 0..3 {
            let key = derive_key(Some("Bearer abc"), Some("10.0.0.1"), "posts");
            *counts.entry(key).or_default() += 1;
        }
        let key = derive_key(Some("Bearer abc"), Some("10.0.0.2"), "posts");
        *counts.entry(key).or_default() += 1;

        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&derive_key(Some("Bearer abc"), None, "posts")], 4);
    }

    #[tokio::test]
    async fn test_concurrent_derivation() {
        let mut handles = Vec::new();
        for i in 0..64 {
            handles.push(tokio::spawn(async move {
                let header = format!("Bearer token_{}", i % 8);
                derive_key(Some(&header), Some("10.0.0.1"), "requests").into_string()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let key = handle.await.unwrap();
            assert_eq!(key, format!("rl:requests:token_{}", i % 8));
        }
    }
}
