//! Bulk key derivation for recorded requests.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::key::BucketKey;
use super::request::RequestParts;
use crate::config::KeyConfig;
use crate::error::{KeyError, Result};

/// A request paired with the limit category it should be keyed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRequest {
    /// Category label
    pub category: String,

    /// The request itself
    #[serde(flatten)]
    pub request: RequestParts,
}

/// Parse a YAML (or JSON) list of key requests.
pub fn parse_batch(input: &str) -> Result<Vec<KeyRequest>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str(input)
        .map_err(|e| KeyError::Parse(format!("Failed to parse requests: {}", e)))
}

/// Derive a bucket key for each request, in order.
///
/// Fails on the first category the config does not accept.
pub fn derive_batch(config: &KeyConfig, requests: &[KeyRequest]) -> Result<Vec<BucketKey>> {
    let mut keys = Vec::with_capacity(requests.len());

    for (index, entry) in requests.iter().enumerate() {
        let category = config.resolve_category(&entry.category)?;
        let key = category.derive(&entry.request);

        if !entry.request.attributes.is_empty() {
            trace!(
                index = index,
                attributes = entry.request.attributes.len(),
                "Request carries downstream attributes"
            );
        }
        debug!(
            index = index,
            category = %category,
            source = %key.source(),
            "Derived bucket key"
        );

        keys.push(key);
    }

    Ok(keys)
}
