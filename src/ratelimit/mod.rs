//! Rate limit bucket key derivation.

mod batch;
mod category;
mod key;
mod request;

pub use batch::{derive_batch, parse_batch, KeyRequest};
pub use category::LimitCategory;
pub use key::{derive_key, BucketKey, Identifier, KeySource, ANONYMOUS_IDENTIFIER, BEARER_PREFIX};
pub use request::{bucket_key_for, KeyInputs, RequestParts};
