//! Ratekey - Rate Limit Bucket Key Derivation
//!
//! This crate maps an incoming request to the bucket key a rate limiting
//! store counts against. Callers presenting a `Bearer` credential are keyed
//! by that credential, everyone else by network address, and requests with
//! neither share the `anonymous` bucket.

pub mod config;
pub mod error;
pub mod ratelimit;
