//! Platform - shared infrastructure utilities
//!
//! Cross-domain building blocks with no business logic of their own:
//! - `crypto` - hashing, random material, hex helpers
//! - `eth` - EIP-191 personal-sign signature recovery
//! - `client` - caller identification from request headers
//! - `rate_limit` - rate limiting primitives

pub mod client;
pub mod crypto;
pub mod eth;
pub mod rate_limit;
