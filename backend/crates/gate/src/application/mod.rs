//! Application layer - use cases and configuration

pub mod config;
pub mod credential;
pub mod gate_access;
pub mod issue_nonce;
pub mod rate_limit;
pub mod submit_gate;
pub mod verify_legacy;
pub mod verify_siwe;
