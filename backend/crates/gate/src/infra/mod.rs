//! Infrastructure layer - adapters over the four external systems

pub mod content;
pub mod kv;
pub mod postgres;
pub mod rpc;
pub mod webhook;
