//! Presentation layer - HTTP handlers, DTOs, router

pub mod dto;
pub mod handlers;
pub mod router;
