//! Domain layer - entities, value objects, message formats, repository traits

pub mod entities;
pub mod legacy;
pub mod repository;
pub mod siwe;
pub mod value_objects;
