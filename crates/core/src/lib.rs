//! `freightdesk-core`: shared domain primitives for the freight back office.
//!
//! This crate contains **pure domain** primitives (no transport concerns).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{sort_by_id, Entity};
pub use error::DomainError;
pub use id::{EntityId, IdRef};
