//! `agora-core`: shared building blocks for the Agora shop/forum backend.
//!
//! This crate contains identifiers and the domain error model only (no IO).

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{BoardId, RoleId, SessionId, UserId};
