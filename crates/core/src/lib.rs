//! `bizops-core`: shared domain primitives.
//!
//! Identifiers and the domain error model. No infrastructure concerns.

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{ServiceUserId, TicketId, UserId};
