//! Domain models for the notes client.
//!
//! # Core Concepts
//!
//! - [`Note`]: A server-owned record. The client only ever holds copies of
//!   what the last list call returned.
//! - [`Session`]: The client's belief about whether it holds a usable token.
//! - [`Credentials`] and [`Registration`]: Ephemeral auth payloads, never persisted.

mod auth;
mod note;

pub use auth::*;
pub use note::*;
