mod auth;
mod client;
mod notes;

pub use auth::AuthGateway;
pub use client::{ApiClient, ApiError, FALLBACK_MESSAGE, SESSION_EXPIRED_MESSAGE};
pub use notes::NoteRepository;
