//! Note repository: list, create and delete against `/auth/notes`.
//!
//! Nothing is cached here. After a create or delete the caller re-lists to
//! get the server's view; see [`crate::app::NotesApp`].

use reqwest::Method;

use super::client::{ApiClient, ApiError};
use crate::models::{CreateNoteInput, Note};

const NOTES_PATH: &str = "/auth/notes";

#[derive(Debug, Clone)]
pub struct NoteRepository {
    api: ApiClient,
}

impl NoteRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch every note for the current user, in server order.
    pub async fn list(&self) -> Result<Vec<Note>, ApiError> {
        self.api.get_json(NOTES_PATH).await
    }

    /// Create a note. Empty fields are sent as-is.
    pub async fn create(&self, title: &str, content: &str) -> Result<Note, ApiError> {
        let input = CreateNoteInput::new(title, content);
        let note: Note = self.api.send_json(Method::POST, NOTES_PATH, &input).await?;
        tracing::info!("Created note {}", note.id);
        Ok(note)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete(&note_path(id)).await?;
        tracing::info!("Deleted note {}", id);
        Ok(())
    }
}

/// Ids are opaque, so they are percent-encoded into a single path segment.
fn note_path(id: &str) -> String {
    format!("{}/{}", NOTES_PATH, urlencoding::encode(id))
}
