use serde::{Deserialize, Serialize};

/// A note owned by the remote service.
///
/// The identifier is assigned by the server. Some backends name it `_id`,
/// so both spellings are accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Input for creating a note.
///
/// Forwarded to the server exactly as given, empty fields included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteInput {
    pub title: String,
    pub content: String,
}

impl CreateNoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}
