//! The adapter between the data-access layer and whatever presents it.
//!
//! [`NotesApp`] owns the transient note list and reacts to results: it stores
//! tokens after login, re-lists after every mutation, and drops the session
//! when a protected call comes back `Unauthorized`. It never navigates; it
//! reports the [`Route`] the view should show instead.

use thiserror::Error;

use crate::api::{
    ApiClient, ApiError, AuthGateway, NoteRepository, FALLBACK_MESSAGE, SESSION_EXPIRED_MESSAGE,
};
use crate::config::ClientConfig;
use crate::models::{Note, Registration, Session};
use crate::session::{AuthState, SessionError, SessionStore};

/// Logical destinations a view can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Notes,
    Login,
    Register,
}

/// Errors surfaced by [`NotesApp`].
#[derive(Debug, Error)]
pub enum AppError {
    /// A protected call was refused; the session has been cleared.
    #[error("Session expired or invalid token")]
    SessionExpired(#[source] ApiError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AppError {
    /// True when the view should send the user back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::SessionExpired(_) => SESSION_EXPIRED_MESSAGE.to_string(),
            // Refused credentials on login or register.
            Self::Api(ApiError::Unauthorized { message }) => message
                .clone()
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            Self::Api(e) => e.user_message(),
            Self::Session(e) => e.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct NotesApp {
    session: SessionStore,
    auth: AuthGateway,
    repo: NoteRepository,
    notes: Vec<Note>,
}

impl NotesApp {
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let api = ApiClient::new(config, session.clone())?;
        Ok(Self {
            session,
            auth: AuthGateway::new(api.clone()),
            repo: NoteRepository::new(api),
            notes: Vec::new(),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    /// Guard for the router: anonymous users only reach login and register.
    pub fn route(&self, requested: Route) -> Route {
        match (self.state(), requested) {
            (AuthState::Anonymous, Route::Notes) => Route::Login,
            (_, route) => route,
        }
    }

    /// The notes from the most recent successful list call.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session, AppError> {
        let session = self.auth.login(email, password).await?;
        self.store(&session)?;
        Ok(session)
    }

    pub async fn register(&mut self, registration: &Registration) -> Result<Session, AppError> {
        let session = self.auth.register(registration).await?;
        self.store(&session)?;
        Ok(session)
    }

    pub fn logout(&mut self) -> Result<(), AppError> {
        self.notes.clear();
        self.session.clear()?;
        Ok(())
    }

    /// Re-fetch the list from the server and replace the local copy.
    pub async fn refresh(&mut self) -> Result<&[Note], AppError> {
        let result = self.repo.list().await;
        let notes = self.guard(result)?;
        self.notes = notes;
        Ok(&self.notes)
    }

    /// Create a note, then re-fetch.
    pub async fn add_note(&mut self, title: &str, content: &str) -> Result<&[Note], AppError> {
        let result = self.repo.create(title, content).await;
        self.guard(result)?;
        self.refresh().await
    }

    /// Delete a note, then re-fetch.
    pub async fn delete_note(&mut self, id: &str) -> Result<&[Note], AppError> {
        let result = self.repo.delete(id).await;
        self.guard(result)?;
        self.refresh().await
    }

    fn store(&self, session: &Session) -> Result<(), AppError> {
        match session.token() {
            Some(token) if !token.is_empty() => self.session.set(token)?,
            _ => tracing::warn!("Authentication succeeded but no token was returned"),
        }
        Ok(())
    }

    /// Drop the session and cached notes when the server refuses the token.
    fn guard<T>(&mut self, result: Result<T, ApiError>) -> Result<T, AppError> {
        match result {
            Err(e @ ApiError::Unauthorized { .. }) => {
                self.notes.clear();
                // The token is already gone from memory even if the file write failed.
                if let Err(err) = self.session.clear() {
                    tracing::error!("Failed to clear persisted session: {}", err);
                }
                Err(AppError::SessionExpired(e))
            }
            other => other.map_err(AppError::from),
        }
    }
}
