//! Auth gateway: trade credentials for a session token.
//!
//! The gateway does not touch the session store. Storing the returned token
//! is the caller's job.

use reqwest::Method;

use super::client::{ApiClient, ApiError};
use crate::models::{AuthResponse, Credentials, Registration, Session};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

#[derive(Debug, Clone)]
pub struct AuthGateway {
    api: ApiClient,
}

impl AuthGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let credentials = Credentials::new(email, password);
        let response: AuthResponse = self
            .api
            .send_json(Method::POST, LOGIN_PATH, &credentials)
            .await?;
        tracing::info!("Logged in as {}", email);
        Ok(response.into())
    }

    pub async fn register(&self, registration: &Registration) -> Result<Session, ApiError> {
        let response: AuthResponse = self
            .api
            .send_json(Method::POST, REGISTER_PATH, registration)
            .await?;
        tracing::info!("Registered {}", registration.credentials.email);
        Ok(response.into())
    }
}
