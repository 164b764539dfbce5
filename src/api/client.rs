//! HTTP client for the notes API.
//!
//! Every request goes to one configured base address. When the session store
//! holds a token it is sent both as a bearer credential and as a `token`
//! cookie; the server decides whether a route needed it. Failures are folded
//! into [`ApiError`] and never retried here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, COOKIE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::session::SessionStore;

/// Message used when a failed response carries none of its own.
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

/// Message shown when a protected call is refused.
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Session expired or invalid token. Please log in again.";

/// Name of the cookie carrying the session token.
const TOKEN_COOKIE: &str = "token";

/// Classified request failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 or 403. On a protected call the token is missing, invalid or
    /// expired; on login or register the credentials were refused.
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("token or credentials refused"))]
    Unauthorized { message: Option<String> },

    #[error("Server rejected request ({status}): {message}")]
    ServerRejected { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request body could not be serialized; nothing was sent.
    #[error("Could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } => message.as_deref(),
            Self::ServerRejected { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Text suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { message } => message
                .clone()
                .unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string()),
            Self::ServerRejected { message, .. } => message.clone(),
            Self::Network(e) => e.to_string(),
            Self::Encode(_) => self.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    session: SessionStore,
    cookies: Arc<Jar>,
    client: Client,
}

impl ApiClient {
    /// Create a client for `config.api_url`, reading tokens from `session`.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(cookies.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
            cookies,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Perform one request and decode the JSON reply.
    ///
    /// An empty success body decodes as `null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.send(method, path, body).await.map(|(_, value)| value)
    }

    /// GET `path` and decode the reply as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let (status, value) = self.send(Method::GET, path, None).await?;
        decode(status, value)
    }

    /// Send `body` with `method` and decode the reply as `T`.
    pub async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        let (status, value) = self.send(method, path, Some(&body)).await?;
        decode(status, value)
    }

    /// DELETE `path`, ignoring whatever the server sends back on success.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, path, None).await.map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(StatusCode, Value), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, path);

        let mut req = self.client.request(method.clone(), &url);
        if let Some(token) = self.session.get().filter(|t| !t.is_empty()) {
            req = req.bearer_auth(&token);
            // An explicit Cookie header stops reqwest adding jar cookies, so merge them here.
            let jar = Url::parse(&url).ok().and_then(|u| self.cookies.cookies(&u));
            let jar = jar.as_ref().and_then(|h| h.to_str().ok());
            if let Ok(cookie) = HeaderValue::from_str(&cookie_header(jar, &token)) {
                req = req.header(COOKIE, cookie);
            }
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, path, e);
            ApiError::Network(e)
        })?;
        self.handle_response(&method, path, response).await
    }

    /// Convert a response into a JSON value or a classified failure.
    async fn handle_response(
        &self,
        method: &Method,
        path: &str,
        response: reqwest::Response,
    ) -> Result<(StatusCode, Value), ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok((status, Value::Null));
            }
            return serde_json::from_str(&body)
                .map(|value| (status, value))
                .map_err(|e| ApiError::ServerRejected {
                    status,
                    message: format!("Invalid response body: {}", e),
                });
        }

        let error = classify(status, &body);
        tracing::warn!("{} {} -> {}", method, path, error);
        Err(error)
    }
}

/// Map a non-success status and its body to an [`ApiError`].
fn classify(status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
            message: server_message(body),
        },
        _ => ApiError::ServerRejected {
            status,
            message: server_message(body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        },
    }
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Jar cookies plus the session token, with the session's token winning.
fn cookie_header(jar: Option<&str>, token: &str) -> String {
    let prefix = format!("{}=", TOKEN_COOKIE);
    let mut pairs: Vec<String> = jar
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty() && !pair.starts_with(&prefix))
        .map(str::to_string)
        .collect();
    pairs.push(format!("{}{}", prefix, token));
    pairs.join("; ")
}

fn decode<T: DeserializeOwned>(status: StatusCode, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::ServerRejected {
        status,
        message: format!("Unexpected response shape: {}", e),
    })
}
