use std::sync::Arc;

use reqwest::{multipart::Form, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::AuthenticatedUser,
    error::ApiError,
    protocol::{LoginRequest, LoginResponse},
};
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

pub mod access;
pub mod attachments;
pub mod error;
pub mod labels;
pub mod ordering;
pub mod session;
pub mod users;

pub use error::{ClientError, Result};
pub use ordering::{
    CollectionBackend, OrderedCollection, OrderedCollectionSync, PersistReport, SyncPhase,
};
pub use session::{Session, SessionStore};

const LOGIN_PATH: &str = "auth/login";
const CURRENT_USER_PATH: &str = "users/me";

/// HTTP client for the dashboard backend.
///
/// Holds the bearer token and the one live [`Session`]; both are replaced only
/// by [`login`](Self::login), [`restore`](Self::restore),
/// [`reload_session`](Self::reload_session) and [`logout`](Self::logout), or
/// cleared when the backend answers `401`.
pub struct DashboardClient {
    http: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
    sessions: SessionStore,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url)?,
            token: RwLock::new(None),
            sessions: SessionStore::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Session>> {
        let response: LoginResponse = self
            .post_json(
                LOGIN_PATH,
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        let session = self.commit(response.token, response.user).await;
        info!(user_id = session.user_id().0, "session: established");
        Ok(session)
    }

    /// Re-establishes a session from a previously issued token.
    ///
    /// The token is only kept once the backend has accepted it. A rejected
    /// token (`401`) ends any live session; other failures leave it as it was.
    pub async fn restore(&self, token: impl Into<String>) -> Result<Arc<Session>> {
        let token = token.into();
        let user = self.fetch_user_with(&token).await?;
        let session = self.commit(token, user).await;
        info!(user_id = session.user_id().0, "session: restored");
        Ok(session)
    }

    /// Re-reads the current user after its grants changed.
    pub async fn reload_session(&self) -> Result<Arc<Session>> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or(ClientError::NotAuthenticated)?;
        let user = self.fetch_user_with(&token).await?;
        let session = self.commit(token, user).await;
        info!(user_id = session.user_id().0, "session: grants reloaded");
        Ok(session)
    }

    pub async fn logout(&self) {
        self.token.write().await.take();
        if self.sessions.clear().await {
            info!("session: logged out");
        }
    }

    pub async fn current_session(&self) -> Option<Arc<Session>> {
        self.sessions.current().await
    }

    pub async fn session(&self) -> Result<Arc<Session>> {
        self.sessions
            .current()
            .await
            .ok_or(ClientError::NotAuthenticated)
    }

    async fn fetch_user_with(&self, token: &str) -> Result<AuthenticatedUser> {
        let url = self.endpoint(CURRENT_USER_PATH)?;
        Ok(self
            .send_as(self.http.get(url), Some(token))
            .await?
            .json()
            .await?)
    }

    /// Installs the token and its session together.
    async fn commit(&self, token: String, user: AuthenticatedUser) -> Arc<Session> {
        let mut slot = self.token.write().await;
        let session = self.sessions.install(Session::from_user(user)).await;
        *slot = Some(token);
        session
    }

    async fn invalidate(&self, reason: &str) {
        self.token.write().await.take();
        if self.sessions.clear().await {
            info!(reason, "session: invalidated");
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.token.read().await.clone();
        self.send_as(request, token.as_deref()).await
    }

    async fn send_as(&self, request: RequestBuilder, token: Option<&str>) -> Result<Response> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            ApiError::from_status(status.as_u16(), message)
        });
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate("token rejected by backend").await;
        } else {
            warn!(status = status.as_u16(), error = %error, "http: request rejected");
        }
        Err(ClientError::Api(error))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        Ok(self.send(self.http.get(url)).await?.json().await?)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        Ok(self.send(self.http.post(url).json(body)).await?.json().await?)
    }

    /// PUT whose response body is not consumed.
    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.endpoint(path)?;
        self.send(self.http.put(url).json(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let url = self.endpoint(path)?;
        Ok(self
            .send(self.http.post(url).multipart(form))
            .await?
            .json()
            .await?)
    }
}

/// Makes the base URL end in exactly one `/` so relative paths join below it.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    Ok(Url::parse(&format!("{trimmed}/"))?)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
