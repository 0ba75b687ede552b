use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::error::ApiError;
use super::models::{LookupResponse, Meta, ReloadResponse, SuggestResponse};

/// The backend calls the search controller depends on.
///
/// `ApiClient` talks HTTP; tests substitute in-memory implementations.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn meta(&self) -> Result<Meta, ApiError>;

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<String>, ApiError>;

    async fn lookup(&self, name: &str) -> Result<LookupResponse, ApiError>;

    async fn reload(&self) -> Result<ReloadResponse, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    password: Option<String>,
    /// Set once the login form has been accepted
    session: Arc<OnceCell<()>>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        password: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
            password,
            session: Arc::new(OnceCell::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in with the configured password, once per client. A client without
    /// a password assumes the server is open.
    async fn ensure_session(&self) -> Result<(), ApiError> {
        let Some(password) = self.password.as_deref() else {
            return Ok(());
        };

        self.session
            .get_or_try_init(|| async {
                debug!(target: "api", "Logging in to {}", self.base_url);
                let response = self
                    .client
                    .post(self.url("/login"))
                    .form(&[("password", password)])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status().as_u16();
                    return Err(ApiError::status(status, "Login rejected: incorrect password"));
                }

                info!(target: "api", "Authenticated against {}", self.base_url);
                Ok(())
            })
            .await
            .map(|_| ())
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(target: "api", "{} -> {}", path, status);
            return Err(ApiError::status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.ensure_session().await?;
        let response = self.client.get(self.url(path)).query(query).send().await?;
        self.read_json(path, response).await
    }
}

#[async_trait]
impl LookupService for ApiClient {
    async fn meta(&self) -> Result<Meta, ApiError> {
        self.get_json("/api/meta", &[]).await
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<String>, ApiError> {
        let response: SuggestResponse = self
            .get_json(
                "/api/suggest",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(response.options)
    }

    async fn lookup(&self, name: &str) -> Result<LookupResponse, ApiError> {
        self.get_json("/api/lookup", &[("name", name.to_string())]).await
    }

    async fn reload(&self) -> Result<ReloadResponse, ApiError> {
        self.ensure_session().await?;
        let response = self.client.post(self.url("/api/reload")).send().await?;
        self.read_json("/api/reload", response).await
    }
}
