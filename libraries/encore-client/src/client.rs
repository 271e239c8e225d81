//! Main Encore backend client.

use crate::auth::AuthClient;
use crate::error::{ClientError, Result};
use crate::rest::RestClient;
use crate::storage::{self, StorageClient};
use crate::types::ClientConfig;
use encore_core::User;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// Client for the hosted backend.
///
/// Holds the session tokens: after [`sign_in`](Self::sign_in) every request
/// carries the access token as bearer, before it the API key stands in.
///
/// # Example
///
/// ```ignore
/// use encore_client::{ClientConfig, EncoreClient};
///
/// let client = EncoreClient::new(ClientConfig::new("https://abc.example.co", "anon-key"))?;
/// let user = client.sign_in("listener@encore.fm", "secret").await?;
/// println!("Signed in as {}", user.email);
/// ```
pub struct EncoreClient {
    http: Client,
    url: String,
    api_key: String,
    tokens: RwLock<Tokens>,
}

impl EncoreClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::InvalidConfig("URL cannot be empty".into()));
        }

        // Parse and normalize URL
        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(
                "URL must start with http:// or https://".into(),
            ));
        }
        url::Url::parse(&url).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        if config.api_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig("API key cannot be empty".into()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Encore/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self {
            http,
            url,
            api_key: config.api_key,
            tokens: RwLock::new(Tokens {
                access: config.access_token,
                refresh: config.refresh_token,
            }),
        })
    }

    /// Get the backend URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.access.is_some()
    }

    /// Set tokens directly (e.g., from stored credentials).
    pub async fn set_tokens(&self, access_token: String, refresh_token: Option<String>) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(access_token);
        tokens.refresh = refresh_token;
    }

    /// Get the current tokens.
    pub async fn get_tokens(&self) -> (Option<String>, Option<String>) {
        let tokens = self.tokens.read().await;
        (tokens.access.clone(), tokens.refresh.clone())
    }

    async fn clear_tokens(&self) {
        *self.tokens.write().await = Tokens::default();
    }

    /// Bearer for row and storage calls
    pub(crate) async fn bearer(&self) -> String {
        self.tokens
            .read()
            .await
            .access
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    // ===== Sub-clients =====

    pub(crate) fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.http, &self.url, &self.api_key)
    }

    pub(crate) fn rest<'a>(&'a self, bearer: &'a str) -> RestClient<'a> {
        RestClient::new(&self.http, &self.url, &self.api_key, bearer)
    }

    pub(crate) fn storage<'a>(&'a self, bearer: &'a str) -> StorageClient<'a> {
        StorageClient::new(&self.http, &self.url, &self.api_key, bearer)
    }

    pub(crate) fn object_url(&self, bucket: &str, path: &str) -> String {
        storage::public_url(&self.url, bucket, path)
    }

    pub(crate) async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let bearer = self.bearer().await;
        self.storage(&bearer)
            .upload(bucket, path, bytes, content_type)
            .await
    }

    pub(crate) async fn fetch_object(&self, url: &str) -> Result<encore_core::FetchedObject> {
        let bearer = self.bearer().await;
        self.storage(&bearer).fetch(url).await
    }

    // ===== Session =====

    /// Sign in with email and password.
    ///
    /// On success, the tokens are stored for subsequent requests.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let session = self.auth().sign_in(email, password).await?;
        self.set_tokens(session.access_token, session.refresh_token)
            .await;
        Ok(session.user.into_user())
    }

    /// Register an account; stores the session when one is issued.
    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<User> {
        let outcome = self.auth().sign_up(email, password, display_name).await?;
        match outcome.session {
            Some((access, refresh)) => self.set_tokens(access, refresh).await,
            None => info!(email, "Account created, confirmation pending"),
        }
        Ok(outcome.user.into_user())
    }

    /// Revoke the session and clear stored tokens.
    ///
    /// Tokens are cleared even when the revoke call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let access = self.tokens.read().await.access.clone();
        let Some(access) = access else {
            debug!("Sign out without a session");
            return Ok(());
        };

        let result = self.auth().sign_out(&access).await;
        if let Err(e) = &result {
            warn!("Session revoke failed: {}", e);
        }
        self.clear_tokens().await;
        info!("Signed out");
        result
    }
}
