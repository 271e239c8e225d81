//! Auth endpoint calls (`/auth/v1`).

use crate::error::{ClientError, Result};
use crate::types::{
    error_message, AuthSession, AuthUser, PasswordGrant, SignUpRequest, SignUpResponse,
    UserMetadata,
};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

/// Auth client for the hosted backend.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    api_key: &'a str,
}

/// Outcome of a sign-up: a session when the account is usable right away.
pub(crate) struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<(String, Option<String>)>,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, api_key: &'a str) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!("{}/auth/v1/token", self.base_url);
        debug!(url = %url, email = %email, "Attempting sign in");

        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", self.api_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(ClientError::transport)?;

        let response = check_auth(response).await?;
        let session: AuthSession = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse session response: {}", e))
        })?;

        info!(user_id = %session.user.id, "Sign in successful");
        Ok(session)
    }

    /// Register a new account.
    pub(crate) async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignUpOutcome> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        debug!(url = %url, email = %email, "Attempting sign up");

        let request = SignUpRequest {
            email,
            password,
            data: UserMetadata {
                display_name: Some(display_name.to_string()),
            },
        };

        let response = self
            .http
            .post(&url)
            .header("apikey", self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::transport)?;

        let response = check_auth(response).await?;
        let body: SignUpResponse = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse sign up response: {}", e))
        })?;

        let outcome = match body {
            SignUpResponse::Session(session) => SignUpOutcome {
                user: session.user,
                session: Some((session.access_token, session.refresh_token)),
            },
            SignUpResponse::User(user) => SignUpOutcome {
                user,
                session: None,
            },
        };

        info!(
            user_id = %outcome.user.id,
            confirmed = outcome.session.is_some(),
            "Sign up successful"
        );
        Ok(outcome)
    }

    /// Revoke the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        debug!(url = %url, "Signing out");

        let response = self
            .http
            .post(&url)
            .header("apikey", self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 401 {
            // An expired token has nothing left to revoke
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ClientError::ServerError {
                status: status.as_u16(),
                message: error_message(&error_text),
            })
        }
    }
}

/// Credential failures come back as 400 (bad grant) or 422 (sign-up rules)
async fn check_auth(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = error_message(&error_text);
    match status.as_u16() {
        400 | 401 | 422 => {
            warn!(status = %status, error = %message, "Auth request rejected");
            Err(ClientError::AuthFailed(message))
        }
        429 => Err(ClientError::RateLimited {
            retry_after_secs: 60,
        }),
        code => Err(ClientError::ServerError {
            status: code,
            message,
        }),
    }
}
