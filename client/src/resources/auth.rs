use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ApiError;
use crate::gateway::{Gateway, RequestDescriptor};
use crate::session::TokenPair;

/// Login form. The password is wiped when dropped.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct AuthApi {
    gateway: Gateway,
}

impl AuthApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Exchanges credentials for a token pair and stores it.
    ///
    /// Runs outside the refresh flow: a rejected login never clears the
    /// session or redirects.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let request = RequestDescriptor::post("/auth/login").with_json(credentials)?;

        let tokens: TokenPair = self
            .gateway
            .call_anonymous(&request, "Login failed")
            .await
            .map_err(|e| match e {
                ApiError::Status { .. } | ApiError::Decode(_) => {
                    tracing::debug!("login rejected: {e}");
                    ApiError::Logical("Login failed".to_owned())
                }
                other => other,
            })?;

        self.gateway.session().set_tokens(tokens);
        tracing::info!(email = credentials.email(), "logged in");
        Ok(())
    }

    /// Ends the session on the backend, then forgets the local tokens.
    ///
    /// The local tokens are cleared whatever the backend answers. Returns
    /// whether the backend acknowledged the logout.
    pub async fn logout(&self) -> Result<bool, ApiError> {
        let request = RequestDescriptor::post("/auth/logout");
        let outcome = self.gateway.call::<bool>(&request, "Logout failed").await;
        self.gateway.session().clear_tokens();

        match outcome {
            Ok(acknowledged) => Ok(acknowledged),
            Err(ApiError::Logical(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Rotates the stored pair using the stored refresh token.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let session = self.gateway.session();
        let refresh_token = session
            .refresh_token()
            .ok_or_else(|| ApiError::SessionInvalid("no refresh token".to_owned()))?;

        let tokens = self.gateway.request_token_refresh(&refresh_token).await?;
        session.set_tokens(tokens);
        Ok(())
    }
}
