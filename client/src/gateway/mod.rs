use std::sync::Arc;

use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

pub use self::request::RequestDescriptor;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::session::{SessionStore, TokenPair};

mod request;

/// Header carrying the id shared by every attempt of one logical call.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const REFRESH_PATH: &str = "/auth/refresh-token";

/// Capability to send the application back to its login entry point.
pub trait NavigationPort: Send + Sync {
    fn redirect_to_login(&self);
}

pub struct GatewayBuilder<MandatoryFields = (Arc<dyn SessionStore>, Arc<dyn NavigationPort>)> {
    base_url: String,
    http_client: Option<HttpClient>,
    mandatory_fields: MandatoryFields,
}

impl GatewayBuilder {
    pub fn build(self) -> Result<Gateway, ApiError> {
        let (session, navigation) = self.mandatory_fields;

        // Validate once so that per-call failures can only come from paths.
        Url::parse(&self.base_url)?;

        Ok(Gateway {
            inner: Arc::new(Inner {
                base_url: self.base_url,
                http_client: self.http_client.unwrap_or_default(),
                session,
                navigation,
            }),
        })
    }
}

impl<T2> GatewayBuilder<((), T2)> {
    pub fn with_session_store(
        self,
        session: Arc<dyn SessionStore>,
    ) -> GatewayBuilder<(Arc<dyn SessionStore>, T2)> {
        let (_, navigation) = self.mandatory_fields;

        GatewayBuilder {
            base_url: self.base_url,
            http_client: self.http_client,
            mandatory_fields: (session, navigation),
        }
    }
}

impl<T1> GatewayBuilder<(T1, ())> {
    pub fn with_navigation(
        self,
        navigation: Arc<dyn NavigationPort>,
    ) -> GatewayBuilder<(T1, Arc<dyn NavigationPort>)> {
        let (session, _) = self.mandatory_fields;

        GatewayBuilder {
            base_url: self.base_url,
            http_client: self.http_client,
            mandatory_fields: (session, navigation),
        }
    }
}

impl<T1, T2> GatewayBuilder<(T1, T2)> {
    pub fn with_base_url(self, base_url: impl AsRef<str>) -> Self {
        GatewayBuilder {
            base_url: base_url.as_ref().trim_end_matches('/').to_owned(),
            ..self
        }
    }

    pub fn with_http_client(self, http_client: HttpClient) -> Self {
        GatewayBuilder {
            http_client: Some(http_client),
            ..self
        }
    }
}

/// Sends every outbound call with the current access token and recovers
/// once from an expired token.
///
/// Per logical call:
/// - a non-401 outcome (success, other status, transport error) is final;
/// - the first 401 triggers a single refresh. On success the new pair is
///   stored and the call is replayed once; that outcome is final.
/// - when no refresh token exists or the refresh fails, both tokens are
///   cleared, the navigation port is asked to show the login entry point,
///   and the 401 is returned as [`ApiError::SessionInvalid`].
///
/// Concurrent calls that hit 401 each run their own refresh.
#[derive(Clone)]
#[repr(transparent)]
pub struct Gateway {
    inner: Arc<Inner>,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder<((), ())> {
        GatewayBuilder {
            base_url: DEFAULT_BASE_URL.to_owned(),
            http_client: None,
            mandatory_fields: ((), ()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    /// Runs one logical call and returns its terminal outcome.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<Response, ApiError> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "api_call",
            method = %request.method(),
            path = request.path(),
            %request_id,
        );

        self.execute_impl(request, request_id).instrument(span).await
    }

    async fn execute_impl(
        &self,
        request: &RequestDescriptor,
        request_id: Uuid,
    ) -> Result<Response, ApiError> {
        let mut has_retried = false;

        loop {
            let attempt = if has_retried {
                Attempt::Retry
            } else {
                Attempt::First
            };
            let response = self.attempt(request, request_id, attempt).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return error_for_status(response).await;
            }

            let message = response_text(response).await;
            if has_retried {
                tracing::warn!("request rejected again after token refresh");
                return Err(ApiError::Unauthorized(message));
            }
            has_retried = true;

            if let Err(e) = self.refresh_session().await {
                tracing::warn!("session could not be refreshed: {e}");
                self.end_session();
                return Err(ApiError::SessionInvalid(message));
            }
            tracing::debug!("token refreshed, replaying request");
        }
    }

    /// Runs a call whose body is wrapped in the backend [`Envelope`].
    ///
    /// `failure` is the generic message reported when the backend answers
    /// with `isSuccess = false`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
        failure: &str,
    ) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.call_plain(request).await?;
        envelope.into_data(failure)
    }

    /// Runs a call whose body is bare JSON.
    pub async fn call_plain<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        decode_body(request, response).await
    }

    /// Runs a call and discards the body.
    pub async fn call_unit(&self, request: &RequestDescriptor) -> Result<(), ApiError> {
        self.execute(request).await.map(drop)
    }

    /// Runs a call without credentials and without 401 recovery, for
    /// endpoints that establish a session.
    pub async fn call_anonymous<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
        failure: &str,
    ) -> Result<T, ApiError> {
        let response = self.attempt(request, Uuid::new_v4(), Attempt::Anonymous).await?;
        let response = error_for_status(response).await?;
        let envelope: Envelope<T> = decode_body(request, response).await?;
        envelope.into_data(failure)
    }

    /// Exchanges `refresh_token` for a new pair. Does not touch the session.
    pub async fn request_token_refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let request = RequestDescriptor::post(REFRESH_PATH)
            .with_json(&serde_json::json!({ "refreshToken": refresh_token }))?;
        self.call_anonymous(&request, "Refresh failed").await
    }

    async fn refresh_session(&self) -> Result<(), RefreshError> {
        let refresh_token = self
            .inner
            .session
            .refresh_token()
            .ok_or(RefreshError::Missing)?;

        let tokens = self.request_token_refresh(&refresh_token).await?;
        self.inner.session.set_tokens(tokens);
        Ok(())
    }

    fn end_session(&self) {
        self.inner.session.clear_tokens();
        self.inner.navigation.redirect_to_login();
    }

    async fn attempt(
        &self,
        request: &RequestDescriptor,
        request_id: Uuid,
        attempt: Attempt,
    ) -> Result<Response, ApiError> {
        let url = self.url_for(request)?;

        let mut builder = self
            .inner
            .http_client
            .request(request.method().clone(), url)
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if attempt != Attempt::Anonymous {
            if let Some(token) = self.inner.session.access_token() {
                builder = builder.bearer_auth(token);
            }
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.inspect_err(|e| {
            tracing::debug!(?attempt, "request failed: {e}");
        })?;

        tracing::debug!(
            ?attempt,
            status = response.status().as_u16(),
            "request completed"
        );
        Ok(response)
    }

    fn url_for(&self, request: &RequestDescriptor) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.inner.base_url, request.path()))?;

        if !request.query().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query() {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

struct Inner {
    base_url: String,
    http_client: HttpClient,
    session: Arc<dyn SessionStore>,
    navigation: Arc<dyn NavigationPort>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Anonymous,
    First,
    Retry,
}

#[derive(Debug, thiserror::Error)]
enum RefreshError {
    #[error("no refresh token")]
    Missing,

    #[error(transparent)]
    Api(#[from] ApiError),
}

async fn error_for_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(ApiError::Status {
        status: status.as_u16(),
        message: response_text(response).await,
    })
}

async fn decode_body<T: DeserializeOwned>(
    request: &RequestDescriptor,
    response: Response,
) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Decode(format!("{} response: {e}", request.path())))
}

async fn response_text(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

const DEFAULT_BASE_URL: &str = "http://localhost:5001/api";
