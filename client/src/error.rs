/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response other than `401 Unauthorized`.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// `401` returned by the retried attempt after a successful refresh.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// `401` that could not be recovered. Tokens were cleared and the
    /// application was sent back to its login entry point.
    #[error("session invalid: {0}")]
    SessionInvalid(String),

    /// The backend answered with `isSuccess = false`.
    #[error("{0}")]
    Logical(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Returns `true` for both flavours of authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::SessionInvalid(_))
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) | Self::SessionInvalid(_) => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
