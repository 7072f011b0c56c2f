use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Subset of the access token claims useful for diagnostics.
///
/// Read without signature verification. Never used to decide whether a
/// request is authorized or whether a token is about to expire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration timestamp (Unix seconds).
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AccessClaims {
    pub fn peek(token: &str) -> Result<Self, ApiError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| ApiError::Decode("access token is not a JWT".to_owned()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ApiError::Decode(format!("access token payload: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Decode(format!("access token claims: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    #[test]
    fn reads_claims_from_signed_token() {
        let token = encode(
            &Header::default(),
            &serde_json::json!({
                "sub": "user-1",
                "email": "ops@example.com",
                "exp": 1_900_000_000i64,
                "role": "Admin",
            }),
            &EncodingKey::from_secret(b"irrelevant"),
        )
        .unwrap();

        let claims = AccessClaims::peek(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.email.as_deref(), Some("ops@example.com"));
        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.extra["role"], "Admin");
    }

    #[test]
    fn rejects_opaque_tokens() {
        assert!(matches!(
            AccessClaims::peek("opaque-token"),
            Err(ApiError::Decode(_))
        ));
    }
}
