use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use self::claims::AccessClaims;
pub use self::file::FileSessionStore;

mod claims;
mod file;

/// Access/refresh credential pair. Both halves are always set together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    access_token: String,
    refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Single source of truth for the current credential pair.
///
/// Reads never fail: an unavailable backing medium behaves as an empty
/// session. Empty strings are reported as `None`.
pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    /// Replaces both tokens at once.
    fn set_tokens(&self, tokens: TokenPair);

    /// Removes both tokens at once.
    fn clear_tokens(&self);

    fn has_session(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Option<String> {
        non_empty(self.tokens.lock().as_ref().map(TokenPair::access_token))
    }

    fn refresh_token(&self) -> Option<String> {
        non_empty(self.tokens.lock().as_ref().map(TokenPair::refresh_token))
    }

    fn set_tokens(&self, tokens: TokenPair) {
        *self.tokens.lock() = Some(tokens);
    }

    fn clear_tokens(&self) {
        self.tokens.lock().take();
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_reports_no_tokens() {
        let store = MemorySessionStore::new();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
        assert!(!store.has_session());
    }

    #[test]
    fn set_tokens_is_idempotent() {
        let store = MemorySessionStore::new();
        store.set_tokens(TokenPair::new("a", "b"));
        store.set_tokens(TokenPair::new("a", "b"));
        assert_eq!(store.access_token().as_deref(), Some("a"));
        assert_eq!(store.refresh_token().as_deref(), Some("b"));
    }

    #[test]
    fn clear_removes_both_halves() {
        let store = MemorySessionStore::with_tokens(TokenPair::new("a", "b"));
        store.clear_tokens();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn blank_tokens_read_as_absent() {
        let store = MemorySessionStore::with_tokens(TokenPair::new("", "refresh"));
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token().as_deref(), Some("refresh"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", TokenPair::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
    }
}
