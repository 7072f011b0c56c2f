use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{SessionStore, TokenPair, non_empty};

/// Session store persisted as a small JSON file so that a login survives
/// process restarts.
///
/// The file is rewritten through a temporary sibling and renamed into place,
/// so a reader never observes one half of an old pair next to one half of a
/// new pair.
pub struct FileSessionStore {
    path: PathBuf,
    tokens: Mutex<Option<TokenPair>>,
}

impl FileSessionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tokens = load(&path);
        Self {
            path,
            tokens: Mutex::new(tokens),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tokens: &TokenPair) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(tokens)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)
    }
}

impl SessionStore for FileSessionStore {
    fn access_token(&self) -> Option<String> {
        non_empty(self.tokens.lock().as_ref().map(TokenPair::access_token))
    }

    fn refresh_token(&self) -> Option<String> {
        non_empty(self.tokens.lock().as_ref().map(TokenPair::refresh_token))
    }

    fn set_tokens(&self, tokens: TokenPair) {
        let mut guard = self.tokens.lock();
        if let Err(e) = self.persist(&tokens) {
            tracing::warn!(path = %self.path.display(), "failed to persist session: {e}");
        }
        *guard = Some(tokens);
    }

    fn clear_tokens(&self) {
        let mut guard = self.tokens.lock();
        guard.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to remove session file: {e}")
            }
        }
    }
}

fn load(path: &Path) -> Option<TokenPair> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), "session file unreadable: {e}");
            return None;
        }
    };

    match serde_json::from_slice(&data) {
        Ok(tokens) => Some(tokens),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring corrupt session file: {e}");
            None
        }
    }
}
