//! Durable token storage as a small JSON file.

use std::path::{Path, PathBuf};

use onair_common::AuthError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Persisted credential set. An empty access token means signed out.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as epoch milliseconds; `-1` when unknown.
    pub expiration: i64,
}

impl StoredTokens {
    pub fn signed_out() -> Self {
        Self {
            access_token: String::new(),
            refresh_token: String::new(),
            expiration: -1,
        }
    }

    /// Whether the token is still valid `tolerance_ms` from `now_ms`.
    pub fn is_fresh(&self, now_ms: i64, tolerance_ms: i64) -> bool {
        self.expiration > now_ms + tolerance_ms
    }
}

impl std::fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredTokens")
            .field(
                "access_token",
                &(!self.access_token.is_empty()).then_some("[REDACTED]"),
            )
            .field(
                "refresh_token",
                &(!self.refresh_token.is_empty()).then_some("[REDACTED]"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// File-backed token store.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored tokens; a missing file reads as signed out.
    pub fn load(&self) -> Result<StoredTokens, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored tokens");
                return Ok(StoredTokens::signed_out());
            }
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_str(&content) {
            Ok(tokens) => Ok(tokens),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable token file");
                Ok(StoredTokens::signed_out())
            }
        }
    }

    pub fn save(&self, tokens: &StoredTokens) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| AuthError::Storage(format!("failed to serialize tokens: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| {
            AuthError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = std::fs::set_permissions(&self.path, perms) {
                warn!(path = %self.path.display(), error = %e, "could not restrict token file permissions");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        let tokens = store.load().unwrap();
        assert!(tokens.access_token.is_empty());
        assert_eq!(tokens.expiration, -1);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("tokens.json"));
        let tokens = StoredTokens {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expiration: 1_700_000_000_000,
        };
        store.save(&tokens).unwrap();
        assert_eq!(store.load().unwrap(), tokens);
    }

    #[test]
    fn corrupt_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{not json").unwrap();
        let tokens = TokenStore::new(path).load().unwrap();
        assert_eq!(tokens, StoredTokens::signed_out());
    }

    #[test]
    fn freshness_respects_tolerance() {
        let tokens = StoredTokens {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expiration: 10_000,
        };
        assert!(tokens.is_fresh(0, 5_000));
        assert!(!tokens.is_fresh(6_000, 5_000));
    }

    #[test]
    fn debug_hides_tokens() {
        let tokens = StoredTokens {
            access_token: "hunter2".into(),
            refresh_token: "hunter3".into(),
            expiration: 1,
        };
        assert!(!format!("{tokens:?}").contains("hunter"));
    }
}
