//! On-disk cache for OAuth tokens.
//!
//! One JSON file per platform holds the access token, refresh token, and
//! expiry. Files are written atomically with owner-only permissions. The
//! `token_expiry` key written by older Python OAuth clients is accepted on
//! read.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

/// Cached OAuth credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    /// Short-lived access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Long-lived refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// When the access token expires.
    #[serde(default, alias = "token_expiry")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Returns a usable access token, treating tokens that expire within
    /// `skew` as already expired.
    pub fn valid_access_token(&self, skew: Duration) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        match self.expires_at {
            Some(expiry) if expiry - skew > Utc::now() => Some(token),
            _ => None,
        }
    }
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// Creates a cache at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default cache path for a platform: `<cache>/adconnect/<name>-token.json`.
    pub fn default_path(name: &str) -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adconnect")
            .join(format!("{name}-token.json"))
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached token, if the file exists.
    pub async fn load(&self) -> Result<Option<CachedToken>, FetchError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cached token");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Saves the token atomically (temp file then rename).
    pub async fn save(&self, token: &CachedToken) -> Result<(), FetchError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(token)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&temp_path, perms).await?;
        }

        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), "Saved token cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("nested").join("dv360-token.json"));

        assert_eq!(cache.load().await.unwrap(), None);

        let token = CachedToken {
            access_token: Some("ya29.a0".into()),
            refresh_token: Some("1//0g".into()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        };
        cache.save(&token).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_reads_legacy_expiry_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"{"access_token": "abc", "refresh_token": "def", "token_expiry": "2022-08-02T10:00:00Z", "_module": "oauth2client.client"}"#,
        )
        .unwrap();

        let token = TokenCache::new(path).load().await.unwrap().unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("def"));
        assert!(token.expires_at.is_some());
    }

    #[test]
    fn test_valid_access_token() {
        let fresh = CachedToken {
            access_token: Some("t".into()),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::hours(1)),
        };
        assert_eq!(fresh.valid_access_token(Duration::minutes(5)), Some("t"));

        let stale = CachedToken {
            expires_at: Some(Utc::now() + Duration::minutes(1)),
            ..fresh.clone()
        };
        assert_eq!(stale.valid_access_token(Duration::minutes(5)), None);

        let unknown = CachedToken {
            expires_at: None,
            ..fresh
        };
        assert_eq!(unknown.valid_access_token(Duration::minutes(5)), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("t.json"));
        cache.save(&CachedToken::default()).await.unwrap();

        let mode = std::fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
