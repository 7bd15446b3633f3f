//! The cached Google session and its lifecycle: acquire, refresh, teardown.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};

use crate::app_config::{self, Credentials, base_dir};
use crate::authenticate;

const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    /// `None` when Google reported no lifetime for the access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&AccessToken> for SessionData {
    fn from(tokens: &AccessToken) -> Self {
        SessionData::from_tokens(
            tokens.access_token.clone(),
            tokens.refresh_token.clone(),
            tokens.expires_in,
        )
    }
}

impl SessionData {
    /// A lifetime of zero or less means the response carried none.
    pub fn from_tokens(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        let expires_at = (expires_in > 0).then(|| Utc::now() + Duration::seconds(expires_in));

        SessionData {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// A session without a known expiry is used until Google rejects it.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    pub fn client(&self, creds: &Credentials) -> Client {
        Client::new(
            creds.client_id.clone(),
            creds.client_secret.clone(),
            String::new(),
            self.access_token.clone(),
            self.refresh_token.clone(),
        )
    }
}

/// Where the session lives on disk.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// `~/.config/daycount/google/session.toml`
    pub fn default_location() -> Result<Self> {
        Ok(SessionStore::new(base_dir()?.join("session.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no session has been stored yet.
    pub fn load(&self) -> Result<Option<SessionData>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Failed to read Google OAuth session from {}",
                self.path.display()
            )
        })?;

        let data: SessionData = toml::from_str(&contents).with_context(|| {
            format!(
                "Failed to parse Google OAuth session from {}",
                self.path.display()
            )
        })?;

        Ok(Some(data))
    }

    pub fn save(&self, data: &SessionData) -> Result<()> {
        let contents = toml::to_string_pretty(data).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Set to owner-only (0600) since file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Returns whether a file was removed.
    pub fn delete(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to delete session {}", self.path.display()))
            }
        }
    }
}

/// The network half of the session lifecycle.
#[allow(async_fn_in_trait)]
pub trait Authorizer {
    /// Run the interactive consent flow.
    async fn consent(&self) -> Result<SessionData>;

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, session: &SessionData) -> Result<SessionData>;

    async fn revoke(&self, session: &SessionData) -> Result<()>;
}

/// Talks to Google's OAuth endpoints with the user's app credentials.
pub struct GoogleAuthorizer {
    creds: Credentials,
}

impl GoogleAuthorizer {
    pub fn new(creds: Credentials) -> Self {
        GoogleAuthorizer { creds }
    }

    pub fn from_app_config() -> Result<Self> {
        Ok(GoogleAuthorizer::new(app_config::load()?))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }
}

impl Authorizer for GoogleAuthorizer {
    async fn consent(&self) -> Result<SessionData> {
        authenticate::consent(&self.creds).await
    }

    async fn refresh(&self, session: &SessionData) -> Result<SessionData> {
        let tokens = session
            .client(&self.creds)
            .refresh_access_token()
            .await
            .context("Failed to refresh token")?;

        Ok((&tokens).into())
    }

    async fn revoke(&self, session: &SessionData) -> Result<()> {
        // Revoking the refresh token also invalidates its access tokens
        let token = if session.refresh_token.is_empty() {
            &session.access_token
        } else {
            &session.refresh_token
        };

        let response = reqwest::Client::new()
            .post(REVOKE_URL)
            .form(&[("token", token.as_str())])
            .send()
            .await
            .context("Failed to send revoke request to Google")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Google refused to revoke the token ({status}): {error_text}");
        }

        Ok(())
    }
}

/// Authorization state, passed explicitly to whatever needs a valid token.
pub struct AuthContext<A: Authorizer> {
    store: SessionStore,
    authorizer: A,
    session: Option<SessionData>,
}

impl<A: Authorizer> AuthContext<A> {
    pub fn new(store: SessionStore, authorizer: A) -> Self {
        AuthContext {
            store,
            authorizer,
            session: None,
        }
    }

    pub fn authorizer(&self) -> &A {
        &self.authorizer
    }

    pub fn session(&self) -> Option<&SessionData> {
        self.session.as_ref()
    }

    /// Return a usable session, refreshing or re-consenting as needed.
    ///
    /// A missing or unreadable cache, or a failed refresh, falls back to the
    /// consent flow. Only a failed consent is an error.
    pub async fn acquire(&mut self) -> Result<&SessionData> {
        let cached = match self.session.take() {
            Some(session) => Some(session),
            None => self.store.load().unwrap_or_else(|err| {
                tracing::warn!("Ignoring stored Google session: {:#}", err);
                None
            }),
        };

        let (session, changed) = match cached {
            Some(session) if !session.is_expired() => (session, false),
            Some(session) => match self.refreshed(&session).await {
                Ok(fresh) => (fresh, true),
                Err(err) => {
                    tracing::warn!("Google session refresh failed, re-authenticating: {err:#}");
                    (self.authorizer.consent().await?, true)
                }
            },
            None => {
                tracing::info!("No Google session, starting consent flow");
                (self.authorizer.consent().await?, true)
            }
        };

        if changed {
            self.store.save(&session)?;
        }

        Ok(self.session.insert(session))
    }

    /// Force a refresh of the current (or stored) session.
    pub async fn refresh(&mut self) -> Result<&SessionData> {
        let current = match self.session.take() {
            Some(session) => session,
            None => self
                .store
                .load()?
                .ok_or_else(|| anyhow::anyhow!("No Google session to refresh"))?,
        };

        let fresh = self.refreshed(&current).await?;
        self.store.save(&fresh)?;

        Ok(self.session.insert(fresh))
    }

    /// Revoke the session at Google (best effort) and forget it locally.
    ///
    /// Returns whether a stored session was removed.
    pub async fn teardown(&mut self) -> Result<bool> {
        let session = match self.session.take() {
            Some(session) => Some(session),
            None => self.store.load().unwrap_or(None),
        };

        if let Some(session) = session {
            if let Err(err) = self.authorizer.revoke(&session).await {
                tracing::warn!("Could not revoke Google token: {:#}", err);
            }
        }

        self.store.delete()
    }

    async fn refreshed(&self, session: &SessionData) -> Result<SessionData> {
        let mut fresh = self.authorizer.refresh(session).await?;

        // Google typically doesn't return a new refresh_token on refresh
        if fresh.refresh_token.is_empty() {
            fresh.refresh_token = session.refresh_token.clone();
        }

        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeAuthorizer {
        fail_refresh: bool,
        consents: AtomicU32,
        refreshes: AtomicU32,
        revokes: AtomicU32,
    }

    impl Authorizer for FakeAuthorizer {
        async fn consent(&self) -> Result<SessionData> {
            self.consents.fetch_add(1, Ordering::SeqCst);
            Ok(session("consented", "consent-refresh", Duration::hours(1)))
        }

        async fn refresh(&self, _session: &SessionData) -> Result<SessionData> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                anyhow::bail!("invalid_grant");
            }
            Ok(session("refreshed", "", Duration::hours(1)))
        }

        async fn revoke(&self, _session: &SessionData) -> Result<()> {
            self.revokes.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("offline")
        }
    }

    fn session(access: &str, refresh: &str, valid_for: Duration) -> SessionData {
        SessionData {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at: Some(Utc::now() + valid_for),
        }
    }

    fn store_in(dir: &TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("google").join("session.toml"))
    }

    fn store_with(dir: &TempDir, data: &SessionData) -> SessionStore {
        let store = store_in(dir);
        store.save(data).unwrap();
        store
    }

    #[test]
    fn store_round_trips_and_deletes() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load().unwrap(), None);

        let data = session("a", "r", Duration::hours(1));
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), Some(data));

        assert!(store.delete().unwrap());
        assert!(!store.delete().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn saved_session_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&session("a", "r", Duration::hours(1))).unwrap();

        let mode = std::fs::metadata(store.path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn zero_lifetime_means_no_expiry() {
        let data = SessionData::from_tokens("a".into(), "r".into(), 0);
        assert_eq!(data.expires_at, None);
        assert!(!data.is_expired());

        let data = SessionData::from_tokens("a".into(), "r".into(), 3600);
        assert!(data.expires_at.is_some());
        assert!(!data.is_expired());
    }

    #[test]
    fn session_without_expiry_round_trips() {
        let dir = TempDir::new().unwrap();
        let data = SessionData::from_tokens("a".into(), "r".into(), 0);
        let store = store_with(&dir, &data);

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(!contents.contains("expires_at"));
        assert_eq!(store.load().unwrap(), Some(data));
    }

    #[tokio::test]
    async fn session_without_expiry_is_reused_without_refresh() {
        let dir = TempDir::new().unwrap();
        let data = SessionData::from_tokens("kept".into(), "r".into(), 0);
        let store = store_with(&dir, &data);
        let mut ctx = AuthContext::new(store, FakeAuthorizer::default());

        assert_eq!(ctx.acquire().await.unwrap().access_token, "kept");
        assert_eq!(ctx.acquire().await.unwrap().access_token, "kept");
        assert_eq!(ctx.authorizer().refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.authorizer().consents.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_session_runs_consent_and_saves() {
        let dir = TempDir::new().unwrap();
        let mut ctx = AuthContext::new(store_in(&dir), FakeAuthorizer::default());

        let token = ctx.acquire().await.unwrap().access_token.clone();

        assert_eq!(token, "consented");
        assert_eq!(ctx.authorizer().consents.load(Ordering::SeqCst), 1);
        assert_eq!(
            store_in(&dir).load().unwrap().unwrap().access_token,
            "consented"
        );
    }

    #[tokio::test]
    async fn valid_session_is_reused() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &session("cached", "r", Duration::hours(1)));
        let mut ctx = AuthContext::new(store, FakeAuthorizer::default());

        assert_eq!(ctx.acquire().await.unwrap().access_token, "cached");
        assert_eq!(ctx.authorizer().consents.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.authorizer().refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_session_refreshes_and_keeps_refresh_token() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &session("stale", "keep-me", Duration::hours(-1)));
        let mut ctx = AuthContext::new(store, FakeAuthorizer::default());

        let acquired = ctx.acquire().await.unwrap().clone();

        assert_eq!(acquired.access_token, "refreshed");
        assert_eq!(acquired.refresh_token, "keep-me");
        assert_eq!(store_in(&dir).load().unwrap(), Some(acquired));
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_consent() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &session("stale", "revoked", Duration::hours(-1)));
        let authorizer = FakeAuthorizer {
            fail_refresh: true,
            ..Default::default()
        };
        let mut ctx = AuthContext::new(store, authorizer);

        assert_eq!(ctx.acquire().await.unwrap().access_token, "consented");
        assert_eq!(ctx.authorizer().refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.authorizer().consents.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn corrupt_session_falls_back_to_consent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not = [valid").unwrap();

        let mut ctx = AuthContext::new(store, FakeAuthorizer::default());
        assert_eq!(ctx.acquire().await.unwrap().access_token, "consented");
    }

    #[tokio::test]
    async fn explicit_refresh_without_session_fails() {
        let dir = TempDir::new().unwrap();
        let mut ctx = AuthContext::new(store_in(&dir), FakeAuthorizer::default());
        assert!(ctx.refresh().await.is_err());
    }

    #[tokio::test]
    async fn teardown_deletes_even_when_revoke_fails() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &session("a", "r", Duration::hours(1)));
        let mut ctx = AuthContext::new(store, FakeAuthorizer::default());

        assert!(ctx.teardown().await.unwrap());
        assert_eq!(ctx.authorizer().revokes.load(Ordering::SeqCst), 1);
        assert!(ctx.session().is_none());
        assert_eq!(store_in(&dir).load().unwrap(), None);

        assert!(!ctx.teardown().await.unwrap());
    }
}
