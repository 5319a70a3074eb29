//! Signed-in state as an explicit object.
//!
//! A [`SessionManager`] is created once per process, restored from its
//! [`SessionStore`] at start, replaced on login and destroyed on logout or
//! when the backend answers 401. Callers receive it by handle instead of
//! reading a global.

use chrono::Utc;
use healthtrust_common::{HealthTrustError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
/// Placeholder token issued by the simulated sign-in.
pub const MOCK_TOKEN: &str = "mock-jwt-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// String key/value persistence for the two session entries.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                HealthTrustError::Session(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(HealthTrustError::Session(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let io_err = |e: std::io::Error| {
            HealthTrustError::Session(format!("{}: {e}", self.path.display()))
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| HealthTrustError::Session(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(io_err)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all().unwrap_or_default();
        if entries.remove(key).is_some() || self.path.exists() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Process-local store for ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Shared handle to the current session.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionManager {
    /// Manager with no session; call [`SessionManager::restore`] to load one.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            current: Arc::new(RwLock::new(None)),
        }
    }

    fn slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_stored(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)
    }

    /// Load a persisted session. An unreadable store or unreadable user data
    /// discards both entries and leaves the manager signed out.
    pub fn restore(&self) -> Result<Option<Session>> {
        let stored = self
            .store
            .get(TOKEN_KEY)
            .and_then(|token| Ok((token, self.store.get(USER_KEY)?)));

        let restored = match stored {
            Ok((Some(token), Some(raw_user))) => match serde_json::from_str::<User>(&raw_user) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    tracing::warn!(error = %e, "session.restore.corrupt_user");
                    self.clear_stored()?;
                    None
                }
            },
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "session.restore.corrupt_store");
                self.clear_stored()?;
                None
            }
        };

        tracing::debug!(restored = restored.is_some(), "session.restore");
        *self.slot() = restored.clone();
        Ok(restored)
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Persist and adopt `session`.
    pub fn establish(&self, session: Session) -> Result<Session> {
        let raw_user = serde_json::to_string(&session.user)
            .map_err(|e| HealthTrustError::Session(e.to_string()))?;
        self.store.set(TOKEN_KEY, &session.token)?;
        self.store.set(USER_KEY, &raw_user)?;
        tracing::info!(user_id = session.user.id, "session.established");
        *self.slot() = Some(session.clone());
        Ok(session)
    }

    /// Simulated sign-in: any well-formed email succeeds.
    pub fn login(&self, email: &str) -> Result<Session> {
        let email = email.trim();
        let name = email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .ok_or_else(|| HealthTrustError::InvalidInput("email is required".to_string()))?;

        self.establish(Session {
            token: MOCK_TOKEN.to_string(),
            user: User {
                id: 1,
                email: email.to_string(),
                name: name.to_string(),
                avatar: None,
                verified: true,
                bio: None,
            },
        })
    }

    /// Simulated registration; new accounts start unverified.
    pub fn register(&self, name: &str, email: &str) -> Result<Session> {
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(HealthTrustError::InvalidInput(
                "name and email are required".to_string(),
            ));
        }
        let id = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.establish(Session {
            token: MOCK_TOKEN.to_string(),
            user: User {
                id,
                email: email.trim().to_string(),
                name: name.trim().to_string(),
                avatar: None,
                verified: false,
                bio: None,
            },
        })
    }

    /// Forget the session in memory and on disk.
    pub fn logout(&self) -> Result<()> {
        *self.slot() = None;
        self.clear_stored()?;
        tracing::info!("session.cleared");
        Ok(())
    }

    /// Drop the session after the backend rejected its token.
    pub fn invalidate(&self) {
        tracing::warn!("session.invalidated");
        if let Err(e) = self.logout() {
            tracing::error!(error = %e, "session.invalidate.store_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemorySessionStore::default()))
    }

    #[test]
    fn login_derives_name_from_email() {
        let m = manager();
        let s = m.login("jane.doe@example.org").unwrap();
        assert_eq!(s.user.name, "jane.doe");
        assert!(s.user.verified);
        assert_eq!(s.token, MOCK_TOKEN);
        assert_eq!(m.token().as_deref(), Some(MOCK_TOKEN));
    }

    #[test]
    fn register_creates_unverified_user() {
        let m = manager();
        let s = m.register("Sam Lee", "sam@example.org").unwrap();
        assert!(!s.user.verified);
        assert!(s.user.id > 1_600_000_000_000);
        assert!(m.register("", "x@y.z").is_err());
    }

    #[test]
    fn logout_and_invalidate_clear_everything() {
        let store = Arc::new(MemorySessionStore::default());
        let m = SessionManager::new(store.clone());
        m.login("a@b.co").unwrap();
        m.invalidate();
        assert!(!m.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_user_discards_both_keys() {
        let store = Arc::new(MemorySessionStore::default());
        store.set(TOKEN_KEY, "t").unwrap();
        store.set(USER_KEY, "{not json").unwrap();
        let m = SessionManager::new(store.clone());
        assert_eq!(m.restore().unwrap(), None);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn token_without_user_is_not_a_session() {
        let store = Arc::new(MemorySessionStore::default());
        store.set(TOKEN_KEY, "t").unwrap();
        let m = SessionManager::new(store.clone());
        assert!(m.restore().unwrap().is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t"));
    }
}
