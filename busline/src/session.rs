//! Persisted client session.
//!
//! The auth token and the passenger profile survive restarts under the fixed
//! keys `token` and `user`. A session is only restored when both are present.
//!
//! [`Credentials`] is the in-memory copy of the token that every
//! authenticated request reads. Only the auth feature's effects write it.

use crate::types::Passenger;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use thiserror::Error;

/// Errors from session storage
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not valid session JSON
    #[error("Corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A restorable session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token
    pub token: String,
    /// Profile fetched after login
    pub user: Passenger,
}

/// Durable storage for the session keys
///
/// Login persists the token first and the profile once it has been fetched,
/// so the two keys are written separately.
pub trait SessionStorage: Send + Sync {
    /// Load the session; `None` unless both keys are present
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the storage cannot be read.
    fn load(&self) -> Result<Option<StoredSession>, SessionError>;

    /// Persist the `token` key
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the storage cannot be written.
    fn save_token(&self, token: &str) -> Result<(), SessionError>;

    /// Persist the `user` key
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the storage cannot be written.
    fn save_user(&self, user: &Passenger) -> Result<(), SessionError>;

    /// Remove both keys
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the storage cannot be written.
    fn clear(&self) -> Result<(), SessionError>;

    /// Persist both keys
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the storage cannot be written.
    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        self.save_token(&session.token)?;
        self.save_user(&session.user)
    }
}

/// On-disk shape; either key may be missing between login and profile load
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<Passenger>,
}

impl SessionKeys {
    fn into_session(self) -> Option<StoredSession> {
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(StoredSession { token, user }),
            _ => None,
        }
    }
}

/// Session stored as a JSON file
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles from concurrent effects
    write_lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Store the session at `path`; the file is created on first save
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_keys(&self) -> Result<SessionKeys, SessionError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(SessionKeys::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionKeys::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_keys(&self, keys: &SessionKeys) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(keys)?)?;
        Ok(())
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut SessionKeys)) -> Result<(), SessionError> {
        let _guard = self.lock_writes();
        // A corrupt file is replaced rather than blocking login forever
        let mut keys = self.read_keys().unwrap_or_else(|error| {
            tracing::warn!(path = %self.path.display(), %error, "Discarding unreadable session file");
            SessionKeys::default()
        });
        apply(&mut keys);
        self.write_keys(&keys)
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        Ok(self.read_keys()?.into_session())
    }

    fn save_token(&self, token: &str) -> Result<(), SessionError> {
        self.update(|keys| keys.token = Some(token.to_string()))
    }

    fn save_user(&self, user: &Passenger) -> Result<(), SessionError> {
        self.update(|keys| keys.user = Some(user.clone()))
    }

    fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.lock_writes();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory session storage for tests and one-shot runs
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    keys: Arc<Mutex<(Option<String>, Option<Passenger>)>>,
}

impl MemorySessionStorage {
    /// Empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a session
    #[must_use]
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            keys: Arc::new(Mutex::new((Some(session.token), Some(session.user)))),
        }
    }

    /// Raw `token` key, even without a `user`
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.lock().0.clone()
    }

    /// Raw `user` key, even without a `token`
    #[must_use]
    pub fn user(&self) -> Option<Passenger> {
        self.lock().1.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, (Option<String>, Option<Passenger>)> {
        match self.keys.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        let keys = self.lock();
        Ok(SessionKeys {
            token: keys.0.clone(),
            user: keys.1.clone(),
        }
        .into_session())
    }

    fn save_token(&self, token: &str) -> Result<(), SessionError> {
        self.lock().0 = Some(token.to_string());
        Ok(())
    }

    fn save_user(&self, user: &Passenger) -> Result<(), SessionError> {
        self.lock().1 = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.lock() = (None, None);
        Ok(())
    }
}

/// Shared bearer token
///
/// Clones share the same slot. Readers are every authenticated request;
/// writers are login, logout and session restore.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    /// No token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token, if logged in
    #[must_use]
    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns `true` if a token is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Replace the token
    pub fn set(&self, token: impl Into<String>) {
        let mut slot = match self.token.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(token.into());
    }

    /// Drop the token
    pub fn clear(&self) {
        let mut slot = match self.token.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn passenger() -> Passenger {
        Passenger {
            passenger_guid: "u-1".to_string(),
            first_name: "Abebe".to_string(),
            last_name: "Kebede".to_string(),
            gender: "Male".to_string(),
            country_code: "+251".to_string(),
            mobile_number: "911000000".to_string(),
            email: String::new(),
            status: "Active".to_string(),
            last_modified: None,
        }
    }

    #[test]
    fn memory_storage_needs_both_keys() {
        let storage = MemorySessionStorage::new();
        assert!(matches!(storage.load(), Ok(None)));

        assert!(storage.save_token("t").is_ok());
        assert!(matches!(storage.load(), Ok(None)));

        assert!(storage.save_user(&passenger()).is_ok());
        let restored = storage.load().ok().flatten();
        assert_eq!(restored.map(|s| s.token), Some("t".to_string()));

        assert!(storage.clear().is_ok());
        assert_eq!(storage.token(), None);
        assert_eq!(storage.user(), None);
    }

    #[test]
    fn clear_waits_for_pending_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileSessionStorage::new(dir.path().join("session.json")));
        assert!(storage.save_token("t").is_ok());

        let guard = storage.lock_writes();
        let clearing = {
            let storage = Arc::clone(&storage);
            std::thread::spawn(move || storage.clear())
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(storage.path().exists());
        assert!(!clearing.is_finished());

        drop(guard);
        assert!(clearing.join().unwrap().is_ok());
        assert!(!storage.path().exists());
    }

    #[test]
    fn credentials_are_shared_between_clones() {
        let credentials = Credentials::new();
        let reader = credentials.clone();

        credentials.set("abc");
        assert_eq!(reader.token().as_deref(), Some("abc"));

        credentials.clear();
        assert!(!reader.is_authenticated());
    }
}
