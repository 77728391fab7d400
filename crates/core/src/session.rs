//! Stored login session.
//!
//! The login flow lives outside this client; it hands over a bearer token and a minimal
//! user object, which are kept in a small JSON file until logout or until the server
//! rejects the token.

use crate::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub nombre: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub user_info: UserInfo,
}

impl Session {
    /// Greeting name, falling back to `Usuario`.
    pub fn display_name(&self) -> &str {
        self.user_info
            .nombre
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Usuario")
    }
}

/// File-backed session storage.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionRead` for I/O failures other than a missing file and
    /// `SessionFormat` if the file is not a valid session.
    pub fn load(&self) -> DeskResult<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DeskError::SessionRead(e)),
        };
        let session: Session = serde_json::from_str(&raw).map_err(DeskError::SessionFormat)?;
        if session.token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// The stored session, or [`DeskError::LoginRequired`].
    pub fn require(&self) -> DeskResult<Session> {
        self.load()?.ok_or(DeskError::LoginRequired)
    }

    /// Persist a session, replacing any previous one.
    pub fn save(&self, session: &Session) -> DeskResult<()> {
        if session.token.trim().is_empty() {
            return Err(DeskError::InvalidInput("session token cannot be empty".into()));
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(DeskError::SessionWrite)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(DeskError::SessionFormat)?;
        let mut file = open_owner_only(&self.path).map_err(DeskError::SessionWrite)?;
        file.write_all(json.as_bytes()).map_err(DeskError::SessionWrite)?;
        tracing::debug!(path = %self.path.display(), "session stored");
        Ok(())
    }

    /// Remove the stored session. Clearing an absent session is not an error.
    pub fn clear(&self) -> DeskResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeskError::SessionWrite(e)),
        }
    }
}

/// Truncate or create `path` as a 0600 file before any byte is written.
#[cfg(unix)]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a file left by an older version.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            token: "abc.def".into(),
            user_info: UserInfo {
                nombre: Some("Marta".into()),
            },
        }
    }

    #[test]
    fn missing_file_means_no_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
        assert!(matches!(store.require(), Err(DeskError::LoginRequired)));
    }

    #[test]
    fn save_then_load_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        store.save(&session()).unwrap();
        let loaded = store.require().unwrap();
        assert_eq!(loaded, session());
        assert_eq!(loaded.display_name(), "Marta");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn stored_json_uses_camel_case_user_info() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&session()).unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"userInfo\""));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&session()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn save_tightens_a_readable_session_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"token":"old-token-that-is-longer"}"#).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = SessionStore::new(path.clone());
        store.save(&session()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), Some(session()));
    }

    #[test]
    fn blank_token_is_treated_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"token":"  "}"#).unwrap();
        assert!(SessionStore::new(path).load().unwrap().is_none());
    }
}
