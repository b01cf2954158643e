//! Signed-in session. The server and email live in `session.yaml` next to the
//! client config; the token itself is kept in the OS keyring.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppError;
use crate::config::normalize_server_url;

const SESSION_FILE: &str = "session.yaml";
const KEYRING_SERVICE: &str = "clan-companion";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub server_url: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct SessionFile {
    server_url: String,
    email: String,
}

pub fn session_path(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) => dir.join(SESSION_FILE),
        None => PathBuf::from(SESSION_FILE),
    }
}

/// Keyring entry holding the token for `server_url`; one account per server.
fn keyring_entry(server_url: &str) -> Result<keyring::Entry, AppError> {
    keyring::Entry::new(KEYRING_SERVICE, &normalize_server_url(server_url))
        .map_err(|e| AppError::Keyring(e.to_string()))
}

fn read_token(entry: &keyring::Entry) -> Result<Option<String>, AppError> {
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(AppError::Keyring(e.to_string())),
    }
}

fn store_token(entry: &keyring::Entry, token: &str) -> Result<(), AppError> {
    entry
        .set_password(token)
        .map_err(|e| AppError::Keyring(e.to_string()))
}

fn forget_token(entry: &keyring::Entry) -> Result<(), AppError> {
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(AppError::Keyring(e.to_string())),
    }
}

fn read_file(path: &Path) -> Result<Option<SessionFile>, AppError> {
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::Io(e)),
    };
    let file = serde_yaml::from_str(&data)
        .map_err(|e| AppError::Config(format!("parse {} failed: {e}", path.display())))?;
    Ok(Some(file))
}

fn write_file(path: &Path, file: &SessionFile) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(file)
        .map_err(|e| AppError::Config(format!("serialize session failed: {e}")))?;
    std::fs::write(path, data)?;
    Ok(())
}

/// The saved session, or `None` when signed out or the keyring lost the token.
pub fn load(path: &Path) -> Result<Option<Session>, AppError> {
    let Some(file) = read_file(path)? else {
        return Ok(None);
    };
    let Some(token) = read_token(&keyring_entry(&file.server_url)?)? else {
        warn!(server_url = %file.server_url, "no token in keyring for saved session");
        return Ok(None);
    };
    Ok(Some(Session {
        server_url: file.server_url,
        email: file.email,
        token,
    }))
}

pub fn save(path: &Path, session: &Session) -> Result<(), AppError> {
    store_token(&keyring_entry(&session.server_url)?, &session.token)?;
    write_file(
        path,
        &SessionFile {
            server_url: session.server_url.clone(),
            email: session.email.clone(),
        },
    )
}

pub fn clear(path: &Path) -> Result<(), AppError> {
    if let Some(file) = read_file(path)? {
        forget_token(&keyring_entry(&file.server_url)?)?;
    }
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Io(e)),
    }
}
