use crate::error::{ApiError, ApiResult};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const DEFAULT_SLOT: &str = "admin_token";

/// A single named slot holding the session token string.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> ApiResult<Option<String>>;
    fn store(&self, token: &str) -> ApiResult<()>;
    fn clear(&self) -> ApiResult<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ApiResult<Option<String>> {
        self.token
            .read()
            .map(|t| t.clone())
            .map_err(|_| ApiError::Session("session lock poisoned".into()))
    }

    fn store(&self, token: &str) -> ApiResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| ApiError::Session("session lock poisoned".into()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| ApiError::Session("session lock poisoned".into()))?;
        *slot = None;
        Ok(())
    }
}

const KEY_FILE: &str = "session.key";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    stored_at: DateTime<Utc>,
}

/// Encrypted on-disk session slots.
///
/// Each slot is its own `<slot>.session` file: a nonce followed by AES-256-GCM
/// ciphertext whose associated data is the slot name, so a file renamed to
/// another slot fails to open. All slots in a directory share `session.key`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
    slot: String,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>, slot: &str) -> Self {
        Self {
            dir: dir.into(),
            slot: slot.to_string(),
        }
    }

    pub fn in_data_dir(slot: &str) -> ApiResult<Self> {
        let proj_dirs = ProjectDirs::from("com", "setup-admin", "setup-admin")
            .ok_or_else(|| ApiError::Session("Could not determine project directories".into()))?;
        Ok(Self::new(proj_dirs.data_dir(), slot))
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(format!("{}.session", self.slot))
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        let path = self.dir.join(KEY_FILE);
        match fs::read(&path) {
            Ok(bytes) if bytes.len() == KEY_LEN => {
                return Aes256Gcm::new_from_slice(&bytes).map_err(|_| anyhow!("bad session key"));
            }
            Ok(_) => tracing::warn!(path = %path.display(), "Replacing malformed session key"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        }

        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill(&mut key);
        fs::create_dir_all(&self.dir)?;
        write_secure_file(&path, &key)?;
        Aes256Gcm::new_from_slice(&key).map_err(|_| anyhow!("bad session key"))
    }

    fn seal(&self, record: &StoredSession) -> Result<Vec<u8>> {
        let plaintext = serde_json::to_vec(record)?;
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce);

        let payload = Payload {
            msg: &plaintext,
            aad: self.slot.as_bytes(),
        };
        let sealed = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce), payload)
            .map_err(|_| anyhow!("could not seal slot {}", self.slot))?;
        Ok([nonce.as_slice(), sealed.as_slice()].concat())
    }

    fn open(&self, sealed: &[u8]) -> Result<StoredSession> {
        if sealed.len() <= NONCE_LEN {
            bail!("session file for slot {} is truncated", self.slot);
        }
        let (nonce, msg) = sealed.split_at(NONCE_LEN);
        let payload = Payload {
            msg,
            aad: self.slot.as_bytes(),
        };
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce), payload)
            .map_err(|_| anyhow!("session file does not belong to slot {}", self.slot))?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}

fn session_error(e: anyhow::Error) -> ApiError {
    ApiError::Session(format!("{e:#}"))
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ApiResult<Option<String>> {
        let sealed = match fs::read(self.session_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = self.open(&sealed).map_err(session_error)?;
        Ok(Some(record.token))
    }

    fn store(&self, token: &str) -> ApiResult<()> {
        let record = StoredSession {
            token: token.to_string(),
            stored_at: Utc::now(),
        };
        let sealed = self.seal(&record).map_err(session_error)?;
        fs::create_dir_all(&self.dir)?;
        write_secure_file(&self.session_path(), &sealed).map_err(session_error)?;
        tracing::debug!(slot = %self.slot, "Session token stored");
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        match fs::remove_file(self.session_path()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn write_secure_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}
