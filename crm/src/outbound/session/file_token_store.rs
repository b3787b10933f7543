//! Session token stored as a signed JSON file.
//!
//! The file holds `{"payload": "<claims json>", "signature": "<hex>"}`. The
//! signature is HMAC-SHA256 over the exact payload text with a key kept in
//! a separate file, so a hand-edited token is rejected rather than trusted.
//! Both files are written with owner-only permissions on Unix.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use cap_std::fs::{Dir, OpenOptions};
use cap_std::ambient_authority;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::SessionClaims;
use crate::domain::ports::{SessionTokenError, SessionTokenStore};

type HmacSha256 = Hmac<Sha256>;

const KEY_LEN: usize = 32;

/// Secret used to sign session tokens.
#[derive(Clone)]
pub struct SessionKey(Zeroizing<[u8; KEY_LEN]>);

impl SessionKey {
    /// Key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Fresh key from the operating system's random source.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; KEY_LEN]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.0[..])
            .unwrap_or_else(|error| panic!("HMAC key rejected: {error}"))
    }

    fn decode(text: &str) -> io::Result<Self> {
        let raw = Zeroizing::new(hex::decode(text.trim()).map_err(|err| {
            io::Error::new(io::ErrorKind::InvalidData, format!("session key: {err}"))
        })?);
        let bytes: [u8; KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("session key must be {KEY_LEN} bytes"),
            )
        })?;
        Ok(Self::from_bytes(bytes))
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SignedToken {
    payload: String,
    signature: String,
}

/// [`SessionTokenStore`] backed by one file on disk.
#[derive(Debug, Clone)]
pub struct FileSessionTokenStore {
    path: PathBuf,
    key: SessionKey,
}

impl FileSessionTokenStore {
    /// Store the token at `path`, signed with `key`.
    pub fn new(path: impl Into<PathBuf>, key: SessionKey) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    /// Token file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the hex-encoded key at `path`, creating it when missing.
    pub fn load_or_create_key(path: &Path) -> io::Result<SessionKey> {
        let (directory, file_name) = open_parent(path)?;
        match directory.read_to_string(&file_name) {
            Ok(text) => SessionKey::decode(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let key = SessionKey::generate();
                let encoded = Zeroizing::new(hex::encode(&key.0[..]));
                write_private(&directory, &file_name, encoded.as_bytes())?;
                info!(path = %path.display(), "created session signing key");
                Ok(key)
            }
            Err(err) => Err(err),
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.key.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, token: &SignedToken) -> Result<(), SessionTokenError> {
        let signature = hex::decode(&token.signature)
            .map_err(|err| SessionTokenError::corrupt(format!("signature: {err}")))?;
        let mut mac = self.key.mac();
        mac.update(token.payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionTokenError::bad_signature())
    }
}

fn io_error(error: io::Error) -> SessionTokenError {
    SessionTokenError::io(error.to_string())
}

fn open_parent(path: &Path) -> io::Result<(Dir, PathBuf)> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Dir::create_ambient_dir_all(parent, ambient_authority())?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((directory, PathBuf::from(file_name)))
}

/// Write `contents` through a temporary sibling, then rename over `name`.
fn write_private(directory: &Dir, name: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write as _;

    let staged = PathBuf::from(format!(".crm-{}.tmp", Uuid::new_v4().simple()));
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use cap_std::fs::OpenOptionsExt as _;
        options.mode(0o600);
    }
    let result = directory
        .open_with(&staged, &options)
        .and_then(|mut file| file.write_all(contents).and_then(|()| file.sync_all()))
        .and_then(|()| directory.rename(&staged, directory, name));
    if result.is_err() {
        let _cleanup = directory.remove_file(&staged);
    }
    result
}

impl SessionTokenStore for FileSessionTokenStore {
    fn load(&self) -> Result<Option<SessionClaims>, SessionTokenError> {
        let (directory, file_name) = open_parent(&self.path).map_err(io_error)?;
        let text = match directory.read_to_string(&file_name) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(err)),
        };
        let token: SignedToken = serde_json::from_str(&text)
            .map_err(|err| SessionTokenError::corrupt(err.to_string()))?;
        self.verify(&token)?;
        let claims = serde_json::from_str(&token.payload)
            .map_err(|err| SessionTokenError::corrupt(err.to_string()))?;
        Ok(Some(claims))
    }

    fn save(&self, claims: &SessionClaims) -> Result<(), SessionTokenError> {
        let payload = serde_json::to_string(claims)
            .map_err(|err| SessionTokenError::corrupt(err.to_string()))?;
        let token = SignedToken {
            signature: self.sign(&payload),
            payload,
        };
        let text = serde_json::to_vec_pretty(&token)
            .map_err(|err| SessionTokenError::corrupt(err.to_string()))?;
        let (directory, file_name) = open_parent(&self.path).map_err(io_error)?;
        write_private(&directory, &file_name, &text).map_err(io_error)?;
        debug!(path = %self.path.display(), "session token written");
        Ok(())
    }

    fn clear(&self) -> Result<bool, SessionTokenError> {
        let (directory, file_name) = open_parent(&self.path).map_err(io_error)?;
        match directory.remove_file(&file_name) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error(err)),
        }
    }
}

#[cfg(test)]
#[path = "file_token_store_tests.rs"]
mod tests;
