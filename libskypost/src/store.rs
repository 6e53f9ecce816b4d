//! Session persistence keyed by handle
//!
//! Sessions are kept as indented JSON files named
//! `auth_response_<handle>.json` inside one directory. When no handle is
//! given, the first stored file (in name order) is used.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::session::{normalize_handle, Session};

const FILE_PREFIX: &str = "auth_response_";
const FILE_SUFFIX: &str = ".json";

/// Storage for sessions, keyed by handle
pub trait SessionStore: Send + Sync {
    /// Persist `session` under its handle, replacing any previous value
    ///
    /// Returns the location written to.
    fn save(&self, session: &Session) -> Result<PathBuf>;

    /// Load the session stored for `handle`, or the first stored session
    /// when `handle` is `None`
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown handle, `StoreError::Empty`
    /// when nothing is stored at all.
    fn load(&self, handle: Option<&str>) -> Result<Session>;

    /// Handles with a stored session, sorted
    fn handles(&self) -> Result<Vec<String>>;

    fn backend_name(&self) -> &str;
}

/// One JSON file per handle in a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.expand_path())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a session for `handle` is stored in
    pub fn path_for(&self, handle: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}",
            FILE_PREFIX,
            normalize_handle(handle),
            FILE_SUFFIX
        ))
    }

    fn read(&self, path: &Path) -> Result<Session> {
        validate_not_symlink(path)?;
        let data = std::fs::read(path).map_err(StoreError::Io)?;
        let session = serde_json::from_slice(&data).map_err(StoreError::Serialize)?;
        tracing::debug!("Successfully read session from {:?}", path);
        Ok(session)
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<PathBuf> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(StoreError::Io)?;
            tracing::info!("Created directory: {:?}", self.dir);
        }

        let path = self.path_for(&session.handle);
        validate_not_symlink(&path)?;

        // Staged and renamed into place; rename never follows a link
        let staging = path.with_extension("json.tmp");
        if std::fs::symlink_metadata(&staging).is_ok() {
            std::fs::remove_file(&staging).map_err(StoreError::Io)?;
        }
        write_owner_only(&staging, &to_indented_json(session)?)?;
        std::fs::rename(&staging, &path).map_err(StoreError::Io)?;

        tracing::info!("Successfully wrote session to {:?}", path);
        Ok(path)
    }

    fn load(&self, handle: Option<&str>) -> Result<Session> {
        match handle.map(normalize_handle).filter(|h| !h.is_empty()) {
            Some(handle) => {
                let path = self.path_for(handle);
                validate_not_symlink(&path)?;
                if !path.exists() {
                    return Err(StoreError::NotFound(handle.to_string()).into());
                }
                self.read(&path)
            }
            None => {
                let first = self
                    .handles()?
                    .into_iter()
                    .next()
                    .ok_or_else(|| StoreError::Empty(self.dir.display().to_string()))?;
                let path = self.path_for(&first);
                tracing::info!("No handle provided. Reading from the first file found: {:?}", path);
                self.read(&path)
            }
        }
    }

    fn handles(&self) -> Result<Vec<String>> {
        let mut handles = Vec::new();

        if !self.dir.exists() {
            return Ok(handles);
        }

        for entry in std::fs::read_dir(&self.dir).map_err(StoreError::Io)? {
            let entry = entry.map_err(StoreError::Io)?;
            let file_name = entry.file_name();
            let handle = file_name
                .to_str()
                .and_then(|name| name.strip_prefix(FILE_PREFIX))
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
                .filter(|handle| !handle.is_empty());

            if let Some(handle) = handle {
                handles.push(handle.to_string());
            }
        }

        handles.sort();
        Ok(handles)
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// Serialize with four-space indentation
fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(StoreError::Serialize)?;
    Ok(out)
}

/// Create `path` exclusively and write `data` to it, owner-only on unix
fn write_owner_only(path: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(StoreError::Io)?;
    file.write_all(data).map_err(StoreError::Io)?;
    file.sync_all().map_err(StoreError::Io)?;
    Ok(())
}

/// Refuse to read or overwrite a session file that is a symbolic link
///
/// A missing file passes; a link is refused whether or not its target exists.
pub fn validate_not_symlink(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StoreError::Io(e).into()),
    };
    if metadata.is_symlink() {
        return Err(StoreError::Symlink(path.display().to_string()).into());
    }
    Ok(())
}
