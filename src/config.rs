// Cached assignment context for one working directory: the assignment id
// and the session token, stored as JSON in `.athene`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".athene";

/// Assignment and token remembered between invocations.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LocalConfig {
    pub assignment_id: String,
    pub auth_token: String,
}

/// Storage for the cached `LocalConfig`. Passed into the session coordinator
/// so tests can swap in memory-backed storage.
pub trait ConfigStore {
    fn load(&self) -> Result<Option<LocalConfig>>;
    fn save(&self, config: &LocalConfig) -> Result<()>;
    /// Removing an absent config is not an error.
    fn clear(&self) -> Result<()>;
}

/// File-backed store, one file per directory.
#[derive(Clone, Debug)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    pub fn current_dir() -> Result<Self> {
        Ok(Self::in_dir(std::env::current_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_file_name(format!("{}.tmp", CONFIG_FILE_NAME))
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Option<LocalConfig>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&data)?;
        debug!(path = %self.path.display(), "loaded cached config");
        Ok(Some(config))
    }

    fn save(&self, config: &LocalConfig) -> Result<()> {
        let data = serde_json::to_string(config)?;
        let tmp = self.temp_path();

        // The token is a bearer credential: owner read/write only, and the
        // file is swapped in whole so an interrupted write leaves the old one.
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "saved config");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared config");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtheneError;

    fn sample() -> LocalConfig {
        LocalConfig {
            assignment_id: "hw3".into(),
            auth_token: "s3cr3t".into(),
        }
    }

    #[test]
    fn load_without_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::in_dir(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::in_dir(dir.path());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["assignment_id"], "hw3");
        assert_eq!(raw["auth_token"], "s3cr3t");
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn save_overwrites_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::in_dir(dir.path());

        store.save(&sample()).unwrap();
        let refreshed = LocalConfig {
            auth_token: "fresh".into(),
            ..sample()
        };
        store.save(&refreshed).unwrap();

        assert_eq!(store.load().unwrap(), Some(refreshed));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::in_dir(dir.path());
        store.save(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::in_dir(dir.path());

        store.clear().unwrap();
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn garbage_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::in_dir(dir.path());
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(AtheneError::ConfigFormat(_))));
    }
}
