//! File-backed key/value storage.
//!
//! Each key is one file in the data directory, holding the raw value:
//! - Linux: ~/.local/share/datacake/
//! - macOS: ~/Library/Application Support/datacake/
//! - Windows: %APPDATA%/datacake/

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use datacake_application::ports::{KeyValueStore, StorageError};

/// Key/value store writing one file per key.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `dir`. The directory is created on the
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the platform data directory for Datacake.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("datacake"))
    }

    /// The directory holding the values.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write then rename so readers never see a half-written value.
        let staging = self.dir.join(format!(".{key}.tmp"));
        write_owner_only(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes `value` to `path`, readable only by the owner on Unix.
fn write_owner_only(path: &Path, value: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // The open mode only applies to new files; a stale staging file keeps its bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(value.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use datacake_application::TokenStore;
    use datacake_application::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use datacake_domain::{AuthTokens, TokenPatch};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let temp = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp.path().join("nested"));

        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(
            fs::read_to_string(temp.path().join("nested").join("k")).unwrap(),
            "v2"
        );

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_token_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp.path());
        // A world-readable leftover from an earlier run must not leak its bits.
        let staging = temp.path().join(format!(".{ACCESS_TOKEN_KEY}.tmp"));
        fs::write(&staging, "old").unwrap();
        fs::set_permissions(&staging, fs::Permissions::from_mode(0o644)).unwrap();

        store.set(ACCESS_TOKEN_KEY, "secret").unwrap();

        let mode = fs::metadata(temp.path().join(ACCESS_TOKEN_KEY))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("secret"));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp.path());

        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.remove("").is_err());
    }

    #[test]
    fn test_tokens_survive_a_new_store() {
        let temp = TempDir::new().unwrap();

        TokenStore::new(Arc::new(FileKeyValueStore::new(temp.path())))
            .put(&TokenPatch::both("acc", "ref"));

        assert_eq!(
            fs::read_to_string(temp.path().join(ACCESS_TOKEN_KEY)).unwrap(),
            "acc"
        );
        let reopened = TokenStore::new(Arc::new(FileKeyValueStore::new(temp.path())));
        assert_eq!(
            reopened.get(),
            Some(AuthTokens::new(
                Some("acc".to_string()),
                Some("ref".to_string())
            ))
        );

        reopened.clear();
        assert!(!temp.path().join(REFRESH_TOKEN_KEY).exists());
    }

    #[test]
    fn test_unwritable_directory_degrades_token_store() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let store = TokenStore::new(Arc::new(FileKeyValueStore::new(blocker.join("data"))));
        store.put(&TokenPatch::both("a", "r"));

        assert_eq!(
            store.get(),
            Some(AuthTokens::new(Some("a".to_string()), Some("r".to_string())))
        );
    }
}
