use crate::error::{Result, TaskError};
use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key under which the completed seed import is recorded.
pub const HAS_FETCHED_DATA: &str = "has_fetched_data";

/// Small persisted key/value store of booleans. Absent keys read as `false`.
pub trait FlagStore: Send + Sync {
    fn get(&self, key: &str) -> Result<bool>;
    fn set(&self, key: &str, value: bool) -> Result<()>;
}

// Flags kept in a TOML file, e.g. `has_fetched_data = true`
pub struct TomlFlagStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TomlFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TomlFlagStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, bool>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&contents)
            .map_err(|e| TaskError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

impl FlagStore for TomlFlagStore {
    fn get(&self, key: &str) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        Ok(self.load()?.get(key).copied().unwrap_or(false))
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut flags = self.load()?;
        flags.insert(key.to_string(), value);

        let contents =
            toml::to_string(&flags).map_err(|e| TaskError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // readers only ever see a complete file
        let tmp = self.path.with_extension("toml.tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;
        log::debug!("Set flag {} = {} in {}", key, value, self.path.display());
        Ok(())
    }
}

/// In-memory flags for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<String, bool>>,
}

#[cfg(test)]
impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<bool> {
        let flags = self.flags.lock().unwrap_or_else(|p| p.into_inner());
        Ok(flags.get(key).copied().unwrap_or(false))
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        let mut flags = self.flags.lock().unwrap_or_else(|p| p.into_inner());
        flags.insert(key.to_string(), value);
        Ok(())
    }
}
