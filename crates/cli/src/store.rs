//! Session state persisted as a flat JSON object on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use peglint_core::{KeyValueStore, StoreError};

/// `{ "grammarText": "...", "codeText": "..." }`, rewritten on every write.
#[derive(Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Load `path`, or start empty if it does not exist yet.
    pub(crate) fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read state file '{}'", path.display()))?;
            serde_json::from_str::<BTreeMap<String, String>>(&text).with_context(|| {
                format!(
                    "state file '{}' is not a JSON object of strings",
                    path.display()
                )
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    #[cfg(test)]
    fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

/// Write through a sibling temp file so a crash never leaves half a file.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.entries.get(key).map(String::as_str) == Some(value) && self.path.exists() {
            return Ok(());
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        self.flush().map_err(|e| StoreError::Write {
            key: key.to_owned(),
            source: Box::new(e),
        })
    }
}
