use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use cf_core::BlockingList;

use crate::error::ListError;

/// Persistence for subscribed blocking lists.
pub trait BlockingListStore {
    fn load(&self) -> Result<Vec<BlockingList>, ListError>;
    fn save(&mut self, lists: &[BlockingList]) -> Result<(), ListError>;
}

/// Lists kept as a JSON array in a single file. A missing file is an empty
/// store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BlockingListStore for JsonFileStore {
    fn load(&self) -> Result<Vec<BlockingList>, ListError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ListError::io(&self.path, err)),
        };
        serde_json::from_str(&text).map_err(|e| ListError::json(&self.path, e))
    }

    fn save(&mut self, lists: &[BlockingList]) -> Result<(), ListError> {
        let text = serde_json::to_string_pretty(lists).map_err(|e| ListError::json(&self.path, e))?;

        // replace atomically
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| ListError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| ListError::io(&self.path, e))
    }
}
