//! JSON key-value file store.
//!
//! The file is a JSON object used as a small key-value document. Fences are
//! kept under [`FENCES_KEY`]; any other keys present in the file are left as
//! they are on save.

use super::codec;
use super::error::StoreError;
use super::FenceStore;
use crate::fence::FenceRecord;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key under which the fence list is stored.
pub const FENCES_KEY: &str = "geoFenceItems";

/// Fence store backed by a JSON document on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Read the whole document; a missing file is an empty document.
    fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::DeserializationFailed(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(StoreError::DeserializationFailed(e.to_string())),
        }
    }

    /// Write through a sibling temp file and rename over the target.
    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl FenceStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<FenceRecord>, StoreError> {
        let mut document = self.read_document()?;
        match document.remove(FENCES_KEY) {
            Some(list) => codec::decode(list),
            None => Ok(Vec::new()),
        }
    }

    fn save_all(&self, fences: &[FenceRecord]) -> Result<(), StoreError> {
        // An unreadable document is replaced rather than blocking the save.
        let mut document = self.read_document().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Replacing unreadable fence store");
            Map::new()
        });
        document.insert(FENCES_KEY.to_string(), codec::encode(fences)?);
        self.write_document(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fence::{Coordinate, TriggerOn};
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Vec<FenceRecord> {
        vec![
            FenceRecord::new(
                "F1",
                Coordinate::new(35.0, 139.0),
                500.0,
                "Home",
                TriggerOn::OnEntry,
            ),
            FenceRecord::new(
                "F2",
                Coordinate::new(-33.5, 151.25),
                120.5,
                "",
                TriggerOn::OnExit,
            ),
        ]
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("fences.json"));
        store.save_all(&sample()).unwrap();
        assert_eq!(store.load_all().unwrap(), sample());
    }

    #[test]
    fn full_precision_coordinates_survive_reload() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("fences.json"));
        let fences = vec![FenceRecord::new(
            "F1",
            Coordinate::new(-13.395944183820177, 151.209295517346),
            1234.5678901234567,
            "Harbour",
            TriggerOn::OnEntry,
        )];

        store.save_all(&fences).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, fences);

        store.save_all(&loaded).unwrap();
        assert_eq!(store.load_all().unwrap(), fences);
    }

    #[test]
    fn save_preserves_unrelated_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("defaults.json");
        fs::write(&path, r#"{"mapType": "standard"}"#).unwrap();

        let store = JsonFileStore::new(&path);
        store.save_all(&sample()).unwrap();

        let document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["mapType"], json!("standard"));
        assert_eq!(document[FENCES_KEY].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn clear_writes_empty_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fences.json");
        let store = JsonFileStore::new(&path);
        store.save_all(&sample()).unwrap();
        store.clear().unwrap();

        assert!(store.load_all().unwrap().is_empty());
        let document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document[FENCES_KEY], json!([]));
    }

    #[test]
    fn corrupt_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fences.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load_all(),
            Err(StoreError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deeper/fences.json"));
        store.save_all(&sample()).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);
    }
}
