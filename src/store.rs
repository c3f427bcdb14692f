use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use thiserror::Error;

use crate::{allocator::next_stall_numbers, form::Registration, stall::StallRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access record store {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("record store {path} is malformed: {source}")]
    Malformed { path: PathBuf, source: serde_json::Error },

    #[error("record store {path} has no free key left")]
    KeysExhausted { path: PathBuf },

    #[error("stall {id} already exists")]
    DuplicateId { id: String },
}

/// Record of truth for stalls.
///
/// Implementations assign the authoritative key on insert and must serialize
/// inserts, so that the numbers allocated for a new record are computed from
/// the latest set of records.
pub trait RecordStore: Send + Sync {
    fn list(&self) -> Result<Vec<StallRecord>, StoreError>;

    /// Allocates stall id and name for `registration` and persists it.
    fn insert(&self, registration: Registration) -> Result<StallRecord, StoreError>;
}

/// Store keeping all records as a JSON array in a single file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    fn load(&self) -> Result<Vec<StallRecord>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&data).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces file contents by writing a sibling file and renaming it over.
    fn save(&self, records: &[StallRecord]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        fs::write(&tmp_path, data).map_err(|err| self.io_error(err))?;
        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            if let Err(remove_err) = fs::remove_file(&tmp_path) {
                log::warn!("failed to remove {}: {remove_err}", tmp_path.display());
            }
            return Err(self.io_error(err));
        }
        Ok(())
    }
}

impl RecordStore for JsonStore {
    fn list(&self) -> Result<Vec<StallRecord>, StoreError> {
        self.load()
    }

    fn insert(&self, registration: Registration) -> Result<StallRecord, StoreError> {
        // Lock only guards the file, a poisoned lock leaves nothing inconsistent.
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = self.load()?;
        let next = next_stall_numbers(&records, Some(&registration.stall_type));
        let mut record = registration.into_record(next);
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateId { id: record.id });
        }
        let key = records
            .iter()
            .filter_map(|r| r.key)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| StoreError::KeysExhausted { path: self.path.clone() })?;
        record.key = Some(key);

        records.push(record.clone());
        self.save(&records)?;
        log::info!("stored {} ({}) with key {key} in {}", record.id, record.name, self.path.display());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stall::StallStatus;

    fn registration(stall_type: &str) -> Registration {
        Registration {
            vendor_name: "Ada".to_string(),
            business_name: "Ada's".to_string(),
            phone: "5551234567".to_string(),
            email: None,
            stall_type: stall_type.to_string(),
            rent: 10000,
            start_date: "2024-01-01".to_string(),
            end_date: "2024-12-31".to_string(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("stalls.json"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_insert_allocates_numbers_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("stalls.json"));

        let first = store.insert(registration("Fish")).unwrap();
        let second = store.insert(registration("Meat")).unwrap();
        let third = store.insert(registration(" fish ")).unwrap();

        assert_eq!((first.key, first.id.as_str(), first.name.as_str()), (Some(1), "stall-1", "Stall 1"));
        assert_eq!((second.key, second.id.as_str(), second.name.as_str()), (Some(2), "stall-2", "Stall 1"));
        assert_eq!((third.key, third.id.as_str(), third.name.as_str()), (Some(3), "stall-3", "Stall 2"));

        let stored = JsonStore::new(store.path()).list().unwrap();
        assert_eq!(stored, vec![first, second, third]);
    }

    #[test]
    fn test_insert_uses_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stalls.json");
        fs::write(
            &path,
            r#"[
                {"key": 10, "id": "stall-2", "name": "Stall 3", "type": "Fish", "status": "active"},
                {"id": "stall-7", "name": "Stall 1", "type": "Meat"}
            ]"#,
        )
        .unwrap();

        let store = JsonStore::new(&path);
        let record = store.insert(registration("fish")).unwrap();
        assert_eq!(record.key, Some(11));
        assert_eq!(record.id, "stall-8");
        assert_eq!(record.name, "Stall 4");
        assert_eq!(record.status, StallStatus::Pending);
        assert_eq!(store.list().unwrap().len(), 3);
    }

    #[test]
    fn test_exhausted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stalls.json");
        let contents = format!(r#"[{{"key": {}, "id": "stall-1", "name": "Stall 1"}}]"#, u64::MAX);
        fs::write(&path, &contents).unwrap();

        let store = JsonStore::new(&path);
        assert!(matches!(store.insert(registration("Fish")), Err(StoreError::KeysExhausted { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_failed_rename_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stalls.json");
        // A non-empty directory can't be replaced by a file.
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "").unwrap();

        let store = JsonStore::new(&path);
        assert!(matches!(store.save(&[]), Err(StoreError::Io { .. })));
        assert!(!dir.path().join("stalls.json.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stalls.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonStore::new(&path);
        assert!(matches!(store.list(), Err(StoreError::Malformed { .. })));
        assert!(matches!(store.insert(registration("Fish")), Err(StoreError::Malformed { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }
}
