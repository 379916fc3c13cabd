// JSON file store with atomic writes
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::reading::Reading;

pub const DEFAULT_QUERY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("device {0} already exists")]
    DeviceExists(String),

    #[error("unknown device {0}")]
    UnknownDevice(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("store file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub meta: Map<String, Value>,
    pub registered_at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DataFile {
    devices: HashMap<String, DeviceRecord>,
    telemetry: HashMap<String, Vec<Reading>>,
}

/// Single-file JSON persistence for devices and their readings.
///
/// Access is serialized through one mutex; every mutation rewrites the whole
/// file through a temp file in the same directory so a crash can never leave
/// a half-written store behind.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn register_device(
        &self,
        device_id: &str,
        meta: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.with_write(|data| {
            if data.devices.contains_key(device_id) {
                return Err(StoreError::DeviceExists(device_id.to_string()));
            }
            data.devices.insert(
                device_id.to_string(),
                DeviceRecord {
                    meta,
                    registered_at: now_iso(),
                },
            );
            data.telemetry.entry(device_id.to_string()).or_default();
            Ok(())
        })
    }

    pub fn list_devices(&self) -> Result<HashMap<String, DeviceRecord>, StoreError> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_all()?.devices)
    }

    pub fn store_telemetry(&self, device_id: &str, reading: Reading) -> Result<(), StoreError> {
        self.with_write(|data| {
            if !data.devices.contains_key(device_id) {
                return Err(StoreError::UnknownDevice(device_id.to_string()));
            }
            data.telemetry
                .entry(device_id.to_string())
                .or_default()
                .push(reading);
            Ok(())
        })
    }

    /// The last `limit` readings for a device, optionally filtered to an
    /// RFC 3339 `[start, end]` range first. When a range is given, readings
    /// whose timestamps do not parse are dropped. Unknown devices yield an
    /// empty list, not an error.
    pub fn get_telemetry(
        &self,
        device_id: &str,
        start: Option<&str>,
        end: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Reading>, StoreError> {
        let _guard = self.lock.lock().unwrap();
        let data = self.read_all()?;
        let Some(items) = data.telemetry.get(device_id) else {
            return Ok(Vec::new());
        };

        let mut items = items.clone();
        if start.is_some() || end.is_some() {
            let start_at = start.and_then(parse_iso);
            let end_at = end.and_then(parse_iso);
            items.retain(|reading| match parse_iso(&reading.timestamp) {
                Some(at) => {
                    start_at.is_none_or(|s| at >= s) && end_at.is_none_or(|e| at <= e)
                }
                None => false,
            });
        }

        let keep_from = items.len().saturating_sub(limit);
        Ok(items.split_off(keep_from))
    }

    fn with_write<T>(
        &self,
        mutate: impl FnOnce(&mut DataFile) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().unwrap();
        let mut data = self.read_all()?;
        let result = mutate(&mut data)?;
        self.write_atomic(&data)?;
        Ok(result)
    }

    fn read_all(&self) -> Result<DataFile, StoreError> {
        if !self.path.exists() {
            return Ok(DataFile::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_atomic(&self, data: &DataFile) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_iso(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}
