use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DietError, Result};
use crate::models::{DailyLog, LineItem, Plan};

const PLAN_FILE: &str = "plan.json";
const LOGS_DIR: &str = "logs";

/// Keyed document storage for the plan and the per-day logs.
///
/// Loading something that was never saved is not an error: it yields an
/// empty plan or log.
pub trait Store {
    fn load_plan(&self) -> Result<Plan>;
    fn save_plan(&mut self, plan: &Plan) -> Result<()>;
    fn load_log(&self, date: NaiveDate) -> Result<DailyLog>;
    fn save_log(&mut self, log: &DailyLog) -> Result<()>;
    /// Dates with a saved log, oldest first.
    fn list_log_dates(&self) -> Result<Vec<NaiveDate>>;
}

/// One pretty-printed JSON document per key under a root directory:
/// `plan.json` and `logs/YYYY-MM-DD.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn plan_path(&self) -> PathBuf {
        self.root.join(PLAN_FILE)
    }

    fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.logs_dir().join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DietError::storage(path, e)),
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| DietError::storage(path, e))?;
        tracing::debug!(path = %path.display(), "read document");
        Ok(Some(value))
    }

    /// Whole-document overwrite through a sibling temp file and a rename, so a
    /// crash mid-write leaves the previous document intact.
    fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| DietError::storage(path, "document path has no parent directory"))?;
        fs::create_dir_all(dir).map_err(|e| DietError::storage(dir, e))?;

        let json = serde_json::to_vec_pretty(value).map_err(|e| DietError::storage(path, e))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| DietError::storage(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            DietError::storage(path, e)
        })?;
        tracing::debug!(path = %path.display(), "wrote document");
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn load_plan(&self) -> Result<Plan> {
        Ok(Self::read_document(&self.plan_path())?.unwrap_or_default())
    }

    fn save_plan(&mut self, plan: &Plan) -> Result<()> {
        Self::write_document(&self.plan_path(), plan)
    }

    fn load_log(&self, date: NaiveDate) -> Result<DailyLog> {
        let items: Option<Vec<LineItem>> = Self::read_document(&self.log_path(date))?;
        Ok(DailyLog {
            date,
            items: items.unwrap_or_default(),
        })
    }

    fn save_log(&mut self, log: &DailyLog) -> Result<()> {
        Self::write_document(&self.log_path(log.date), &log.items)
    }

    fn list_log_dates(&self) -> Result<Vec<NaiveDate>> {
        let dir = self.logs_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DietError::storage(&dir, e)),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| DietError::storage(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                dates.push(date);
            }
        }
        dates.sort_unstable();
        Ok(dates)
    }
}

/// Keeps documents in memory; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    plan: Option<Plan>,
    logs: BTreeMap<NaiveDate, Vec<LineItem>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load_plan(&self) -> Result<Plan> {
        Ok(self.plan.clone().unwrap_or_default())
    }

    fn save_plan(&mut self, plan: &Plan) -> Result<()> {
        self.plan = Some(plan.clone());
        Ok(())
    }

    fn load_log(&self, date: NaiveDate) -> Result<DailyLog> {
        Ok(DailyLog {
            date,
            items: self.logs.get(&date).cloned().unwrap_or_default(),
        })
    }

    fn save_log(&mut self, log: &DailyLog) -> Result<()> {
        self.logs.insert(log.date, log.items.clone());
        Ok(())
    }

    fn list_log_dates(&self) -> Result<Vec<NaiveDate>> {
        Ok(self.logs.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rice() -> LineItem {
        LineItem {
            food: "rice".to_string(),
            grams: 200.0,
            kcal: 260.0,
            protein: 5.4,
            carb: 56.0,
            fat: 0.6,
        }
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let plan = store.load_plan().unwrap();
        assert!(plan.is_empty());
        assert!(plan.totals().is_zero());
        let log = store.load_log(date("2024-06-15")).unwrap();
        assert!(log.is_empty());
        assert!(store.list_log_dates().unwrap().is_empty());
    }

    #[test]
    fn test_plan_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        let mut plan = Plan::new();
        plan.add_meal("Lunch").unwrap();
        plan.push_item("Lunch", rice()).unwrap();
        store.save_plan(&plan).unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.load_plan().unwrap(), plan);
        assert!(dir.path().join("plan.json").exists());
        assert!(!dir.path().join("plan.json.tmp").exists());
    }

    #[test]
    fn test_log_document_is_a_bare_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        let mut log = DailyLog::empty(date("2024-06-15"));
        log.push(rice());
        store.save_log(&log).unwrap();

        let raw = fs::read_to_string(dir.path().join("logs/2024-06-15.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["food"], "rice");

        assert_eq!(store.load_log(date("2024-06-15")).unwrap(), log);
        assert!(store.load_log(date("2024-06-16")).unwrap().is_empty());
    }

    #[test]
    fn test_list_log_dates_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        for d in ["2024-06-17", "2024-06-15"] {
            store.save_log(&DailyLog::empty(date(d))).unwrap();
        }
        fs::write(dir.path().join("logs/notes.txt"), "x").unwrap();
        fs::write(dir.path().join("logs/not-a-date.json"), "[]").unwrap();
        assert_eq!(
            store.list_log_dates().unwrap(),
            vec![date("2024-06-15"), date("2024-06-17")]
        );
    }

    #[test]
    fn test_corrupt_document_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plan.json"), "{not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        let err = store.load_plan().unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_unwritable_root_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let mut store = JsonFileStore::new(&blocker);
        let err = store.save_log(&DailyLog::empty(date("2024-06-15"))).unwrap_err();
        assert!(matches!(err, DietError::StorageUnavailable { .. }));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.load_plan().unwrap().is_empty());
        let mut log = DailyLog::empty(date("2024-06-15"));
        log.push(rice());
        store.save_log(&log).unwrap();
        assert_eq!(store.load_log(date("2024-06-15")).unwrap(), log);
        assert_eq!(store.list_log_dates().unwrap(), vec![date("2024-06-15")]);
    }
}
