//! Process-wide forecast table store.
//!
//! A table is read and normalized at most once per distinct path; later calls
//! return the same `Arc`. There is no invalidation: a changed file is only
//! picked up by a new process. Failed loads are not remembered, so a missing
//! file that later appears will load on the next call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info};

use crate::domain::ForecastTable;
use crate::error::AppError;
use crate::io::ingest::load_forecast_csv;

/// Write-once cache of loaded tables keyed by the path as given.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: Mutex<HashMap<PathBuf, Arc<ForecastTable>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on first use.
    ///
    /// The lock is held across the read so concurrent callers never load the
    /// same path twice.
    pub fn load(&self, path: &Path) -> Result<Arc<ForecastTable>, AppError> {
        // A poisoned lock only means another loader panicked; the map itself
        // holds fully built tables and stays usable.
        let mut tables = self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(table) = tables.get(path) {
            debug!(path = %path.display(), "forecast table cache hit");
            return Ok(Arc::clone(table));
        }

        debug!(path = %path.display(), "forecast table cache miss");
        let table = Arc::new(load_forecast_csv(path)?);
        info!(path = %path.display(), rows = table.len(), "loaded forecast table");
        tables.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.tables.lock().map(|t| t.len()).unwrap_or_else(|p| p.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn global() -> &'static TableCache {
    static CACHE: OnceLock<TableCache> = OnceLock::new();
    CACHE.get_or_init(TableCache::new)
}

/// Load (or fetch from the process-wide cache) the table at `path`.
pub fn load(path: &Path) -> Result<Arc<ForecastTable>, AppError> {
    global().load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV: &str = concat!(
        "Villa,Date,Forecast,CI Lower (30%),CI Upper (30%)\n",
        "Villa A,2025-01-31,1000,700,1300\n",
        "Villa A - Expense,2025-01-31,200,140,260\n",
    );

    #[test]
    fn second_load_is_a_cache_hit_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        fs::write(&path, CSV).unwrap();

        let cache = TableCache::new();
        let first = cache.load(&path).unwrap();

        // Remove the file: a re-read would now fail with NotFound.
        fs::remove_file(&path).unwrap();
        let second = cache.load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_not_found_and_not_cached() {
        let cache = TableCache::new();
        let err = cache.load(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_load_can_succeed_later() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.csv");
        let cache = TableCache::new();

        assert!(cache.load(&path).is_err());
        fs::write(&path, CSV).unwrap();
        assert_eq!(cache.load(&path).unwrap().len(), 2);
    }

    #[test]
    fn distinct_paths_are_cached_separately() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, CSV).unwrap();
        fs::write(&b, "Villa,Date,Forecast\nVilla C,2025-01-31,5\n").unwrap();

        let cache = TableCache::new();
        assert_eq!(cache.load(&a).unwrap().len(), 2);
        assert_eq!(cache.load(&b).unwrap().len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn process_wide_load_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.csv");
        fs::write(&path, CSV).unwrap();

        let first = load(&path).unwrap();
        fs::write(&path, "Villa,Date,Forecast\n").unwrap();
        let second = load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn concurrent_loads_share_one_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.csv");
        fs::write(&path, CSV).unwrap();

        let cache = Arc::new(TableCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let path = path.clone();
                std::thread::spawn(move || cache.load(&path).unwrap())
            })
            .collect();
        let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for t in &tables[1..] {
            assert!(Arc::ptr_eq(&tables[0], t));
        }
    }
}
