//! Runtime configuration.
//!
//! The only external setting is the forecast CSV path. It is resolved as:
//! `--file` flag, then `FORECAST_CSV` (environment or `.env`), then
//! `Total_Forecast.csv` in the working directory.

use std::path::PathBuf;

use tracing::debug;

pub const DATA_PATH_ENV: &str = "FORECAST_CSV";
pub const DEFAULT_DATA_PATH: &str = "Total_Forecast.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
}

impl DashboardConfig {
    /// Build the config from an optional CLI flag plus the environment.
    pub fn from_env(file_flag: Option<PathBuf>) -> Self {
        dotenvy::dotenv().ok();
        let env_value = std::env::var(DATA_PATH_ENV).ok();
        let config = Self {
            data_path: resolve_data_path(file_flag, env_value),
        };
        debug!(path = %config.data_path.display(), "resolved forecast data path");
        config
    }
}

fn resolve_data_path(file_flag: Option<PathBuf>, env_value: Option<String>) -> PathBuf {
    if let Some(path) = file_flag {
        return path;
    }
    match env_value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => PathBuf::from(v),
        _ => PathBuf::from(DEFAULT_DATA_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_env_beats_default() {
        assert_eq!(
            resolve_data_path(Some(PathBuf::from("a.csv")), Some("b.csv".to_string())),
            PathBuf::from("a.csv")
        );
        assert_eq!(
            resolve_data_path(None, Some(" b.csv ".to_string())),
            PathBuf::from("b.csv")
        );
        assert_eq!(
            resolve_data_path(None, Some("  ".to_string())),
            PathBuf::from(DEFAULT_DATA_PATH)
        );
        assert_eq!(resolve_data_path(None, None), PathBuf::from(DEFAULT_DATA_PATH));
    }
}
