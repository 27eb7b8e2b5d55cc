use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://www.themealdb.com/api/json/v1/1";

pub struct Config {
    /// Primary SQLite database.
    pub db_path: PathBuf,
    /// Key-value file used when the database cannot be opened.
    pub kv_path: PathBuf,
    pub api_url: String,
}

impl Config {
    /// Resolve paths from the platform data directory, honouring
    /// `COOKBOOK_DATA_DIR` and `COOKBOOK_API_URL`.
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("COOKBOOK_DATA_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => ProjectDirs::from("", "", "cookbook")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        let api_url = std::env::var("COOKBOOK_API_URL").ok();
        Self::in_dir(data_dir, api_url)
    }

    pub fn in_dir(data_dir: PathBuf, api_url: Option<String>) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let api_url = api_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Config {
            db_path: data_dir.join("cookbook.db"),
            kv_path: data_dir.join("cookbook-kv.json"),
            api_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let config = Config::in_dir(data_dir.clone(), None).unwrap();

        assert!(data_dir.is_dir());
        assert_eq!(config.db_path, data_dir.join("cookbook.db"));
        assert_eq!(config.kv_path, data_dir.join("cookbook-kv.json"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_api_url_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::in_dir(
            dir.path().to_path_buf(),
            Some("http://localhost:9000/api/".to_string()),
        )
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:9000/api");

        let config = Config::in_dir(dir.path().to_path_buf(), Some("  ".to_string())).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
