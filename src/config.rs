use std::path::PathBuf;
use std::time::Duration;

use crate::matrix::Keying;

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// Runtime settings, read from `SHOEGRID_*` environment variables.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Root of the shop's REST backend
    pub api_url: String,
    pub upload_url: String,
    /// Listen address of the admin API
    pub bind: String,
    /// Offline file catalog
    pub data_dir: PathBuf,
    /// Offline image store
    pub media_dir: PathBuf,
    pub default_image: String,
    pub keying: Keying,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source. Unset or empty values
    /// fall back to defaults, and so do values that fail to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let text = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        Self {
            api_url: text("SHOEGRID_API_URL", "http://localhost:8080/api"),
            upload_url: text("SHOEGRID_UPLOAD_URL", "http://localhost:8080/api/upload"),
            bind: text("SHOEGRID_BIND", "127.0.0.1:3000"),
            data_dir: PathBuf::from(text("SHOEGRID_DATA_DIR", "database")),
            media_dir: PathBuf::from(text("SHOEGRID_MEDIA_DIR", "media")),
            default_image: text("SHOEGRID_DEFAULT_IMAGE", DEFAULT_PLACEHOLDER_IMAGE),
            keying: var("SHOEGRID_MATRIX_KEYING")
                .and_then(|v| v.parse::<Keying>().ok())
                .unwrap_or_default(),
            http_timeout: Duration::from_millis(
                var("SHOEGRID_HTTP_TIMEOUT_MS")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(10_000),
            ),
        }
    }
}
