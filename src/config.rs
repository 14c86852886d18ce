use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://my-engineering-project.click/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    /// `None` means requests wait for the server indefinitely.
    pub request_timeout: Option<Duration>,
    pub photo_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
            photo_dir: PathBuf::from("."),
            log_file: None,
        }
    }
}

impl Config {
    /// Loads `.env.local` and `.env` (first one wins per key) and reads the process env.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key).and_then(|val| {
                let trimmed = val.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let defaults = Self::default();
        let api_url = get("LESION_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let request_timeout = get("LESION_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let photo_dir = get("LESION_PHOTO_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.photo_dir);
        let log_file = get("LESION_LOG_FILE").map(PathBuf::from);

        Self {
            api_url,
            request_timeout,
            photo_dir,
            log_file,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}
