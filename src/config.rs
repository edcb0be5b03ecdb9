use std::path::Path;

use crate::error::{Context, Error, Result};

/// Environment variable holding the aggregates API key.
pub const API_KEY_VAR: &str = "POLYGON_API_KEY";

/// Explicit configuration passed into fetch calls.
///
/// Environment loading is an optional collaborator: callers that already hold
/// a key can build `Settings` directly (or pass the key on the request) and
/// never touch the process environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api_key: Option<String>,
}

impl Settings {
    pub fn with_api_key<T: Into<String>>(api_key: T) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// Load settings from the process environment, reading a `.env` file in
    /// the working directory first if one exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            api_key: read_key_var(),
        }
    }

    /// Load settings from a specific env file.
    pub fn from_env_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
        Ok(Self {
            api_key: read_key_var(),
        })
    }

    /// Resolve the key for an aggregates call: an explicit request key wins,
    /// then the settings key. Blank values count as absent.
    pub(crate) fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(key) = non_blank(explicit) {
            return Ok(key.to_string());
        }
        non_blank(self.api_key.as_deref())
            .map(str::to_string)
            .ok_or(Error::MissingApiKey)
    }
}

fn read_key_var() -> Option<String> {
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_wins_over_settings() {
        let settings = Settings::with_api_key("from-settings");
        let key = settings.resolve_api_key(Some("from-call")).unwrap();
        assert_eq!(key, "from-call");
    }

    #[test]
    fn settings_key_used_when_no_explicit_key() {
        let settings = Settings::with_api_key("from-settings");
        let key = settings.resolve_api_key(None).unwrap();
        assert_eq!(key, "from-settings");
    }

    #[test]
    fn missing_key_is_an_error() {
        let settings = Settings::default();
        assert!(matches!(
            settings.resolve_api_key(None),
            Err(Error::MissingApiKey)
        ));
    }

    #[test]
    fn from_env_file_reads_the_key() {
        let path = std::env::temp_dir().join(format!("aggfetch-test-{}.env", std::process::id()));
        std::fs::write(&path, format!("{}=from-file\n", API_KEY_VAR)).unwrap();
        // dotenvy never overrides an existing variable, so clear it first.
        std::env::remove_var(API_KEY_VAR);

        let settings = Settings::from_env_file(&path).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("from-file"));

        std::env::remove_var(API_KEY_VAR);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_env_file_fails_on_a_missing_file() {
        let path = std::env::temp_dir().join("aggfetch-test-does-not-exist.env");
        assert!(Settings::from_env_file(&path).is_err());
    }

    #[test]
    fn blank_keys_count_as_absent() {
        let settings = Settings::with_api_key("   ");
        assert!(matches!(
            settings.resolve_api_key(Some("")),
            Err(Error::MissingApiKey)
        ));
    }
}
