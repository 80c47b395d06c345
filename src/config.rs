use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Runtime settings for the tracker. Loaded from a JSON file next to the
/// binary; a missing file is created with defaults so there is always one
/// on disk to edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    /// Census service id used on the stream and REST endpoints.
    pub service_id: String,
    /// World the login and facility channels listen on.
    pub server_id: String,
    /// Mirror every world event onto a debug channel and log dispatches.
    pub debug: bool,
    /// Character ids subscribed at startup.
    pub track_ids: Vec<String>,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            service_id: "s:example".to_owned(),
            server_id: "17".to_owned(),
            debug: false,
            track_ids: Vec::new(),
        }
    }
}

const SETTINGS_FILE: &str = "tracker-settings.json";

impl CoreSettings {
    pub fn load_or_create() -> Result<(Self, PathBuf)> {
        let path = PathBuf::from(SETTINGS_FILE);
        if !path.exists() {
            let defaults = Self::default();
            let payload = serde_json::to_string_pretty(&defaults)
                .context("failed serializing default settings")?;
            fs::write(&path, payload)
                .with_context(|| format!("failed writing settings at {}", path.display()))?;
            info!(path = %path.display(), "created default settings file");
            return Ok((defaults, path));
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed reading settings at {}", path.display()))?;
        let parsed = serde_json::from_str::<Self>(&text)
            .with_context(|| format!("invalid settings json at {}", path.display()))?;
        Ok((parsed, path))
    }
}

#[cfg(test)]
mod tests {
    use super::CoreSettings;

    #[test]
    fn defaults_listen_on_emerald() {
        let settings = CoreSettings::default();
        assert_eq!(settings.server_id, "17");
        assert!(settings.track_ids.is_empty());
        assert!(!settings.debug);
    }

    #[test]
    fn partial_settings_fill_from_defaults() {
        let parsed: CoreSettings =
            serde_json::from_str(r#"{"service_id":"s:mine"}"#).expect("parse");
        assert_eq!(parsed.service_id, "s:mine");
        assert_eq!(parsed.server_id, "17");
    }
}
