//! Daemon settings: `config.json` in the data directory, then env overrides.

use std::path::Path;

use plexus::config::{FiringMode, NetworkConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DaemonError;

pub const DEFAULT_ADDR: &str = "127.0.0.1:9877";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub listen_addr: String,
    pub network: NetworkConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_ADDR.to_string(),
            network: NetworkConfig::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, DaemonError> {
        if !path.exists() {
            info!("No config at {:?}; using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)?;
        info!("Loaded config from {:?}", path);
        Ok(settings)
    }

    /// Apply `PLEXUS_MODE`, `PLEXUS_SEED` and `PLEXUS_ADDR` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), DaemonError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), DaemonError> {
        if let Some(v) = lookup("PLEXUS_MODE") {
            self.network.mode = v.parse::<FiringMode>().map_err(|e| DaemonError::Setting {
                key: "PLEXUS_MODE",
                reason: e.to_string(),
            })?;
        }
        if let Some(v) = lookup("PLEXUS_SEED") {
            let seed = v.trim().parse::<u64>().map_err(|e| DaemonError::Setting {
                key: "PLEXUS_SEED",
                reason: e.to_string(),
            })?;
            self.network.seed = Some(seed);
        }
        if let Some(v) = lookup("PLEXUS_ADDR") {
            self.listen_addr = v;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{ "network": { "size": 64, "mode": "random" } }"#).unwrap();
        assert_eq!(s.listen_addr, DEFAULT_ADDR);
        assert_eq!(s.network.size, 64);
        assert_eq!(s.network.mode, FiringMode::Random);
        assert_eq!(s.network.precision, NetworkConfig::default().precision);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [("PLEXUS_MODE", "random"), ("PLEXUS_SEED", "99")]
            .into_iter()
            .collect();
        let mut s = Settings::default();
        s.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(s.network.mode, FiringMode::Random);
        assert_eq!(s.network.seed, Some(99));
    }

    #[test]
    fn bad_override_is_reported() {
        let mut s = Settings::default();
        let err = s
            .apply_overrides(|k| (k == "PLEXUS_SEED").then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, DaemonError::Setting { key: "PLEXUS_SEED", .. }));
    }

    #[test]
    fn missing_file_means_defaults() {
        let s = Settings::load(Path::new("/nonexistent/plexus/config.json")).unwrap();
        assert_eq!(s, Settings::default());
    }
}
