//! Cross-platform application paths

use std::fs;
use std::path::PathBuf;

use crate::error::DaemonError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, DaemonError> {
        let data_dir = Self::get_data_dir()?;

        // Ensure directory exists
        fs::create_dir_all(&data_dir)?;

        Ok(Self { data_dir })
    }

    /// Paths rooted at an explicit directory (tests, `PLEXUS_DATA_DIR`).
    pub fn at(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn get_data_dir() -> Result<PathBuf, DaemonError> {
        if let Some(dir) = std::env::var_os("PLEXUS_DATA_DIR") {
            return Ok(PathBuf::from(dir));
        }
        let base = dirs::data_dir().ok_or(DaemonError::NoDataDir)?;
        Ok(base.join("plexus"))
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn config_lives_in_the_data_dir() {
        let paths = AppPaths::at(PathBuf::from("/tmp/plexus-test"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/plexus-test/config.json"));
    }

    #[test]
    fn written_settings_are_read_back() {
        let dir = std::env::temp_dir().join(format!("plexusd-paths-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let paths = AppPaths::at(dir.clone());

        fs::write(
            paths.config_file(),
            r#"{ "listen_addr": "127.0.0.1:1", "network": { "size": 32, "seed": 9 } }"#,
        )
        .unwrap();
        let settings = Settings::load(&paths.config_file()).unwrap();
        assert_eq!(settings.listen_addr, "127.0.0.1:1");
        assert_eq!(settings.network.size, 32);
        assert_eq!(settings.network.seed, Some(9));

        fs::remove_dir_all(&dir).unwrap();
    }
}
