//! Configuration management for vidgrab
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. System rc file (`/etc/vidgrabrc`)
//! 3. User rc file (`~/.vidgrabrc`, or the path in `VIDGRAB_CONFIG`)
//! 4. Environment variables (`VIDGRAB__<KEY>`, `.env` honoured)
//! 5. Command-line flags
//!
//! # rc file format
//!
//! One setting per line, `key = value` or a bare `key` meaning `true`.
//! Lines starting with `#` and blank lines are ignored:
//!
//! ```text
//! # ~/.vidgrabrc
//! player = mplayer -really-quiet %s
//! quality = medium
//! subtitles
//! ```

mod models;
mod sources;
mod validation;

pub use models::{
    DEFAULT_PLAYER, DEFAULT_UPDATE_URL, InstallMode, Quality, Settings, config_root,
};
pub use sources::{RcFile, SettingsOverrides};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Settings {
    /// Load settings from every source, applying command-line overrides last
    pub fn load(overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        let settings = sources::load(overrides)?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from specific rc files
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_paths(
        paths: &[PathBuf],
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        let settings = sources::load_from_sources(paths, overrides)?;
        validation::validate(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_rc_file() {
        let temp_dir = TempDir::new().unwrap();
        let rc = temp_dir.path().join("vidgrabrc");

        fs::write(
            &rc,
            r#"
# player and network
player = vlc --play-and-exit %s
proxy = http://127.0.0.1:3128
quality = low
install-mode = standalone
plugins_dir = /tmp/vidgrab-plugins

subtitles
yes
"#,
        )
        .unwrap();

        let settings = Settings::load_from_paths(&[rc], &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.player, "vlc --play-and-exit %s");
        assert_eq!(settings.proxy.as_deref(), Some("http://127.0.0.1:3128"));
        assert_eq!(settings.quality, Quality::Low);
        assert_eq!(settings.install_mode, Some(InstallMode::Standalone));
        assert_eq!(settings.plugins_dir(), PathBuf::from("/tmp/vidgrab-plugins"));
        assert!(settings.subtitles);
        assert!(settings.yes);
    }

    #[test]
    fn test_validation_catches_bad_proxy() {
        let temp_dir = TempDir::new().unwrap();
        let rc = temp_dir.path().join("vidgrabrc");
        fs::write(&rc, "proxy = gopher://old:70\n").unwrap();

        let result = Settings::load_from_paths(&[rc], &SettingsOverrides::default());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::UnsupportedProxyScheme { .. })
        ));
    }
}
