use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_UPDATE_URL: &str = "https://vidgrab.github.io/release/latest.txt";
pub const DEFAULT_PLAYER: &str = "mpv --really-quiet {}";

/// Process-wide settings, threaded explicitly into each component
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Explicit save-as filename (overrides every handler suggestion)
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub play: bool,
    #[serde(default = "default_player")]
    pub player: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub subtitles: bool,
    /// Print stream metadata instead of downloading
    #[serde(default)]
    pub info: bool,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default)]
    pub debug: bool,
    /// Answer yes to every question and never prompt
    #[serde(default)]
    pub yes: bool,
    #[serde(default = "default_update_url")]
    pub update_url: String,
    #[serde(default)]
    pub plugins_dir: Option<PathBuf>,
    /// Unset means detect from the executable location
    #[serde(default)]
    pub install_mode: Option<InstallMode>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filename: None,
            play: false,
            player: default_player(),
            proxy: None,
            quality: Quality::default(),
            subtitles: false,
            info: false,
            quiet: false,
            debug: false,
            yes: false,
            update_url: default_update_url(),
            plugins_dir: None,
            install_mode: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    /// Directory holding installed plugin files
    pub fn plugins_dir(&self) -> PathBuf {
        self.plugins_dir
            .clone()
            .unwrap_or_else(|| config_root().join("plugins"))
    }
}

/// Per-user configuration root (`~/.vidgrab`)
pub fn config_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vidgrab")
}

fn default_player() -> String {
    DEFAULT_PLAYER.to_string()
}

fn default_update_url() -> String {
    DEFAULT_UPDATE_URL.to_string()
}

fn default_user_agent() -> String {
    concat!("vidgrab/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Preferred stream quality when a handler offers several
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    High,
    Medium,
    Low,
}

impl Quality {
    /// Pick an index out of `available` candidates ordered best first
    pub fn pick(&self, available: usize) -> Option<usize> {
        if available == 0 {
            return None;
        }
        Some(match self {
            Quality::High => 0,
            Quality::Medium => available / 2,
            Quality::Low => available - 1,
        })
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Quality::High),
            "medium" | "m" => Ok(Quality::Medium),
            "low" | "l" => Ok(Quality::Low),
            other => Err(format!("unknown quality '{}', expected high, medium or low", other)),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
        };
        f.write_str(name)
    }
}

/// How this copy of the program was installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Plain binary the program may replace itself
    Standalone,
    /// Installed through `cargo install`
    Cargo,
    /// Owned by the system package manager
    System,
}

impl InstallMode {
    /// Guess the install mode from where the executable lives
    pub fn detect(exe: &std::path::Path) -> Self {
        let cargo_bin = dirs::home_dir().map(|home| home.join(".cargo").join("bin"));
        if cargo_bin.is_some_and(|bin| exe.starts_with(bin)) {
            InstallMode::Cargo
        } else if exe.starts_with("/usr/bin") || exe.starts_with("/usr/sbin") {
            InstallMode::System
        } else {
            InstallMode::Standalone
        }
    }

    /// Upgrade command for managed installs
    pub fn upgrade_command(&self) -> Option<&'static str> {
        match self {
            InstallMode::Standalone => None,
            InstallMode::Cargo => Some("cargo install vidgrab --force"),
            InstallMode::System => Some("sudo apt-get install --only-upgrade vidgrab"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_quality_pick() {
        assert_eq!(Quality::High.pick(3), Some(0));
        assert_eq!(Quality::Medium.pick(3), Some(1));
        assert_eq!(Quality::Low.pick(3), Some(2));
        assert_eq!(Quality::Low.pick(0), None);
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!("HIGH".parse::<Quality>().unwrap(), Quality::High);
        assert_eq!("l".parse::<Quality>().unwrap(), Quality::Low);
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn test_install_mode_detection() {
        assert_eq!(InstallMode::detect(Path::new("/usr/bin/vidgrab")), InstallMode::System);
        assert_eq!(
            InstallMode::detect(Path::new("/opt/tools/vidgrab")),
            InstallMode::Standalone
        );
        assert!(InstallMode::Standalone.upgrade_command().is_none());
        assert!(InstallMode::Cargo.upgrade_command().is_some());
    }
}
