use super::models::Settings;
use config::{ConfigError, Environment, Map, Source, Value};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "VIDGRAB_CONFIG";
const SYSTEM_RC_PATH: &str = "/etc/vidgrabrc";
const USER_RC_NAME: &str = ".vidgrabrc";
const ENV_PREFIX: &str = "VIDGRAB";
const ENV_SEPARATOR: &str = "__";

/// Values coming from the command line; they win over every file
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub filename: Option<String>,
    pub play: bool,
    pub player: Option<String>,
    pub proxy: Option<String>,
    pub quality: Option<String>,
    pub subtitles: bool,
    pub info: bool,
    pub quiet: bool,
    pub debug: bool,
    pub yes: bool,
}

/// rc-style file: `key = value`, bare `key` for true, `#` comments
#[derive(Debug, Clone)]
pub struct RcFile {
    path: PathBuf,
}

impl RcFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for RcFile {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let mut values = Map::new();
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(values),
            Err(e) => return Err(ConfigError::Foreign(Box::new(e))),
        };

        let origin = self.path.display().to_string();
        for (number, line) in contents.lines().enumerate() {
            match parse_line(line) {
                Some((key, None)) => {
                    values.insert(key, Value::new(Some(&origin), true));
                }
                Some((key, Some(value))) => {
                    values.insert(key, Value::new(Some(&origin), value));
                }
                None if is_blank_or_comment(line) => {}
                None => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = number + 1,
                        "Ignoring unparseable configuration line"
                    );
                }
            }
        }

        Ok(values)
    }
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse one rc line into a normalised key and optional value
fn parse_line(line: &str) -> Option<(String, Option<String>)> {
    if is_blank_or_comment(line) {
        return None;
    }

    let (key, value) = match line.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.trim().to_string())),
        None => (line.trim(), None),
    };

    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }

    Some((key.to_ascii_lowercase().replace('-', "_"), value))
}

/// Default rc files, lowest priority first
pub fn default_paths() -> Vec<PathBuf> {
    let user = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(USER_RC_NAME)
        });

    vec![PathBuf::from(SYSTEM_RC_PATH), user]
}

/// Load settings from the default rc files, `.env`, environment and CLI
pub fn load(overrides: &SettingsOverrides) -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();
    load_from_sources(&default_paths(), overrides)
}

/// Load settings from explicit rc paths; later paths override earlier ones
pub fn load_from_sources(
    paths: &[PathBuf],
    overrides: &SettingsOverrides,
) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    for path in paths {
        if path.exists() {
            tracing::debug!("Loading configuration from: {}", path.display());
        }
        builder = builder.add_source(RcFile::new(path.clone()));
    }

    // VIDGRAB__PROXY -> proxy
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder = builder
        .set_override_option("filename", overrides.filename.clone())?
        .set_override_option("player", overrides.player.clone())?
        .set_override_option("proxy", overrides.proxy.clone())?
        .set_override_option("quality", overrides.quality.clone())?
        .set_override_option("play", overrides.play.then_some(true))?
        .set_override_option("subtitles", overrides.subtitles.then_some(true))?
        .set_override_option("info", overrides.info.then_some(true))?
        .set_override_option("quiet", overrides.quiet.then_some(true))?
        .set_override_option("debug", overrides.debug.then_some(true))?
        .set_override_option("yes", overrides.yes.then_some(true))?;

    builder.build()?.try_deserialize()
}
