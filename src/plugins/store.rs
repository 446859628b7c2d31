use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::PLUGIN_EXTENSION;

/// Installed plugin file, rebuilt from the directory on every scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub update_urls: Vec<String>,
}

/// Plugin file contents together with the descriptor they came from
#[derive(Debug, Clone)]
pub struct PluginSource {
    pub descriptor: PluginDescriptor,
    pub contents: String,
}

/// Just enough of a plugin file to build its descriptor
#[derive(Debug, Default, Deserialize)]
struct PluginHeader {
    #[serde(default)]
    update_urls: Vec<String>,
}

/// Directory of installable handler files, one `<Name>.toml` per handler
#[derive(Debug, Clone)]
pub struct PluginStore {
    dir: PathBuf,
}

impl PluginStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the handler `name` lives (whether or not it exists)
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PLUGIN_EXTENSION))
    }

    /// All installed plugins, sorted by name; a missing directory is empty
    pub fn scan(&self) -> Vec<PluginDescriptor> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "Plugin directory not readable");
                return Vec::new();
            }
        };

        let mut plugins: Vec<PluginDescriptor> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_plugin_extension(path))
            .filter_map(|path| {
                let contents = match fs::read_to_string(&path) {
                    Ok(contents) => contents,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable plugin");
                        return None;
                    }
                };
                descriptor_from(&path, &contents)
            })
            .collect();

        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    /// Names of installed plugins
    pub fn names(&self) -> Vec<String> {
        self.scan().into_iter().map(|plugin| plugin.name).collect()
    }

    /// Read the plugin for `name`; absence is a normal outcome
    pub fn source(&self, name: &str) -> Option<PluginSource> {
        let path = self.path_for(name);
        debug!(handler = name, path = %path.display(), "Probing plugin directory");

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Plugin exists but cannot be read");
                }
                return None;
            }
        };

        let descriptor = descriptor_from(&path, &contents)?;
        Some(PluginSource {
            descriptor,
            contents,
        })
    }
}

/// Exact `.toml`, so every listed name is one `source` can open
fn has_plugin_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == PLUGIN_EXTENSION)
}

fn descriptor_from(path: &Path, contents: &str) -> Option<PluginDescriptor> {
    let name = path.file_stem()?.to_str()?.to_string();

    let header: PluginHeader = toml::from_str(contents).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Plugin header unreadable, no update URLs");
        PluginHeader::default()
    });

    Some(PluginDescriptor {
        name,
        path: path.to_path_buf(),
        update_urls: header.update_urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_plugin(dir: &Path, file: &str, contents: &str) {
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = PluginStore::new(temp_dir.path().join("nope"));
        assert!(store.scan().is_empty());
    }

    #[test]
    fn test_scan_reads_descriptors_sorted() {
        let temp_dir = TempDir::new().unwrap();
        write_plugin(
            temp_dir.path(),
            "Zeta.toml",
            "patterns = ['zeta']\nupdate_urls = ['https://example.org/Zeta.toml']\n",
        );
        write_plugin(temp_dir.path(), "Alpha.toml", "patterns = ['alpha']\n");
        write_plugin(temp_dir.path(), "README.md", "not a plugin");

        let store = PluginStore::new(temp_dir.path());
        let plugins = store.scan();

        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].name, "Alpha");
        assert!(plugins[0].update_urls.is_empty());
        assert_eq!(plugins[1].name, "Zeta");
        assert_eq!(plugins[1].update_urls, vec!["https://example.org/Zeta.toml"]);
        assert_eq!(store.names(), vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_source_absent_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = PluginStore::new(temp_dir.path());
        assert!(store.source("Missing").is_none());
    }

    #[test]
    fn test_source_returns_contents() {
        let temp_dir = TempDir::new().unwrap();
        write_plugin(temp_dir.path(), "Clips.toml", "patterns = ['clips']\n");

        let store = PluginStore::new(temp_dir.path());
        let source = store.source("Clips").unwrap();
        assert_eq!(source.descriptor.name, "Clips");
        assert_eq!(source.descriptor.path, temp_dir.path().join("Clips.toml"));
        assert!(source.contents.contains("clips"));
    }

    #[test]
    fn test_listed_plugins_are_all_loadable() {
        let temp_dir = TempDir::new().unwrap();
        write_plugin(temp_dir.path(), "Clips.toml", "patterns = ['clips']\n");
        write_plugin(temp_dir.path(), "Shouty.TOML", "patterns = ['shouty']\n");

        let store = PluginStore::new(temp_dir.path());
        assert_eq!(store.names(), vec!["Clips"]);
        for name in store.names() {
            assert!(store.source(&name).is_some(), "{} listed but not loadable", name);
        }
        assert!(store.source("Shouty").is_none());
    }
}
