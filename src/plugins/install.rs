//! Adding a plugin file from a local path or a URL

use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

use super::{PLUGIN_EXTENSION, PluginError, PluginStore};
use crate::session::Session;
use crate::update::atomic_replace;

/// Copy or download `source` into the plugin directory, returning the new path
///
/// The plugin keeps the final path segment of `source` as its file name.
pub async fn install(
    store: &PluginStore,
    source: &str,
    session: &Session,
) -> Result<PathBuf, PluginError> {
    let remote = Url::parse(source)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"));

    let file_name = match &remote {
        Some(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        None => Path::new(source)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string),
    }
    .filter(|name| is_plugin_file_name(name))
    .ok_or_else(|| PluginError::InvalidName(source.to_string()))?;

    let dir = store.dir();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PluginError::Io {
            action: "create",
            path: dir.to_path_buf(),
            source,
        })?;

    let target = dir.join(&file_name);
    match remote {
        Some(url) => atomic_replace(session, url.as_str(), &target, false).await?,
        None => {
            tokio::fs::copy(source, &target)
                .await
                .map_err(|e| PluginError::Io {
                    action: "copy",
                    path: PathBuf::from(source),
                    source: e,
                })?;
        }
    }

    info!(path = %target.display(), "Plugin installed");
    Ok(target)
}

fn is_plugin_file_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && ext == PLUGIN_EXTENSION,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::HttpConfig;
    use tempfile::TempDir;

    #[test]
    fn test_plugin_file_names() {
        assert!(is_plugin_file_name("Clips.toml"));
        assert!(!is_plugin_file_name("Clips.TOML"));
        assert!(!is_plugin_file_name("Clips.pm"));
        assert!(!is_plugin_file_name(".toml"));
        assert!(!is_plugin_file_name("Clips"));
    }

    #[tokio::test]
    async fn test_install_local_copies_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Clips.toml");
        std::fs::write(&source, "patterns = ['clips']\n").unwrap();

        let store = PluginStore::new(temp_dir.path().join("plugins"));
        let session = Session::new(HttpConfig::default()).unwrap();

        let installed = install(&store, &source.to_string_lossy(), &session)
            .await
            .unwrap();

        assert_eq!(installed, temp_dir.path().join("plugins/Clips.toml"));
        assert_eq!(
            std::fs::read_to_string(&installed).unwrap(),
            "patterns = ['clips']\n"
        );
        assert_eq!(store.names(), vec!["Clips"]);
    }

    #[tokio::test]
    async fn test_install_rejects_wrong_extension() {
        let temp_dir = TempDir::new().unwrap();
        let store = PluginStore::new(temp_dir.path());
        let session = Session::new(HttpConfig::default()).unwrap();

        let err = install(&store, "https://example.org/plugins/Clips.pm", &session)
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_install_rejects_uppercase_extension() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Clips.TOML");
        std::fs::write(&source, "patterns = ['clips']\n").unwrap();

        let store = PluginStore::new(temp_dir.path().join("plugins"));
        let session = Session::new(HttpConfig::default()).unwrap();

        let err = install(&store, &source.to_string_lossy(), &session)
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidName(_)));
        assert!(store.names().is_empty());
    }

    #[tokio::test]
    async fn test_install_missing_local_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = PluginStore::new(temp_dir.path().join("plugins"));
        let session = Session::new(HttpConfig::default()).unwrap();

        let missing = temp_dir.path().join("Nope.toml");
        let err = install(&store, &missing.to_string_lossy(), &session)
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::Io { action: "copy", .. }));
    }
}
