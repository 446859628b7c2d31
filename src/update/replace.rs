//! Replace a file by downloading next to it and renaming into place

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::UpdateError;
use crate::download::fetch_to_file;
use crate::session::Session;

/// `target` with `.suffix` appended to its file name
fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    target.with_file_name(name)
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> UpdateError {
    let path = path.to_path_buf();
    move |source| UpdateError::Io {
        action,
        path,
        source,
    }
}

/// Download `url` to `<target>.new`, move `target` aside to `<target>.old`,
/// then rename the new file into place keeping the old permission bits
///
/// With `executable` set the owner/group/other execute bits are added.
pub async fn atomic_replace(
    session: &Session,
    url: &str,
    target: &Path,
    executable: bool,
) -> Result<(), UpdateError> {
    let staged = sibling(target, "new");
    let backup = sibling(target, "old");

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error("create", parent))?;
    }

    debug!(url, path = %staged.display(), "Staging replacement");
    fetch_to_file(session, url, &staged)
        .await
        .map_err(|source| UpdateError::Transfer {
            url: url.to_string(),
            source,
        })?;

    let previous = tokio::fs::metadata(target).await.ok();
    if previous.is_some() {
        tokio::fs::rename(target, &backup)
            .await
            .map_err(io_error("move aside", target))?;
    }

    if let Err(e) = tokio::fs::rename(&staged, target).await {
        if previous.is_some() {
            if let Err(restore) = tokio::fs::rename(&backup, target).await {
                warn!(path = %target.display(), error = %restore, "Could not restore previous file");
            }
        }
        return Err(io_error("install", target)(e));
    }

    let permissions = previous.map(|meta| meta.permissions());
    restore_permissions(target, permissions, executable).await?;

    info!(path = %target.display(), "Replaced");
    Ok(())
}

#[cfg(unix)]
async fn restore_permissions(
    target: &Path,
    previous: Option<std::fs::Permissions>,
    executable: bool,
) -> Result<(), UpdateError> {
    use std::os::unix::fs::PermissionsExt;

    let mut mode = match previous {
        Some(perms) => perms.mode(),
        None if executable => 0o755,
        None => return Ok(()),
    };
    if executable {
        mode |= 0o111;
    }

    tokio::fs::set_permissions(target, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(io_error("set permissions on", target))
}

#[cfg(not(unix))]
async fn restore_permissions(
    target: &Path,
    previous: Option<std::fs::Permissions>,
    _executable: bool,
) -> Result<(), UpdateError> {
    match previous {
        Some(perms) => tokio::fs::set_permissions(target, perms)
            .await
            .map_err(io_error("set permissions on", target)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_names() {
        assert_eq!(
            sibling(Path::new("/opt/bin/vidgrab"), "new"),
            PathBuf::from("/opt/bin/vidgrab.new")
        );
        assert_eq!(
            sibling(Path::new("plugins/Clips.toml"), "old"),
            PathBuf::from("plugins/Clips.toml.old")
        );
    }
}
