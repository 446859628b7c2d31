use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::UpdateError;
use super::descriptor::ReleaseDescriptor;
use super::replace::atomic_replace;
use super::version::Version;
use crate::config::{InstallMode, Settings};
use crate::interaction::Interaction;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate { current: Version },
    /// The executable was replaced or the upgrade command ran
    Updated { from: Version, to: Version },
    /// A managed upgrade was offered and refused
    Declined { available: Version },
}

/// Drives self-update and plugin update for one run
pub struct UpdateManager {
    pub(super) session: Session,
    update_url: String,
    install_mode: Option<InstallMode>,
    assume_yes: bool,
    current: Option<Version>,
    executable: Option<PathBuf>,
    interaction: Arc<dyn Interaction>,
}

impl UpdateManager {
    pub fn new(settings: &Settings, session: Session, interaction: Arc<dyn Interaction>) -> Self {
        Self {
            session,
            update_url: settings.update_url.clone(),
            install_mode: settings.install_mode,
            assume_yes: settings.yes,
            current: None,
            executable: None,
            interaction,
        }
    }

    /// Compare against this version instead of the build's own
    pub fn with_current_version(mut self, version: Version) -> Self {
        self.current = Some(version);
        self
    }

    /// Replace this file instead of the running executable
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    fn current_version(&self) -> Result<Version, UpdateError> {
        match &self.current {
            Some(version) => Ok(version.clone()),
            None => Ok(Version::current()?),
        }
    }

    fn executable(&self) -> Result<PathBuf, UpdateError> {
        match &self.executable {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe().map_err(UpdateError::CurrentExe),
        }
    }

    pub async fn fetch_descriptor(&self) -> Result<ReleaseDescriptor, UpdateError> {
        let page = self
            .session
            .get(&self.update_url)
            .await
            .map_err(|source| UpdateError::Fetch {
                url: self.update_url.clone(),
                source,
            })?;
        ReleaseDescriptor::parse(&page.body)
    }

    /// Update the program itself if a newer release is published
    pub async fn check_self_update(&self) -> Result<UpdateStatus, UpdateError> {
        let current = self.current_version()?;
        let descriptor = self.fetch_descriptor().await?;

        if !descriptor.version.is_newer_than(&current) {
            info!(current = %current, remote = %descriptor.version, "Already up to date");
            return Ok(UpdateStatus::UpToDate { current });
        }

        println!("Version {} is available (you have {}).", descriptor.version, current);
        if let Some(info) = &descriptor.info {
            println!("{}", info);
        }

        let executable = self.executable()?;
        let mode = self
            .install_mode
            .unwrap_or_else(|| InstallMode::detect(&executable));
        debug!(mode = ?mode, path = %executable.display(), "Install mode");

        match mode.upgrade_command() {
            Some(command) => {
                println!("This copy is managed by a package manager. Upgrade with:\n  {}", command);
                if !self.assume_yes && !self.interaction.confirm("Run it now?") {
                    return Ok(UpdateStatus::Declined {
                        available: descriptor.version,
                    });
                }
                run_upgrade(command).await?;
            }
            None => {
                let file_name = executable
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("vidgrab");
                let url = descriptor.download_url(file_name);
                info!(url = %url, path = %executable.display(), "Replacing executable");
                atomic_replace(&self.session, &url, &executable, true).await?;
            }
        }

        println!("Updated to {}.", descriptor.version);
        Ok(UpdateStatus::Updated {
            from: current,
            to: descriptor.version,
        })
    }
}

async fn run_upgrade(command: &str) -> Result<(), UpdateError> {
    let failed = |reason: String| UpdateError::UpgradeCommand {
        command: command.to_string(),
        reason,
    };

    let mut words = command.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| failed("empty command".to_string()))?;

    let status = tokio::process::Command::new(program)
        .args(words)
        .status()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !status.success() {
        return Err(failed(format!("exited with {}", status)));
    }
    Ok(())
}
