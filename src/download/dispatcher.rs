//! Routing work items to transport backends

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::backends::{Backends, Player, TransportError};
use super::filename::title_from_filename;
use super::parts;
use super::plan::{FilenamePolicy, WorkItem, plan};
use crate::config::Settings;
use crate::handlers::{ExtractionResult, TransportKind};
use crate::humanize::ByteSize;
use crate::interaction::Interaction;
use crate::session::Session;

/// What the backends are asked to do, chosen once per batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Play,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed {
        files: Vec<PathBuf>,
        /// Parts already present at their expected size
        skipped: usize,
    },
    /// Metadata was printed; the batch stops here
    InfoShown,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("the handler returned no streams")]
    Empty,

    #[error("{}: {source}", .target.display())]
    Transport {
        target: PathBuf,
        #[source]
        source: TransportError,
    },
}

pub struct Dispatcher {
    backends: Backends,
    player: Player,
    action: Action,
    info_only: bool,
    explicit_filename: Option<String>,
    interactive: bool,
    interaction: Arc<dyn Interaction>,
}

impl Dispatcher {
    pub fn new(settings: &Settings, interactive: bool, interaction: Arc<dyn Interaction>) -> Self {
        Self {
            backends: Backends::standard(),
            player: Player::new(settings.player.clone()),
            action: if settings.play {
                Action::Play
            } else {
                Action::Download
            },
            info_only: settings.info,
            explicit_filename: settings.filename.clone(),
            interactive: interactive && !settings.yes,
            interaction,
        }
    }

    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Download (or play, or describe) everything one URL produced
    ///
    /// Items run strictly in order and the first failure stops the rest.
    pub async fn dispatch(
        &self,
        session: &Session,
        result: &ExtractionResult,
        remaining: usize,
    ) -> Result<DispatchOutcome, DispatchError> {
        let policy = FilenamePolicy {
            explicit: self.explicit_filename.as_deref(),
            interactive: self.interactive,
            interaction: self.interaction.as_ref(),
        };
        let items = plan(result, &policy);
        if items.is_empty() {
            return Err(DispatchError::Empty);
        }

        if self.info_only {
            self.show_info(session, &items).await;
            return Ok(DispatchOutcome::InfoShown);
        }

        info!(items = items.len(), remaining, action = ?self.action, "Dispatching");

        let mut files = Vec::with_capacity(items.len());
        let mut skipped = 0;

        for item in &items {
            let failed = |source: TransportError| DispatchError::Transport {
                target: item.target.clone(),
                source,
            };

            if item.expected_size.is_some()
                && parts::is_complete(&item.target, item.expected_size).await
            {
                info!(path = %item.target.display(), "Part already downloaded, skipping");
                skipped += 1;
                if self.action == Action::Play {
                    self.player
                        .launch(&item.target.to_string_lossy())
                        .await
                        .map_err(failed)?;
                }
                files.push(item.target.clone());
                continue;
            }

            let backend = self.backends.get(item.transport()).map_err(failed)?;
            let outcome = match self.action {
                Action::Download => backend.download(item, session).await,
                Action::Play => backend.play(item, session, &self.player).await,
            };
            outcome.map_err(failed)?;

            files.push(item.target.clone());
        }

        Ok(DispatchOutcome::Completed { files, skipped })
    }

    async fn show_info(&self, session: &Session, items: &[WorkItem]) {
        for item in items {
            let name = item.target.to_string_lossy();
            println!("Title: {}", title_from_filename(&name));
            println!("Filename: {}", name);
            println!("Transport: {}", item.transport());
            println!("URL: {}", item.locator());

            if item.transport() == TransportKind::Http {
                match session.probe(item.locator()).await {
                    Ok(probe) => match probe.content_length {
                        Some(length) => println!("Size: {} ({} bytes)", ByteSize(length), length),
                        None => println!("Size: unknown"),
                    },
                    Err(e) => {
                        warn!(url = item.locator(), error = %e, "Content length probe failed");
                        println!("Size: unknown");
                    }
                }
            }
            println!();
        }
    }
}
