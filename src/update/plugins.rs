use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::UpdateError;
use super::replace::atomic_replace;
use super::self_update::UpdateManager;
use crate::handlers::{HandlerResolver, PluginResolver};
use crate::plugins::PluginDescriptor;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginUpdateReport {
    pub checked: usize,
    pub updated: Vec<String>,
}

impl UpdateManager {
    /// Refresh every installed plugin that has a newer remote copy
    ///
    /// A plugin whose handler supplies its own updater is left to it.
    /// Otherwise each update URL is probed and the first one reporting a
    /// newer `Last-Modified` than the local file replaces it.
    pub async fn check_plugin_updates(
        &self,
        plugins: &PluginResolver,
    ) -> Result<PluginUpdateReport, UpdateError> {
        let mut report = PluginUpdateReport::default();

        for plugin in plugins.store().scan() {
            report.checked += 1;

            let updater = plugins
                .resolve(&plugin.name)
                .and_then(|handler| handler.updater());

            let replaced = match updater {
                Some(updater) => {
                    debug!(plugin = %plugin.name, "Using plugin's own updater");
                    updater
                        .update(&plugin, &self.session)
                        .await
                        .map_err(|source| UpdateError::Handler {
                            name: plugin.name.clone(),
                            source,
                        })?
                }
                None => self.update_by_mtime(&plugin).await?,
            };

            if replaced {
                info!(plugin = %plugin.name, "Plugin updated");
                report.updated.push(plugin.name);
            }
        }

        Ok(report)
    }

    async fn update_by_mtime(&self, plugin: &PluginDescriptor) -> Result<bool, UpdateError> {
        let local = local_mtime(plugin).await;
        let mut found_newer = false;

        for url in &plugin.update_urls {
            let probe = match self.session.probe(url).await {
                Ok(probe) => probe,
                Err(e) => {
                    warn!(plugin = %plugin.name, url = %url, error = %e, "Update check failed");
                    continue;
                }
            };

            let Some(remote) = probe.last_modified else {
                debug!(plugin = %plugin.name, url = %url, "No Last-Modified header");
                continue;
            };
            if local.is_some_and(|local| remote <= local) {
                debug!(plugin = %plugin.name, url = %url, "Remote copy is not newer");
                continue;
            }

            found_newer = true;
            match atomic_replace(&self.session, url, &plugin.path, false).await {
                Ok(()) => return Ok(true),
                Err(e) => {
                    warn!(plugin = %plugin.name, url = %url, error = %e, "Newer plugin could not be installed");
                }
            }
        }

        if found_newer {
            return Err(UpdateError::PluginUpdateFailed {
                name: plugin.name.clone(),
            });
        }
        Ok(false)
    }
}

async fn local_mtime(plugin: &PluginDescriptor) -> Option<DateTime<Utc>> {
    let modified = tokio::fs::metadata(&plugin.path).await.ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
