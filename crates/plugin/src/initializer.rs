//! Backend-Initialisierung vor der Registrierung
//!
//! Ein Fehler hier bricht den gesamten Lade-Batch ab.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{PluginError, Result};
use crate::plugin::Plugin;

#[async_trait]
pub trait Initialisierer: Send + Sync {
    async fn initialisieren(&self, abbruch: &CancellationToken, plugin: &Plugin) -> Result<()>;
}

/// Prueft, dass Backend-Plugins ein startbares Programm mitbringen
#[derive(Debug, Clone, Default)]
pub struct BackendInitialisierer;

#[async_trait]
impl Initialisierer for BackendInitialisierer {
    async fn initialisieren(&self, abbruch: &CancellationToken, plugin: &Plugin) -> Result<()> {
        if abbruch.is_cancelled() {
            return Err(PluginError::Abgebrochen);
        }
        if !plugin.manifest.backend {
            return Ok(());
        }

        let executable = plugin
            .manifest
            .executable
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                PluginError::initialisierung(plugin.id(), "Backend-Plugin ohne executable")
            })?;

        let programm = plugin.dir().join(executable);
        if !tokio::fs::try_exists(&programm).await? {
            return Err(PluginError::initialisierung(
                plugin.id(),
                format!("Programm fehlt: {}", programm.display()),
            ));
        }

        debug!(plugin_id = %plugin.id(), programm = %programm.display(), "Backend initialisiert");
        Ok(())
    }
}
