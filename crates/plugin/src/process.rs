//! Prozess-Supervisor – startet und stoppt Plugin-Backends per ID

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{PluginError, Result};
use crate::registry::PluginRegistry;

/// Start/Stop-Vertrag fuer die Laufzeit eines Plugins
#[async_trait]
pub trait ProzessVerwaltung: Send + Sync {
    async fn starten(&self, abbruch: &CancellationToken, plugin_id: &str) -> Result<()>;
    async fn stoppen(&self, abbruch: &CancellationToken, plugin_id: &str) -> Result<()>;
}

/// Startet Backend-Plugins als Kindprozesse
///
/// Plugins werden in der gemeinsamen Registry nachgeschlagen; Plugins ohne
/// Backend haben keinen Prozess.
pub struct ProzessManager {
    registry: Arc<PluginRegistry>,
    prozesse: DashMap<String, Child>,
}

impl ProzessManager {
    pub fn neu(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            prozesse: DashMap::new(),
        }
    }

    /// Laeuft fuer dieses Plugin ein Backend-Prozess?
    pub fn laeuft(&self, plugin_id: &str) -> bool {
        self.prozesse.contains_key(plugin_id)
    }
}

#[async_trait]
impl ProzessVerwaltung for ProzessManager {
    async fn starten(&self, abbruch: &CancellationToken, plugin_id: &str) -> Result<()> {
        if abbruch.is_cancelled() {
            return Err(PluginError::Abgebrochen);
        }

        let plugin = self
            .registry
            .plugin(plugin_id)
            .ok_or_else(|| PluginError::NichtGefunden(plugin_id.to_string()))?;

        if !plugin.manifest.backend {
            return Ok(());
        }
        if self.laeuft(plugin_id) {
            debug!(plugin_id, "Backend laeuft bereits");
            return Ok(());
        }

        let executable = plugin
            .manifest
            .executable
            .as_deref()
            .ok_or_else(|| PluginError::prozess(plugin_id, "kein executable im Manifest"))?;
        let programm = plugin.dir().join(executable);

        let child = Command::new(&programm)
            .current_dir(plugin.dir())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PluginError::prozess(plugin_id, format!("{}: {}", programm.display(), e)))?;

        info!(plugin_id, pid = child.id(), "Backend-Prozess gestartet");
        self.prozesse.insert(plugin_id.to_string(), child);
        Ok(())
    }

    async fn stoppen(&self, abbruch: &CancellationToken, plugin_id: &str) -> Result<()> {
        let Some((_, mut child)) = self.prozesse.remove(plugin_id) else {
            debug!(plugin_id, "Kein laufender Prozess");
            return Ok(());
        };

        tokio::select! {
            ergebnis = child.kill() => {
                ergebnis.map_err(|e| PluginError::prozess(plugin_id, e.to_string()))?;
                info!(plugin_id, "Backend-Prozess gestoppt");
                Ok(())
            }
            _ = abbruch.cancelled() => {
                // Prozess wird beim Drop beendet (kill_on_drop)
                Err(PluginError::Abgebrochen)
            }
        }
    }
}
