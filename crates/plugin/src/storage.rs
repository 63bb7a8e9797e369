//! Speicherverwaltung fuer extern installierte Plugins

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::{PluginError, Result};
use crate::manifest::MANIFEST_DATEI;
use crate::tree::vergleichs_schluessel;

#[async_trait]
pub trait SpeicherVerwaltung: Send + Sync {
    /// Merkt sich den Installationsort eines Plugins
    async fn registrieren(&self, plugin_id: &str, dir: &Path) -> Result<()>;
    /// Entfernt das installierte Plugin vom Speicher
    async fn entfernen(&self, plugin_id: &str) -> Result<()>;
}

/// Plugins als Verzeichnisse unterhalb eines gemeinsamen Wurzelverzeichnisses
pub struct DateisystemSpeicher {
    plugins_pfad: PathBuf,
    verzeichnisse: DashMap<String, PathBuf>,
}

impl DateisystemSpeicher {
    pub fn neu(plugins_pfad: &Path) -> Result<Self> {
        Ok(Self {
            plugins_pfad: vergleichs_schluessel(&std::path::absolute(plugins_pfad)?),
            verzeichnisse: DashMap::new(),
        })
    }

    pub fn verzeichnis(&self, plugin_id: &str) -> Option<PathBuf> {
        self.verzeichnisse.get(plugin_id).map(|d| d.value().clone())
    }
}

#[async_trait]
impl SpeicherVerwaltung for DateisystemSpeicher {
    async fn registrieren(&self, plugin_id: &str, dir: &Path) -> Result<()> {
        debug!(plugin_id, pfad = %dir.display(), "Installationsort registriert");
        self.verzeichnisse
            .insert(plugin_id.to_string(), dir.to_path_buf());
        Ok(())
    }

    async fn entfernen(&self, plugin_id: &str) -> Result<()> {
        let dir = self
            .verzeichnis(plugin_id)
            .ok_or_else(|| PluginError::Speicher(format!("{plugin_id} existiert nicht")))?;

        // Nur Plugins innerhalb des konfigurierten Plugin-Verzeichnisses loeschen
        let schluessel = vergleichs_schluessel(&dir);
        match schluessel.strip_prefix(&self.plugins_pfad) {
            Ok(relativ) if !relativ.as_os_str().is_empty() => {}
            _ => return Err(PluginError::AusserhalbPluginVerzeichnis),
        }

        let hat_manifest = tokio::fs::try_exists(dir.join(MANIFEST_DATEI)).await?
            || tokio::fs::try_exists(dir.join("dist").join(MANIFEST_DATEI)).await?;
        if !hat_manifest {
            return Err(PluginError::KeinPluginVerzeichnis(dir.display().to_string()));
        }

        tokio::fs::remove_dir_all(&dir).await?;
        self.verzeichnisse.remove(plugin_id);
        info!(plugin_id, pfad = %dir.display(), "Plugin-Verzeichnis entfernt");
        Ok(())
    }
}
