//! Plugin Registry – einzige Quelle der Wahrheit fuer geladene Plugins

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{PluginError, Result};
use crate::plugin::Plugin;

/// Plugin Registry – thread-sicher via DashMap
///
/// `hinzufuegen` und `entfernen` sind pro ID atomar; `plugins` liefert
/// einen Schnappschuss und darf parallel zu Aenderungen anderer IDs laufen.
#[derive(Default)]
pub struct PluginRegistry {
    eintraege: DashMap<String, Arc<Plugin>>,
}

impl PluginRegistry {
    /// Erstellt eine neue leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    /// Schnappschuss aller registrierten Plugins
    pub fn plugins(&self) -> Vec<Arc<Plugin>> {
        self.eintraege.iter().map(|e| e.value().clone()).collect()
    }

    /// Sucht ein Plugin per ID
    pub fn plugin(&self, id: &str) -> Option<Arc<Plugin>> {
        self.eintraege.get(id).map(|e| e.value().clone())
    }

    /// Registriert ein Plugin; schlaegt fehl wenn die ID bereits vergeben ist
    pub fn hinzufuegen(&self, plugin: Arc<Plugin>) -> Result<()> {
        match self.eintraege.entry(plugin.id().to_string()) {
            Entry::Occupied(e) => Err(PluginError::BereitsRegistriert(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(plugin);
                Ok(())
            }
        }
    }

    /// Entfernt ein Plugin; schlaegt fehl wenn die ID unbekannt ist
    pub fn entfernen(&self, id: &str) -> Result<Arc<Plugin>> {
        self.eintraege
            .remove(id)
            .map(|(_, p)| p)
            .ok_or_else(|| PluginError::NichtGefunden(id.to_string()))
    }

    pub fn enthaelt(&self, id: &str) -> bool {
        self.eintraege.contains_key(id)
    }

    /// Anzahl registrierter Plugins
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}
