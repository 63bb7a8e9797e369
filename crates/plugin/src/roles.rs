//! Deklaration der Zugriffsrollen eines Plugins

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{PluginError, Result};
use crate::manifest::RollenRegistrierung;

#[async_trait]
pub trait RollenRegistry: Send + Sync {
    async fn rollen_deklarieren(
        &self,
        plugin_id: &str,
        plugin_name: &str,
        rollen: &[RollenRegistrierung],
    ) -> Result<()>;
}

/// In-Memory Rollenverzeichnis pro Plugin
#[derive(Default)]
pub struct RollenSpeicher {
    rollen: DashMap<String, Vec<RollenRegistrierung>>,
}

impl RollenSpeicher {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Deklarierte Rollen eines Plugins
    pub fn rollen(&self, plugin_id: &str) -> Vec<RollenRegistrierung> {
        self.rollen
            .get(plugin_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RollenRegistry for RollenSpeicher {
    async fn rollen_deklarieren(
        &self,
        plugin_id: &str,
        plugin_name: &str,
        rollen: &[RollenRegistrierung],
    ) -> Result<()> {
        if let Some(r) = rollen.iter().find(|r| r.role.name.trim().is_empty()) {
            return Err(PluginError::Rollen(format!(
                "{plugin_name}: Rolle ohne Namen ({} Berechtigungen)",
                r.role.permissions.len()
            )));
        }
        if rollen.is_empty() {
            return Ok(());
        }
        self.rollen.insert(plugin_id.to_string(), rollen.to_vec());
        Ok(())
    }
}
