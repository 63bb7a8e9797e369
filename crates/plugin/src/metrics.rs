//! Prometheus-Metriken der Lade-Pipeline
//!
//! Registrierte Metriken:
//! - `plugwerk_plugin_build_info` – Gauge: 1 pro geladenem Plugin (plugin_id, plugin_type, version, signature_status)

use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::error::Result;
use crate::plugin::Plugin;

/// Plugin-Metriken mit eigener Registry
#[derive(Clone)]
pub struct PluginMetriken {
    pub registry: Registry,
    pub build_info: IntGaugeVec,
}

impl PluginMetriken {
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let build_info = IntGaugeVec::new(
            Opts::new(
                "plugwerk_plugin_build_info",
                "Build-Informationen geladener Plugins",
            ),
            &["plugin_id", "plugin_type", "version", "signature_status"],
        )?;
        registry.register(Box::new(build_info.clone()))?;

        Ok(Self {
            registry,
            build_info,
        })
    }

    /// Setzt die Build-Info eines Plugins
    pub fn build_info_setzen(&self, plugin: &Plugin) {
        let status = plugin.signatur.to_string();
        self.build_info
            .with_label_values(&[
                plugin.id(),
                plugin.typ().as_str(),
                plugin.manifest.info.version.as_str(),
                status.as_str(),
            ])
            .set(1);
    }

    /// Entfernt die Build-Info eines entladenen Plugins
    pub fn build_info_entfernen(&self, plugin: &Plugin) {
        let status = plugin.signatur.to_string();
        // Fehlende Labels sind kein Fehler
        let _ = self.build_info.remove_label_values(&[
            plugin.id(),
            plugin.typ().as_str(),
            plugin.manifest.info.version.as_str(),
            status.as_str(),
        ]);
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let mut puffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut puffer)?;
        Ok(String::from_utf8_lossy(&puffer).into_owned())
    }
}
