//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::path::PathBuf;

use plugwerk_plugin::LoaderKonfiguration;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Plugin-Verzeichnisse und Lade-Richtlinie
    pub plugins: PluginEinstellungen,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Plugin-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginEinstellungen {
    /// Verzeichnisse mit Kern-Plugins
    pub kern_verzeichnisse: Vec<PathBuf>,
    /// Verzeichnisse mit mitgelieferten Plugins
    pub gebuendelt_verzeichnisse: Vec<PathBuf>,
    /// Lade-Richtlinie; `plugins_pfad` ist zugleich das Verzeichnis externer Plugins
    pub loader: LoaderKonfiguration,
}

impl Default for PluginEinstellungen {
    fn default() -> Self {
        Self {
            kern_verzeichnisse: vec![PathBuf::from("public/app/plugins")],
            gebuendelt_verzeichnisse: vec![PathBuf::from("plugins-bundled")],
            loader: LoaderKonfiguration::default(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Verzeichnis der extern installierten Plugins
    pub fn extern_verzeichnis(&self) -> &PathBuf {
        &self.plugins.loader.plugins_pfad
    }
}
