//! Fehlertypen fuer die Plugin-Lade-Pipeline

use thiserror::Error;

/// Alle moeglichen Fehler beim Laden und Entladen von Plugins
#[derive(Debug, Error)]
pub enum PluginError {
    // --- Manifest ---
    #[error("Ungueltiger plugin.json Pfad: {0}")]
    UngueltigerManifestPfad(String),

    #[error("plugin.json enthaelt keine gueltige id oder keinen gueltigen type: {0}")]
    ManifestUngueltig(String),

    // --- Registry ---
    #[error("Plugin bereits registriert: {0}")]
    BereitsRegistriert(String),

    #[error("Plugin nicht gefunden: {0}")]
    NichtGefunden(String),

    // --- Unload ---
    #[error("Plugin nicht installiert")]
    NichtInstalliert,

    #[error("Kern-Plugins koennen nicht entfernt werden")]
    KernPluginNichtEntfernbar,

    // --- Signatur ---
    #[error("Signatur konnte nicht berechnet werden: {0}")]
    SignaturBerechnung(String),

    #[error("Signierungsschluessel ungueltig: {0}")]
    SchluesselUngueltig(String),

    // --- Lifecycle ---
    #[error("Plugin Initialisierung fehlgeschlagen ({plugin_id}): {grund}")]
    Initialisierung { plugin_id: String, grund: String },

    #[error("Prozessfehler ({plugin_id}): {grund}")]
    Prozess { plugin_id: String, grund: String },

    #[error("Rollen-Deklaration fehlgeschlagen: {0}")]
    Rollen(String),

    #[error("Vorgang abgebrochen")]
    Abgebrochen,

    // --- Speicher ---
    #[error("Speicherfehler: {0}")]
    Speicher(String),

    #[error("Plugin liegt ausserhalb des Plugin-Verzeichnisses")]
    AusserhalbPluginVerzeichnis,

    #[error("Verzeichnis ist kein Plugin-Verzeichnis: {0}")]
    KeinPluginVerzeichnis(String),

    // --- Asset-Pfade ---
    #[error("Asset-Pfad konnte nicht berechnet werden: {0}")]
    AssetPfad(String),

    // --- Metriken ---
    #[error("Metrik-Fehler: {0}")]
    Metrik(#[from] prometheus::Error),

    // --- IO / Serialisierung ---
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML-Fehler: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl PluginError {
    /// Erstellt einen Initialisierungsfehler fuer ein Plugin
    pub fn initialisierung(plugin_id: impl Into<String>, grund: impl Into<String>) -> Self {
        Self::Initialisierung {
            plugin_id: plugin_id.into(),
            grund: grund.into(),
        }
    }

    /// Erstellt einen Prozessfehler fuer ein Plugin
    pub fn prozess(plugin_id: impl Into<String>, grund: impl Into<String>) -> Self {
        Self::Prozess {
            plugin_id: plugin_id.into(),
            grund: grund.into(),
        }
    }
}

/// Result-Alias fuer das Plugin-System
pub type Result<T> = std::result::Result<T, PluginError>;
