//! Konfiguration fuer den PluginLoader
//!
//! Alle Felder haben Standardwerte, sodass eine leere TOML-Tabelle gueltig ist.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderKonfiguration {
    /// Wurzelverzeichnis extern installierter Plugins
    pub plugins_pfad: PathBuf,
    /// Plugin-IDs, die unsigniert geladen werden duerfen
    pub unsigniert_erlaubt: Vec<String>,
    /// Zugelassene signierende Organisationen (leer = alle)
    pub erlaubte_signatur_orgs: Vec<String>,
    /// Entwicklungsmodus: unsignierte Plugins sind generell erlaubt
    pub entwicklungsmodus: bool,
    /// Plugins von einem vertrauenswuerdigen CDN (keine Signaturpruefung)
    pub cdn_plugins: Vec<String>,
    /// Basis-URL des CDN; ohne Wert werden auch CDN-Plugins lokal ausgeliefert
    pub cdn_basis_url: Option<String>,
    /// Base64-kodierte Ed25519-Schluessel vertrauenswuerdiger Signierer
    pub vertrauenswuerdige_schluessel: Vec<String>,
}

impl Default for LoaderKonfiguration {
    fn default() -> Self {
        Self {
            plugins_pfad: PathBuf::from("data/plugins"),
            unsigniert_erlaubt: Vec::new(),
            erlaubte_signatur_orgs: Vec::new(),
            entwicklungsmodus: false,
            cdn_plugins: Vec::new(),
            cdn_basis_url: None,
            vertrauenswuerdige_schluessel: Vec::new(),
        }
    }
}

impl LoaderKonfiguration {
    /// Parst die Konfiguration aus einem TOML-String
    pub fn parse(inhalt: &str) -> Result<Self> {
        Ok(toml::from_str(inhalt)?)
    }
}
