//! Plugin-Manifest Parsing (plugin.json)
//!
//! Jedes Plugin-Verzeichnis liefert eine plugin.json mit Identitaet, Typ,
//! Abhaengigkeiten und UI-Includes. Das Manifest wird genau einmal gelesen,
//! validiert und normalisiert und ist danach unveraenderlich.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{PluginError, Result};
use crate::types::PluginTyp;

/// Dateiname des Manifests in jedem Plugin-Verzeichnis
pub const MANIFEST_DATEI: &str = "plugin.json";

/// Versionsbedingung "beliebige Host-Version"
pub const BELIEBIGE_VERSION: &str = "*";

/// Standardrolle fuer Includes ohne Rolle
pub const STANDARD_ROLLE: &str = "Viewer";

/// Statische Umbenennungstabelle fuer veraltete Plugins (ID -> Anzeigename)
const ANZEIGENAMEN_UMBENENNUNG: &[(&str, &str)] = &[("grafana-piechart-panel", "Pie Chart (old)")];

/// `null` im Manifest wird wie ein fehlendes Feld behandelt
fn null_als_leer<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Vollstaendiges Plugin-Manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestData {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub typ: PluginTyp,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub info: Info,
    #[serde(default, deserialize_with = "null_als_leer")]
    pub dependencies: Abhaengigkeiten,
    #[serde(default, deserialize_with = "null_als_leer")]
    pub includes: Vec<Include>,
    /// Plugin hat einen Backend-Prozess
    #[serde(default)]
    pub backend: bool,
    /// Name der Backend-Programmdatei relativ zum Plugin-Verzeichnis
    #[serde(default)]
    pub executable: Option<String>,
    /// Zugriffsrollen die das Plugin deklariert
    #[serde(default, deserialize_with = "null_als_leer")]
    pub roles: Vec<RollenRegistrierung>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    #[serde(default)]
    pub author: Autor,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default, deserialize_with = "null_als_leer")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub logos: Logos,
    #[serde(default, deserialize_with = "null_als_leer")]
    pub screenshots: Vec<Screenshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Autor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Logos {
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub large: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Screenshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

/// Abhaengigkeiten auf Host-Version und andere Plugins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Abhaengigkeiten {
    #[serde(default)]
    pub host_version: String,
    #[serde(default, deserialize_with = "null_als_leer")]
    pub plugins: Vec<Abhaengigkeit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Abhaengigkeit {
    pub id: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// UI-Include (Seite, Dashboard, ...) eines Plugins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Include {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub add_to_nav: bool,
    #[serde(default)]
    pub default_nav: bool,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub uid: String,
}

impl Include {
    /// URL-Pfad eines eingebundenen Dashboards, falls auffindbar
    pub fn dashboard_url_pfad(&self) -> Option<String> {
        if self.typ != "dashboard" || self.uid.is_empty() {
            return None;
        }
        Some(format!("/d/{}", self.uid))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollenRegistrierung {
    pub role: Rolle,
    #[serde(default)]
    pub grants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rolle {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<Berechtigung>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Berechtigung {
    pub action: String,
    #[serde(default)]
    pub scope: String,
}

impl ManifestData {
    /// Liest, validiert und normalisiert eine plugin.json
    pub fn lesen(pfad: &Path) -> Result<Self> {
        let ist_json = pfad
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !ist_json {
            return Err(PluginError::UngueltigerManifestPfad(
                pfad.display().to_string(),
            ));
        }

        let inhalt = std::fs::read_to_string(pfad)?;
        let mut manifest = Self::parse(&inhalt)
            .map_err(|_| PluginError::ManifestUngueltig(pfad.display().to_string()))?;
        manifest.normalisieren();
        Ok(manifest)
    }

    /// Parst und validiert ein Manifest aus einem JSON-String
    pub fn parse(inhalt: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(inhalt)
            .map_err(|e| PluginError::ManifestUngueltig(e.to_string()))?;
        manifest.validieren()?;
        Ok(manifest)
    }

    /// Prueft Pflichtfelder (der Typ wird bereits beim Parsen erzwungen)
    pub fn validieren(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PluginError::ManifestUngueltig("Pflichtfeld fehlt: id".into()));
        }
        Ok(())
    }

    /// Setzt Standardwerte; mehrfaches Anwenden aendert nichts mehr
    pub fn normalisieren(&mut self) {
        if let Some((_, name)) = ANZEIGENAMEN_UMBENENNUNG
            .iter()
            .find(|(id, _)| *id == self.id)
        {
            self.name = (*name).to_string();
        }

        if self.dependencies.host_version.is_empty() {
            self.dependencies.host_version = BELIEBIGE_VERSION.to_string();
        }

        for include in &mut self.includes {
            if include.role.is_empty() {
                include.role = STANDARD_ROLLE.to_string();
            }
            if include.slug.is_empty() {
                include.slug = slugify(&include.name);
            }
        }
    }
}

/// Wandelt einen Anzeigenamen in einen URL-tauglichen Slug
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut trenner = false;
    for c in name.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_alphanumeric() {
            if trenner && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            trenner = false;
        } else {
            trenner = true;
        }
    }
    slug
}
