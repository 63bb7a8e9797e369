//! URL-Berechnung fuer Plugin-Assets (Basis-URL, Modul, Logos, Screenshots)

use std::collections::HashSet;
use std::path::Path;

use crate::error::{PluginError, Result};
use crate::manifest::ManifestData;
use crate::plugin::Plugin;
use crate::types::{PluginClass, PluginTyp};

/// Berechnet die URLs unter denen die UI Plugin-Assets findet
pub trait AssetPfade: Send + Sync {
    fn basis(&self, manifest: &ManifestData, class: PluginClass, dir: &Path) -> Result<String>;
    fn modul(&self, manifest: &ManifestData, class: PluginClass, dir: &Path) -> Result<String>;
    /// Loest einen Pfad aus dem Manifest relativ zur Basis-URL auf
    fn relative_url(&self, plugin: &Plugin, pfad: &str, standard: &str) -> Result<String>;
}

/// Standard-Pfade: lokal ausgeliefert, CDN-Plugins optional ueber eine CDN-Basis-URL
#[derive(Debug, Clone, Default)]
pub struct LokaleAssetPfade {
    cdn_basis_url: Option<String>,
    cdn_plugins: HashSet<String>,
}

impl LokaleAssetPfade {
    pub fn neu(cdn_basis_url: Option<String>, cdn_plugins: impl IntoIterator<Item = String>) -> Self {
        Self {
            cdn_basis_url,
            cdn_plugins: cdn_plugins.into_iter().collect(),
        }
    }

    fn cdn_basis(&self, manifest: &ManifestData) -> Option<String> {
        let cdn = self.cdn_basis_url.as_deref()?;
        if !self.cdn_plugins.contains(&manifest.id) {
            return None;
        }
        Some(format!(
            "{}/{}/{}/public/plugins/{}",
            cdn.trim_end_matches('/'),
            manifest.id,
            manifest.info.version,
            manifest.id
        ))
    }
}

fn verzeichnis_name(dir: &Path) -> Result<String> {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PluginError::AssetPfad(format!("kein Verzeichnisname: {}", dir.display())))
}

impl AssetPfade for LokaleAssetPfade {
    fn basis(&self, manifest: &ManifestData, class: PluginClass, dir: &Path) -> Result<String> {
        if class == PluginClass::Kern {
            return Ok(format!(
                "public/app/plugins/{}/{}",
                manifest.typ,
                verzeichnis_name(dir)?
            ));
        }
        if let Some(cdn) = self.cdn_basis(manifest) {
            return Ok(cdn);
        }
        Ok(format!("public/plugins/{}", manifest.id))
    }

    fn modul(&self, manifest: &ManifestData, class: PluginClass, dir: &Path) -> Result<String> {
        if class == PluginClass::Kern {
            return Ok(format!(
                "app/plugins/{}/{}/module",
                manifest.typ,
                verzeichnis_name(dir)?
            ));
        }
        if let Some(cdn) = self.cdn_basis(manifest) {
            return Ok(format!("{cdn}/module"));
        }
        Ok(format!("plugins/{}/module", manifest.id))
    }

    fn relative_url(&self, plugin: &Plugin, pfad: &str, standard: &str) -> Result<String> {
        if pfad.is_empty() {
            return Ok(standard.to_string());
        }
        if pfad.starts_with("http://") || pfad.starts_with("https://") {
            return Ok(pfad.to_string());
        }
        Ok(url_fragmente_verbinden(
            &plugin.base_url,
            pfad.trim_start_matches("./"),
        ))
    }
}

/// Standard-Logo fuer Plugins ohne eigenes Logo
pub fn standard_logo_pfad(typ: PluginTyp) -> String {
    format!("public/img/icn-{typ}.svg")
}

/// Verbindet zwei URL-Fragmente mit genau einem `/`
pub fn url_fragmente_verbinden(a: &str, b: &str) -> String {
    if b.is_empty() {
        return a.to_string();
    }
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{a}/{b}"),
        _ => format!("{a}{b}"),
    }
}
