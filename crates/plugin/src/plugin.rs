//! Geladenes Plugin mit Platzierung, Signaturzustand und Baumbeziehungen

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use crate::manifest::{Logos, ManifestData, Screenshot};
use crate::types::{PluginClass, PluginTyp, SignaturFehler, SignaturStatus, SignaturTyp};

/// Zur Laufzeit geladenes Plugin
///
/// Kinder gehoeren ihrem Elternteil; der Verweis auf das Elternteil ist
/// nur ein nicht-besitzender Rueckverweis fuer Nachschlagezwecke.
#[derive(Debug)]
pub struct Plugin {
    pub manifest: ManifestData,
    pub class: PluginClass,
    /// Absolutes Plugin-Verzeichnis
    pub plugin_dir: PathBuf,
    pub base_url: String,
    pub module: String,
    /// Logo-URLs (relativ zur Basis-URL aufgeloest)
    pub logos: Logos,
    pub screenshots: Vec<Screenshot>,

    pub signatur: SignaturStatus,
    pub signatur_typ: Option<SignaturTyp>,
    pub signatur_org: Option<String>,
    pub signatur_fehler: Option<SignaturFehler>,

    /// Standard-Navigations-URL (nur fuer Apps)
    pub default_nav_url: Option<String>,
    /// ID der App, in die dieses Plugin eingebettet ist
    pub included_in_app_id: Option<String>,

    pub(crate) parent: Weak<Plugin>,
    pub(crate) children: Vec<Arc<Plugin>>,
}

impl Plugin {
    /// Erstellt ein Plugin ohne Baumbeziehungen und mit unsigniertem Startzustand
    pub fn neu(
        manifest: ManifestData,
        class: PluginClass,
        plugin_dir: PathBuf,
        base_url: String,
        module: String,
    ) -> Self {
        Self {
            logos: manifest.info.logos.clone(),
            screenshots: manifest.info.screenshots.clone(),
            manifest,
            class,
            plugin_dir,
            base_url,
            module,
            signatur: SignaturStatus::NichtSigniert,
            signatur_typ: None,
            signatur_org: None,
            signatur_fehler: None,
            default_nav_url: None,
            included_in_app_id: None,
            parent: Weak::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn typ(&self) -> PluginTyp {
        self.manifest.typ
    }

    pub fn dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Elternteil, solange es noch von jemandem gehalten wird
    pub fn parent(&self) -> Option<Arc<Plugin>> {
        self.parent.upgrade()
    }

    pub fn children(&self) -> &[Arc<Plugin>] {
        &self.children
    }

    pub fn ist_app(&self) -> bool {
        self.manifest.typ == PluginTyp::App
    }

    pub fn ist_renderer(&self) -> bool {
        self.manifest.typ == PluginTyp::Renderer
    }

    pub fn ist_kern_plugin(&self) -> bool {
        self.class == PluginClass::Kern
    }

    pub fn ist_gebuendelt(&self) -> bool {
        self.class == PluginClass::Gebuendelt
    }

    pub fn ist_extern(&self) -> bool {
        self.class == PluginClass::Extern
    }
}
