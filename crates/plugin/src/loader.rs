//! PluginLoader – Load/Unload-Workflow der Plugin-Pipeline
//!
//! Ablauf pro Batch (streng sequentiell):
//! 1. Manifeste finden und lesen, doppelte Verzeichnisse und IDs verwerfen
//! 2. Signatur berechnen (oder CDN-Ausnahme)
//! 3. Abhaengigkeitsbaum aus der Verzeichnisverschachtelung aufbauen
//! 4. Signatur validieren, Fehler in der Fehlerliste festhalten
//! 5. Pro Plugin: initialisieren, registrieren, Rollen deklarieren, starten
//!
//! Nur ein Initialisierungs- oder Registrierungsfehler bricht den Batch ab.
//! Alle anderen Fehler betreffen nur das jeweilige Plugin.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::assetpath::{standard_logo_pfad, url_fragmente_verbinden, AssetPfade, LokaleAssetPfade};
use crate::config::LoaderKonfiguration;
use crate::error::{PluginError, Result};
use crate::finder::{DateisystemFinder, Finder};
use crate::initializer::{BackendInitialisierer, Initialisierer};
use crate::manifest::{ManifestData, Screenshot};
use crate::metrics::PluginMetriken;
use crate::plugin::Plugin;
use crate::process::{ProzessManager, ProzessVerwaltung};
use crate::registry::PluginRegistry;
use crate::roles::{RollenRegistry, RollenSpeicher};
use crate::signature::{
    CdnAusnahmen, Ed25519Rechner, SignaturAusnahmen, SignaturRechner, SignaturValidator,
};
use crate::storage::{DateisystemSpeicher, SpeicherVerwaltung};
use crate::tree;
use crate::types::{PluginClass, PluginFehlerEintrag, Signatur, SignaturFehler};

/// Einstiegsdatei, die die UI fuer jedes Frontend-Plugin erwartet
const MODUL_DATEI: &str = "module.js";

/// Externe Dienste, die der Loader zusammensetzt
#[derive(Clone)]
pub struct LoaderDienste {
    pub registry: Arc<PluginRegistry>,
    pub finder: Arc<dyn Finder>,
    pub asset_pfade: Arc<dyn AssetPfade>,
    pub rechner: Arc<dyn SignaturRechner>,
    pub ausnahmen: Arc<dyn SignaturAusnahmen>,
    pub initialisierer: Arc<dyn Initialisierer>,
    pub rollen: Arc<dyn RollenRegistry>,
    pub prozesse: Arc<dyn ProzessVerwaltung>,
    pub speicher: Arc<dyn SpeicherVerwaltung>,
}

impl LoaderDienste {
    /// Standard-Dienste auf Basis des Dateisystems
    pub fn standard(cfg: &LoaderKonfiguration, registry: Arc<PluginRegistry>) -> Result<Self> {
        Ok(Self {
            finder: Arc::new(DateisystemFinder),
            asset_pfade: Arc::new(LokaleAssetPfade::neu(
                cfg.cdn_basis_url.clone(),
                cfg.cdn_plugins.iter().cloned(),
            )),
            rechner: Arc::new(Ed25519Rechner::aus_base64(&cfg.vertrauenswuerdige_schluessel)?),
            ausnahmen: Arc::new(CdnAusnahmen::neu(cfg.cdn_plugins.iter().cloned())),
            initialisierer: Arc::new(BackendInitialisierer),
            rollen: Arc::new(RollenSpeicher::neu()),
            prozesse: Arc::new(ProzessManager::neu(Arc::clone(&registry))),
            speicher: Arc::new(DateisystemSpeicher::neu(&cfg.plugins_pfad)?),
            registry,
        })
    }
}

/// Daten eines App-Elternteils, die Kinder uebernehmen
struct AppEltern {
    id: String,
    base_url: String,
    dir: PathBuf,
    kern: bool,
}

/// Orchestriert Laden und Entladen von Plugins
pub struct PluginLoader {
    dienste: LoaderDienste,
    validator: SignaturValidator,
    metriken: PluginMetriken,
    /// Aktuell abgelehnte Plugins (Plugin-ID -> Signaturfehler)
    fehler: RwLock<HashMap<String, SignaturFehler>>,
}

impl PluginLoader {
    pub fn neu(cfg: &LoaderKonfiguration, dienste: LoaderDienste) -> Result<Self> {
        Ok(Self {
            dienste,
            validator: SignaturValidator::aus_konfiguration(cfg),
            metriken: PluginMetriken::neu()?,
            fehler: RwLock::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.dienste.registry
    }

    pub fn metriken(&self) -> &PluginMetriken {
        &self.metriken
    }

    /// Laedt alle Plugins unterhalb der angegebenen Verzeichnisse
    pub async fn laden(
        &self,
        abbruch: &CancellationToken,
        class: PluginClass,
        pfade: &[PathBuf],
    ) -> Result<Vec<Arc<Plugin>>> {
        let manifest_pfade = self.dienste.finder.finden(pfade)?;
        self.plugins_laden(abbruch, class, &manifest_pfade).await
    }

    /// Laedt die Plugins zu bereits gefundenen plugin.json Dateien
    ///
    /// Liefert alle in diesem Batch registrierten Plugins in Verzeichnisreihenfolge.
    pub async fn plugins_laden(
        &self,
        abbruch: &CancellationToken,
        class: PluginClass,
        manifest_pfade: &[PathBuf],
    ) -> Result<Vec<Arc<Plugin>>> {
        let gefunden = self.duplikate_entfernen(manifeste_lesen(manifest_pfade));
        let mut plugins = self.plugins_erstellen(class, gefunden);

        let verzeichnisse: Vec<PathBuf> = plugins.iter().map(|p| p.plugin_dir.clone()).collect();
        let eltern = tree::eltern_bestimmen(&verzeichnisse);

        let akzeptiert = self.signaturen_validieren(&mut plugins, &eltern);
        self.verifizierte_vorbereiten(&mut plugins, &eltern, &akzeptiert)
            .await;

        let verifiziert: Vec<Arc<Plugin>> = tree::wald_aufbauen(plugins, &eltern)
            .into_iter()
            .zip(akzeptiert)
            .filter_map(|(plugin, ok)| ok.then_some(plugin))
            .collect();

        let mut registriert = Vec::with_capacity(verifiziert.len());
        for plugin in verifiziert {
            if abbruch.is_cancelled() {
                warn!(plugin_id = %plugin.id(), "Laden abgebrochen, restliche Plugins werden nicht verarbeitet");
                return Err(PluginError::Abgebrochen);
            }

            self.dienste
                .initialisierer
                .initialisieren(abbruch, &plugin)
                .await?;

            self.dienste.registry.hinzufuegen(Arc::clone(&plugin))?;
            self.metriken.build_info_setzen(&plugin);
            if let Err(e) = self
                .dienste
                .rollen
                .rollen_deklarieren(plugin.id(), plugin.name(), &plugin.manifest.roles)
                .await
            {
                warn!(plugin_id = %plugin.id(), pfad = %plugin.dir().display(), fehler = %e, "Rollen-Deklaration fehlgeschlagen");
            }
            if !plugin.ist_kern_plugin() {
                info!(plugin_id = %plugin.id(), "Plugin registriert");
            }

            self.starten(abbruch, &plugin).await;
            registriert.push(plugin);
        }

        Ok(registriert)
    }

    /// Entlaedt ein extern installiertes Plugin
    ///
    /// Reihenfolge: Prozess stoppen, aus der Registry entfernen, vom Speicher
    /// entfernen. Der erste Fehler bricht ab.
    pub async fn entladen(&self, abbruch: &CancellationToken, plugin_id: &str) -> Result<()> {
        let plugin = self
            .dienste
            .registry
            .plugin(plugin_id)
            .ok_or(PluginError::NichtInstalliert)?;
        if !plugin.ist_extern() {
            return Err(PluginError::KernPluginNichtEntfernbar);
        }

        debug!(plugin_id, "Plugin-Prozess wird gestoppt");
        self.dienste.prozesse.stoppen(abbruch, plugin_id).await?;

        self.dienste.registry.entfernen(plugin_id)?;
        self.metriken.build_info_entfernen(&plugin);
        debug!(plugin_id, "Plugin deregistriert");

        self.dienste.speicher.entfernen(plugin_id).await?;
        info!(plugin_id, "Plugin entladen");
        Ok(())
    }

    /// Aktuell abgelehnte Plugins, sortiert nach Plugin-ID
    pub fn plugin_fehler(&self) -> Vec<PluginFehlerEintrag> {
        let mut liste: Vec<PluginFehlerEintrag> = self
            .fehler
            .read()
            .values()
            .map(|f| PluginFehlerEintrag {
                plugin_id: f.plugin_id.clone(),
                fehler_code: f.als_fehler_code(),
            })
            .collect();
        liste.sort_by(|a, b| a.plugin_id.cmp(&b.plugin_id));
        liste
    }

    /// Stoppt die Prozesse aller registrierten Plugins (Server-Shutdown)
    pub async fn alle_stoppen(&self, abbruch: &CancellationToken) {
        for plugin in self.dienste.registry.plugins() {
            if let Err(e) = self.dienste.prozesse.stoppen(abbruch, plugin.id()).await {
                warn!(plugin_id = %plugin.id(), fehler = %e, "Plugin konnte nicht gestoppt werden");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Interne Schritte
    // -----------------------------------------------------------------------

    /// Verwirft bereits registrierte IDs und doppelte IDs innerhalb des Batches
    fn duplikate_entfernen(
        &self,
        gefunden: BTreeMap<PathBuf, ManifestData>,
    ) -> Vec<(PathBuf, ManifestData)> {
        let registriert: HashSet<String> = self
            .dienste
            .registry
            .plugins()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        let mut gesehen = HashSet::new();

        gefunden
            .into_iter()
            .filter(|(dir, manifest)| {
                if registriert.contains(&manifest.id) {
                    debug!(plugin_id = %manifest.id, "Plugin bereits registriert, wird uebersprungen");
                    return false;
                }
                if !gesehen.insert(manifest.id.clone()) {
                    warn!(plugin_id = %manifest.id, pfad = %dir.display(), "Plugin-ID mehrfach gefunden, wird uebersprungen");
                    return false;
                }
                true
            })
            .collect()
    }

    /// Erstellt die Plugins und berechnet ihre Signatur
    fn plugins_erstellen(
        &self,
        class: PluginClass,
        gefunden: Vec<(PathBuf, ManifestData)>,
    ) -> Vec<Plugin> {
        let mut plugins = Vec::with_capacity(gefunden.len());

        for (dir, manifest) in gefunden {
            let plugin_id = manifest.id.clone();
            let mut plugin = match self.plugin_basis_erstellen(manifest, class, dir) {
                Ok(p) => p,
                Err(e) => {
                    warn!(plugin_id = %plugin_id, fehler = %e, "Plugin konnte nicht erstellt werden, wird uebersprungen");
                    continue;
                }
            };

            let signatur = if self
                .dienste
                .ausnahmen
                .ist_signaturpruefung_ausgenommen(plugin.id())
            {
                Signatur::vertraut()
            } else {
                match self.dienste.rechner.berechnen(&plugin) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(plugin_id = %plugin_id, fehler = %e, "Signatur konnte nicht berechnet werden, Plugin wird uebersprungen");
                        continue;
                    }
                }
            };
            plugin.signatur = signatur.status;
            plugin.signatur_typ = signatur.typ;
            plugin.signatur_org = signatur.org;

            plugins.push(plugin);
        }

        plugins
    }

    /// Setzt Asset-URLs, Logos und Screenshots
    fn plugin_basis_erstellen(
        &self,
        manifest: ManifestData,
        class: PluginClass,
        dir: PathBuf,
    ) -> Result<Plugin> {
        let pfade = &self.dienste.asset_pfade;
        let base_url = pfade.basis(&manifest, class, &dir)?;
        let module = pfade.modul(&manifest, class, &dir)?;
        let mut plugin = Plugin::neu(manifest, class, dir, base_url, module);

        let standard_logo = standard_logo_pfad(plugin.typ());
        let logos = &plugin.manifest.info.logos;
        let small = pfade.relative_url(&plugin, &logos.small, &standard_logo)?;
        let large = pfade.relative_url(&plugin, &logos.large, &standard_logo)?;

        let screenshots = plugin
            .manifest
            .info
            .screenshots
            .iter()
            .map(|s| {
                Ok(Screenshot {
                    name: s.name.clone(),
                    path: pfade.relative_url(&plugin, &s.path, "")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        plugin.logos.small = small;
        plugin.logos.large = large;
        plugin.screenshots = screenshots;
        Ok(plugin)
    }

    /// Prueft alle Plugins gegen die Signatur-Richtlinie und pflegt die Fehlerliste
    fn signaturen_validieren(&self, plugins: &mut [Plugin], eltern: &[Option<usize>]) -> Vec<bool> {
        let urteile: Vec<Option<SignaturFehler>> = plugins
            .iter()
            .zip(eltern)
            .map(|(plugin, elternteil)| {
                self.validator
                    .validieren(plugin, elternteil.map(|i| &plugins[i]))
            })
            .collect();

        let mut fehler = self.fehler.write();
        plugins
            .iter_mut()
            .zip(urteile)
            .map(|(plugin, urteil)| match urteil {
                Some(f) => {
                    warn!(plugin_id = %plugin.id(), status = %f.signatur_status, "Plugin wegen Signaturproblem uebersprungen");
                    fehler.insert(plugin.id().to_string(), f.clone());
                    plugin.signatur_fehler = Some(f);
                    false
                }
                None => {
                    // Frueherer Fehler ist behoben
                    fehler.remove(plugin.id());
                    true
                }
            })
            .collect()
    }

    /// Nicht-fatale Pruefungen und UI-Verdrahtung der verifizierten Plugins
    async fn verifizierte_vorbereiten(
        &self,
        plugins: &mut [Plugin],
        eltern: &[Option<usize>],
        akzeptiert: &[bool],
    ) {
        let app_eltern: Vec<Option<AppEltern>> = eltern
            .iter()
            .map(|e| {
                e.map(|i| &plugins[i])
                    .filter(|p| p.ist_app())
                    .map(|p| AppEltern {
                        id: p.id().to_string(),
                        base_url: p.base_url.clone(),
                        dir: p.plugin_dir.clone(),
                        kern: p.ist_kern_plugin(),
                    })
            })
            .collect();

        for ((plugin, ok), app) in plugins.iter_mut().zip(akzeptiert).zip(&app_eltern) {
            if !ok {
                continue;
            }
            self.modul_pruefen(plugin).await;

            if plugin.ist_app() {
                plugin.default_nav_url = standard_nav_url(plugin);
            }
            if let Some(app) = app {
                app_kind_konfigurieren(app, plugin);
            }
        }
    }

    /// Warnt, wenn die Einstiegsdatei eines Frontend-Plugins fehlt
    async fn modul_pruefen(&self, plugin: &Plugin) {
        if plugin.ist_renderer() || plugin.ist_kern_plugin() {
            return;
        }
        // CDN-Plugins kommen ohne lokale module.js aus
        if self
            .dienste
            .ausnahmen
            .ist_signaturpruefung_ausgenommen(plugin.id())
        {
            return;
        }

        let modul = plugin.dir().join(MODUL_DATEI);
        match tokio::fs::try_exists(&modul).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(plugin_id = %plugin.id(), pfad = %modul.display(), "module.js fehlt – bei Installation aus git zuerst bauen");
            }
            Err(e) => {
                warn!(plugin_id = %plugin.id(), pfad = %modul.display(), fehler = %e, "module.js nicht pruefbar");
            }
        }
    }

    /// Registriert den Speicherort und startet den Prozess; Fehler werden nur protokolliert
    async fn starten(&self, abbruch: &CancellationToken, plugin: &Plugin) {
        if plugin.ist_extern() {
            if let Err(e) = self
                .dienste
                .speicher
                .registrieren(plugin.id(), plugin.dir())
                .await
            {
                error!(plugin_id = %plugin.id(), fehler = %e, "Plugin konnte nicht gestartet werden");
                return;
            }
        }
        if abbruch.is_cancelled() {
            warn!(plugin_id = %plugin.id(), "Start abgebrochen");
            return;
        }
        if let Err(e) = self.dienste.prozesse.starten(abbruch, plugin.id()).await {
            error!(plugin_id = %plugin.id(), fehler = %e, "Plugin konnte nicht gestartet werden");
        }
    }
}

/// Liest alle Manifeste, sortiert nach normalisiertem Plugin-Verzeichnis
fn manifeste_lesen(manifest_pfade: &[PathBuf]) -> BTreeMap<PathBuf, ManifestData> {
    let mut gefunden = BTreeMap::new();

    for pfad in manifest_pfade {
        let manifest = match ManifestData::lesen(pfad) {
            Ok(m) => m,
            Err(e) => {
                warn!(pfad = %pfad.display(), fehler = %e, "plugin.json nicht lesbar, Plugin wird uebersprungen");
                continue;
            }
        };

        let dir = match plugin_verzeichnis(pfad) {
            Ok(d) => d,
            Err(e) => {
                warn!(plugin_id = %manifest.id, fehler = %e, "Absoluter Pfad nicht bestimmbar, Plugin wird uebersprungen");
                continue;
            }
        };

        if gefunden.contains_key(&dir) {
            warn!(plugin_id = %manifest.id, pfad = %dir.display(), "Doppeltes Plugin-Verzeichnis, wird uebersprungen");
            continue;
        }
        gefunden.insert(dir, manifest);
    }

    gefunden
}

/// Absolutes, normalisiertes Verzeichnis einer plugin.json
fn plugin_verzeichnis(manifest_pfad: &Path) -> Result<PathBuf> {
    let absolut = std::path::absolute(manifest_pfad)?;
    absolut
        .parent()
        .map(tree::vergleichs_schluessel)
        .ok_or_else(|| PluginError::UngueltigerManifestPfad(manifest_pfad.display().to_string()))
}

/// Navigations-URL aus dem ersten Include mit `defaultNav`
fn standard_nav_url(plugin: &Plugin) -> Option<String> {
    let include = plugin.manifest.includes.iter().find(|i| i.default_nav)?;
    match include.typ.as_str() {
        "page" => Some(format!("/plugins/{}/page/{}", plugin.id(), include.slug)),
        "dashboard" => {
            let url = include.dashboard_url_pfad();
            if url.is_none() {
                warn!(plugin_id = %plugin.id(), include = %include.name, "Eingebundenes Dashboard ohne uid");
            }
            url
        }
        _ => None,
    }
}

/// Kind einer App: Basis-URL der App uebernehmen, Modul relativ zur App
fn app_kind_konfigurieren(app: &AppEltern, kind: &mut Plugin) {
    let unterpfad = kind
        .plugin_dir
        .strip_prefix(&app.dir)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    kind.included_in_app_id = Some(app.id.clone());
    kind.base_url = app.base_url.clone();

    let app_modul_basis = if app.kern {
        format!("app/plugins/app/{}", app.id)
    } else {
        format!("plugins/{}", app.id)
    };
    kind.module = format!("{}/module", url_fragmente_verbinden(&app_modul_basis, &unterpfad));
}
