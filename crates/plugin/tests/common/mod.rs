//! Gemeinsame Test-Umgebung: Loader mit protokollierenden Fake-Diensten

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use plugwerk_plugin::assetpath::LokaleAssetPfade;
use plugwerk_plugin::finder::DateisystemFinder;
use plugwerk_plugin::initializer::Initialisierer;
use plugwerk_plugin::manifest::RollenRegistrierung;
use plugwerk_plugin::process::ProzessVerwaltung;
use plugwerk_plugin::roles::RollenRegistry;
use plugwerk_plugin::signature::{SignaturAusnahmen, SignaturRechner};
use plugwerk_plugin::storage::SpeicherVerwaltung;
use plugwerk_plugin::{
    LoaderDienste, LoaderKonfiguration, Plugin, PluginClass, PluginError, PluginLoader,
    PluginRegistry, Result, Signatur, SignaturStatus, SignaturTyp,
};

/// Gemeinsames Protokoll aller Dienstaufrufe in Aufrufreihenfolge
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn eintragen(&self, eintrag: String) {
        self.0.lock().push(eintrag);
    }

    pub fn eintraege(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn enthaelt(&self, eintrag: &str) -> bool {
        self.0.lock().iter().any(|e| e == eintrag)
    }
}

/// Liefert pro Plugin-ID einen festgelegten Status (Standard: gueltig)
pub struct TabellenRechner {
    status: Mutex<HashMap<String, SignaturStatus>>,
    org: Option<String>,
    berechnet: Mutex<HashSet<String>>,
}

impl TabellenRechner {
    pub fn setzen(&self, plugin_id: &str, status: SignaturStatus) {
        self.status.lock().insert(plugin_id.to_string(), status);
    }

    /// Wurde fuer dieses Plugin eine Signatur berechnet?
    pub fn berechnet(&self, plugin_id: &str) -> bool {
        self.berechnet.lock().contains(plugin_id)
    }
}

impl SignaturRechner for TabellenRechner {
    fn berechnen(&self, plugin: &Plugin) -> Result<Signatur> {
        self.berechnet.lock().insert(plugin.id().to_string());
        let status = self
            .status
            .lock()
            .get(plugin.id())
            .copied()
            .unwrap_or(SignaturStatus::Gueltig);
        Ok(Signatur {
            status,
            typ: (status == SignaturStatus::Gueltig).then_some(SignaturTyp::Community),
            org: self.org.clone(),
        })
    }
}

/// Feste Liste ausgenommener Plugin-IDs (z.B. vom CDN ausgeliefert)
pub struct FesteAusnahmen(HashSet<String>);

impl SignaturAusnahmen for FesteAusnahmen {
    fn ist_signaturpruefung_ausgenommen(&self, plugin_id: &str) -> bool {
        self.0.contains(plugin_id)
    }
}

/// Initialisierer, der fuer ausgewaehlte IDs fehlschlaegt
pub struct ProtokollInitialisierer {
    journal: Journal,
    fehlschlagen: Mutex<HashSet<String>>,
}

impl ProtokollInitialisierer {
    pub fn fehlschlagen_fuer(&self, plugin_id: &str) {
        self.fehlschlagen.lock().insert(plugin_id.to_string());
    }
}

#[async_trait]
impl Initialisierer for ProtokollInitialisierer {
    async fn initialisieren(&self, _abbruch: &CancellationToken, plugin: &Plugin) -> Result<()> {
        self.journal.eintragen(format!("init:{}", plugin.id()));
        if self.fehlschlagen.lock().contains(plugin.id()) {
            return Err(PluginError::initialisierung(plugin.id(), "Backend nicht erreichbar"));
        }
        Ok(())
    }
}

pub struct ProtokollRollen {
    journal: Journal,
    fehlschlagen: bool,
}

#[async_trait]
impl RollenRegistry for ProtokollRollen {
    async fn rollen_deklarieren(
        &self,
        plugin_id: &str,
        _plugin_name: &str,
        _rollen: &[RollenRegistrierung],
    ) -> Result<()> {
        self.journal.eintragen(format!("rollen:{plugin_id}"));
        if self.fehlschlagen {
            return Err(PluginError::Rollen("Rollenspeicher nicht verfuegbar".into()));
        }
        Ok(())
    }
}

pub struct ProtokollProzesse {
    journal: Journal,
    start_fehler: Mutex<HashSet<String>>,
    stopp_fehler: Mutex<HashSet<String>>,
}

impl ProtokollProzesse {
    pub fn start_scheitert_fuer(&self, plugin_id: &str) {
        self.start_fehler.lock().insert(plugin_id.to_string());
    }

    pub fn stopp_scheitert_fuer(&self, plugin_id: &str) {
        self.stopp_fehler.lock().insert(plugin_id.to_string());
    }
}

#[async_trait]
impl ProzessVerwaltung for ProtokollProzesse {
    async fn starten(&self, _abbruch: &CancellationToken, plugin_id: &str) -> Result<()> {
        self.journal.eintragen(format!("start:{plugin_id}"));
        if self.start_fehler.lock().contains(plugin_id) {
            return Err(PluginError::prozess(plugin_id, "Start fehlgeschlagen"));
        }
        Ok(())
    }

    async fn stoppen(&self, _abbruch: &CancellationToken, plugin_id: &str) -> Result<()> {
        self.journal.eintragen(format!("stop:{plugin_id}"));
        if self.stopp_fehler.lock().contains(plugin_id) {
            return Err(PluginError::prozess(plugin_id, "Stopp fehlgeschlagen"));
        }
        Ok(())
    }
}

pub struct ProtokollSpeicher {
    journal: Journal,
    entfernen_scheitert: Mutex<bool>,
}

impl ProtokollSpeicher {
    pub fn entfernen_scheitert(&self) {
        *self.entfernen_scheitert.lock() = true;
    }
}

#[async_trait]
impl SpeicherVerwaltung for ProtokollSpeicher {
    async fn registrieren(&self, plugin_id: &str, _dir: &Path) -> Result<()> {
        self.journal.eintragen(format!("speicher:{plugin_id}"));
        Ok(())
    }

    async fn entfernen(&self, plugin_id: &str) -> Result<()> {
        self.journal.eintragen(format!("speicher-entfernen:{plugin_id}"));
        if *self.entfernen_scheitert.lock() {
            return Err(PluginError::Speicher("Datentraeger schreibgeschuetzt".into()));
        }
        Ok(())
    }
}

/// Optionen fuer den Aufbau der Umgebung
#[derive(Default)]
pub struct Optionen {
    pub cfg: LoaderKonfiguration,
    pub signierende_org: Option<String>,
    pub rollen_scheitern: bool,
    pub ausgenommen: Vec<String>,
}

pub struct Umgebung {
    pub wurzel: TempDir,
    pub loader: PluginLoader,
    pub registry: Arc<PluginRegistry>,
    pub rechner: Arc<TabellenRechner>,
    pub initialisierer: Arc<ProtokollInitialisierer>,
    pub prozesse: Arc<ProtokollProzesse>,
    pub speicher: Arc<ProtokollSpeicher>,
    pub journal: Journal,
}

impl Umgebung {
    pub fn neu() -> Self {
        Self::mit_optionen(Optionen::default())
    }

    pub fn mit_optionen(optionen: Optionen) -> Self {
        let wurzel = TempDir::new().expect("Temp-Verzeichnis konnte nicht erstellt werden");
        let journal = Journal::default();
        let registry = Arc::new(PluginRegistry::neu());

        let rechner = Arc::new(TabellenRechner {
            status: Mutex::new(HashMap::new()),
            org: optionen.signierende_org,
            berechnet: Mutex::new(HashSet::new()),
        });
        let initialisierer = Arc::new(ProtokollInitialisierer {
            journal: journal.clone(),
            fehlschlagen: Mutex::new(HashSet::new()),
        });
        let prozesse = Arc::new(ProtokollProzesse {
            journal: journal.clone(),
            start_fehler: Mutex::new(HashSet::new()),
            stopp_fehler: Mutex::new(HashSet::new()),
        });
        let speicher = Arc::new(ProtokollSpeicher {
            journal: journal.clone(),
            entfernen_scheitert: Mutex::new(false),
        });

        let dienste = LoaderDienste {
            registry: Arc::clone(&registry),
            finder: Arc::new(DateisystemFinder),
            asset_pfade: Arc::new(LokaleAssetPfade::default()),
            rechner: rechner.clone(),
            ausnahmen: Arc::new(FesteAusnahmen(optionen.ausgenommen.into_iter().collect())),
            initialisierer: initialisierer.clone(),
            rollen: Arc::new(ProtokollRollen {
                journal: journal.clone(),
                fehlschlagen: optionen.rollen_scheitern,
            }),
            prozesse: prozesse.clone(),
            speicher: speicher.clone(),
        };
        let loader = PluginLoader::neu(&optionen.cfg, dienste).expect("Loader konnte nicht erstellt werden");

        Self {
            wurzel,
            loader,
            registry,
            rechner,
            initialisierer,
            prozesse,
            speicher,
            journal,
        }
    }

    /// Legt ein Plugin-Verzeichnis mit plugin.json und module.js an
    pub fn plugin_anlegen(&self, rel: &str, id: &str, typ: &str) -> PathBuf {
        self.manifest_anlegen(rel, &format!(r#"{{ "id": "{id}", "type": "{typ}" }}"#))
    }

    pub fn manifest_anlegen(&self, rel: &str, json: &str) -> PathBuf {
        let manifest = self.nur_manifest_anlegen(rel, json);
        fs::write(self.wurzel.path().join(rel).join("module.js"), "export {}").unwrap();
        manifest
    }

    /// Plugin-Verzeichnis ohne module.js (z.B. vom CDN ausgeliefert)
    pub fn nur_manifest_anlegen(&self, rel: &str, json: &str) -> PathBuf {
        let dir = self.wurzel.path().join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("plugin.json"), json).unwrap();
        dir.join("plugin.json")
    }

    /// Laedt alles unterhalb des Wurzelverzeichnisses
    pub async fn laden(&self, class: PluginClass) -> Result<Vec<Arc<Plugin>>> {
        self.loader
            .laden(
                &CancellationToken::new(),
                class,
                &[self.wurzel.path().to_path_buf()],
            )
            .await
    }
}

pub fn ids(plugins: &[Arc<Plugin>]) -> Vec<&str> {
    plugins.iter().map(|p| p.id()).collect()
}
