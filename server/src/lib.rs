//! plugwerk-server – Bibliotheks-Root
//!
//! Verdrahtet die Standard-Dienste der Plugin-Pipeline, laedt alle
//! Plugin-Klassen und stoppt beim Shutdown alle Plugin-Prozesse.

pub mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServerConfig;
use plugwerk_plugin::{LoaderDienste, PluginClass, PluginLoader, PluginRegistry};
use tokio_util::sync::CancellationToken;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
    loader: PluginLoader,
    abbruch: CancellationToken,
}

impl Server {
    /// Erstellt einen neuen Server mit den Standard-Diensten
    ///
    /// Legt das Verzeichnis fuer extern installierte Plugins an, falls es fehlt.
    pub fn neu(config: ServerConfig) -> Result<Self> {
        let extern_dir = config.extern_verzeichnis();
        std::fs::create_dir_all(extern_dir).with_context(|| {
            format!("Plugin-Verzeichnis '{}' konnte nicht angelegt werden", extern_dir.display())
        })?;

        let registry = Arc::new(PluginRegistry::neu());
        let dienste = LoaderDienste::standard(&config.plugins.loader, registry)?;
        let loader = PluginLoader::neu(&config.plugins.loader, dienste)?;
        Ok(Self {
            config,
            loader,
            abbruch: CancellationToken::new(),
        })
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Protokolliert die aktive Signatur-Richtlinie
    pub fn richtlinie_protokollieren(&self) {
        let lader = &self.config.plugins.loader;
        if lader.entwicklungsmodus {
            tracing::warn!("Entwicklungsmodus aktiv: unsignierte Plugins werden zugelassen");
        }
        tracing::info!(
            unsigniert_erlaubt = lader.unsigniert_erlaubt.len(),
            erlaubte_orgs = lader.erlaubte_signatur_orgs.len(),
            schluessel = lader.vertrauenswuerdige_schluessel.len(),
            cdn_plugins = lader.cdn_plugins.len(),
            "Signatur-Richtlinie"
        );
        if lader.vertrauenswuerdige_schluessel.is_empty() && !lader.entwicklungsmodus {
            tracing::warn!("Keine vertrauenswuerdigen Schluessel konfiguriert, signierte Plugins werden abgelehnt");
        }
    }

    /// Laedt nacheinander Kern-, gebuendelte und externe Plugins
    ///
    /// Ein Fehler in einer Klasse verhindert nicht das Laden der uebrigen.
    pub async fn plugins_laden(&self) -> usize {
        let klassen: [(PluginClass, Vec<PathBuf>); 3] = [
            (PluginClass::Kern, self.config.plugins.kern_verzeichnisse.clone()),
            (
                PluginClass::Gebuendelt,
                self.config.plugins.gebuendelt_verzeichnisse.clone(),
            ),
            (PluginClass::Extern, vec![self.config.extern_verzeichnis().clone()]),
        ];

        let mut gesamt = 0;
        for (class, verzeichnisse) in klassen {
            match self.loader.laden(&self.abbruch, class, &verzeichnisse).await {
                Ok(geladen) => {
                    tracing::info!(klasse = %class, anzahl = geladen.len(), "Plugins geladen");
                    gesamt += geladen.len();
                }
                Err(e) => {
                    tracing::error!(klasse = %class, fehler = %e, "Plugins konnten nicht geladen werden");
                }
            }
        }

        for eintrag in self.loader.plugin_fehler() {
            tracing::warn!(
                plugin_id = %eintrag.plugin_id,
                code = eintrag.fehler_code.as_str(),
                "Plugin abgelehnt"
            );
        }
        gesamt
    }

    /// Laedt alle Plugins und laeuft bis zum Shutdown-Signal
    pub async fn starten(self) -> Result<()> {
        self.richtlinie_protokollieren();
        let anzahl = self.plugins_laden().await;
        tracing::info!(plugins = anzahl, "Server laeuft. Warte auf Shutdown-Signal (Ctrl-C / SIGTERM)...");

        shutdown_signal().await?;
        tracing::info!("Shutdown-Signal empfangen, Plugins werden gestoppt");

        self.beenden().await;
        Ok(())
    }

    /// Laedt einmal alle Plugins und stoppt sie wieder
    ///
    /// Liefert `true` wenn kein Plugin abgelehnt wurde.
    pub async fn pruefen(self) -> bool {
        self.richtlinie_protokollieren();
        self.plugins_laden().await;
        let abgelehnt = self.loader.plugin_fehler().len();
        self.beenden().await;
        tracing::info!(abgelehnt, "Plugin-Pruefung abgeschlossen");
        abgelehnt == 0
    }

    /// Stoppt alle registrierten Plugins
    pub async fn beenden(&self) {
        self.loader.alle_stoppen(&self.abbruch).await;
        self.abbruch.cancel();
    }
}

/// Wartet auf Ctrl-C oder (unter Unix) SIGTERM
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r?,
            _ = term.recv() => {}
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
