//! Signatur-Richtlinie
//!
//! Liest nur den bereits berechneten Signaturstatus und entscheidet, ob das
//! Plugin registriert werden darf.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::LoaderKonfiguration;
use crate::plugin::Plugin;
use crate::types::{SignaturFehler, SignaturStatus};

#[derive(Debug, Clone, Default)]
pub struct SignaturValidator {
    unsigniert_erlaubt: HashSet<String>,
    erlaubte_orgs: HashSet<String>,
    entwicklungsmodus: bool,
}

impl SignaturValidator {
    pub fn aus_konfiguration(cfg: &LoaderKonfiguration) -> Self {
        Self {
            unsigniert_erlaubt: cfg.unsigniert_erlaubt.iter().cloned().collect(),
            erlaubte_orgs: cfg.erlaubte_signatur_orgs.iter().cloned().collect(),
            entwicklungsmodus: cfg.entwicklungsmodus,
        }
    }

    /// Prueft die Signatur eines Plugins gegen die Richtlinie.
    ///
    /// Verschachtelte Plugins ohne eigene gueltige Signatur werden nach dem
    /// Status ihres Elternteils beurteilt; der eigene Status bleibt unveraendert.
    pub fn validieren(&self, plugin: &Plugin, parent: Option<&Plugin>) -> Option<SignaturFehler> {
        let fehler = |status| {
            Some(SignaturFehler {
                plugin_id: plugin.id().to_string(),
                signatur_status: status,
            })
        };

        if plugin.ist_kern_plugin() || plugin.ist_gebuendelt() {
            return None;
        }

        let (status, org) = match (plugin.signatur, parent) {
            (SignaturStatus::Gueltig, _) | (_, None) => {
                (plugin.signatur, plugin.signatur_org.as_deref())
            }
            (_, Some(p)) => {
                debug!(plugin_id = %plugin.id(), parent_id = %p.id(), "Signatur des Elternteils wird herangezogen");
                (p.signatur, p.signatur_org.as_deref())
            }
        };

        match status {
            SignaturStatus::Gueltig => {
                // Ohne Org ist die Signatur vorab vertraut (CDN)
                if self.erlaubte_orgs.is_empty()
                    || org.map_or(true, |o| self.erlaubte_orgs.contains(o))
                {
                    debug!(plugin_id = %plugin.id(), "Plugin hat gueltige Signatur");
                    None
                } else {
                    fehler(SignaturStatus::Gueltig)
                }
            }
            SignaturStatus::NichtSigniert => {
                if self.entwicklungsmodus || self.unsigniert_erlaubt.contains(plugin.id()) {
                    warn!(plugin_id = %plugin.id(), "Unsigniertes Plugin wird zugelassen – nicht empfohlen");
                    None
                } else {
                    fehler(SignaturStatus::NichtSigniert)
                }
            }
            SignaturStatus::Ungueltig | SignaturStatus::Veraendert => fehler(status),
        }
    }
}
