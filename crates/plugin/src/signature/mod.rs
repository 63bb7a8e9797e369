//! Signatur-Dienst
//!
//! Zwei getrennte Verantwortlichkeiten:
//! - [`SignaturRechner`] – leitet den Vertrauensstatus aus dem Bundle auf der Platte ab
//! - [`validator::SignaturValidator`] – wendet die Richtlinie auf den berechneten Status an
//!
//! Plugins mit Ausnahme (z.B. von einem vertrauenswuerdigen CDN ausgeliefert)
//! ueberspringen die Berechnung und gelten als gueltig signiert.

pub mod rechner;
pub mod validator;

use std::collections::HashSet;

use crate::error::Result;
use crate::plugin::Plugin;
use crate::types::Signatur;

pub use rechner::Ed25519Rechner;
pub use validator::SignaturValidator;

/// Berechnet den Vertrauensstatus eines Plugin-Bundles
pub trait SignaturRechner: Send + Sync {
    fn berechnen(&self, plugin: &Plugin) -> Result<Signatur>;
}

/// Faehigkeitspruefung: ist das Plugin von Signaturpruefung und Asset-Warnungen ausgenommen?
pub trait SignaturAusnahmen: Send + Sync {
    fn ist_signaturpruefung_ausgenommen(&self, plugin_id: &str) -> bool;
}

/// Ausnahmen fuer Plugins, die von einem vertrauenswuerdigen CDN kommen
#[derive(Debug, Clone, Default)]
pub struct CdnAusnahmen {
    plugin_ids: HashSet<String>,
}

impl CdnAusnahmen {
    pub fn neu(plugin_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            plugin_ids: plugin_ids.into_iter().collect(),
        }
    }
}

impl SignaturAusnahmen for CdnAusnahmen {
    fn ist_signaturpruefung_ausgenommen(&self, plugin_id: &str) -> bool {
        self.plugin_ids.contains(plugin_id)
    }
}
