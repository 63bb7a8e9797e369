//! Grundlegende Typen fuer das Plugin-System

use serde::{Deserialize, Serialize};

/// Herkunft eines Plugins – wird vom Aufrufer von `laden` vergeben, nie abgeleitet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginClass {
    /// Mit dem Host ausgeliefert, nicht entfernbar
    #[serde(rename = "core")]
    Kern,
    /// Mitgeliefert, aber ausserhalb des Kerns
    #[serde(rename = "bundled")]
    Gebuendelt,
    /// Nachtraeglich installiert
    #[serde(rename = "external")]
    Extern,
}

impl std::fmt::Display for PluginClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginClass::Kern => write!(f, "core"),
            PluginClass::Gebuendelt => write!(f, "bundled"),
            PluginClass::Extern => write!(f, "external"),
        }
    }
}

/// Deklarierte Plugin-Art aus dem Manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginTyp {
    Panel,
    Datasource,
    App,
    Renderer,
    #[serde(rename = "secretsmanager")]
    SecretsManager,
}

impl PluginTyp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginTyp::Panel => "panel",
            PluginTyp::Datasource => "datasource",
            PluginTyp::App => "app",
            PluginTyp::Renderer => "renderer",
            PluginTyp::SecretsManager => "secretsmanager",
        }
    }
}

impl std::fmt::Display for PluginTyp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertrauensstatus eines Plugin-Bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignaturStatus {
    /// Signatur vorhanden und alle Dateien unveraendert
    #[serde(rename = "valid")]
    Gueltig,
    /// Signatur vorhanden aber nicht verifizierbar
    #[serde(rename = "invalid")]
    Ungueltig,
    /// Keine Signatur vorhanden
    #[serde(rename = "unsigned")]
    NichtSigniert,
    /// Signatur gueltig, aber Dateien wurden nach dem Signieren veraendert
    #[serde(rename = "modified")]
    Veraendert,
}

impl std::fmt::Display for SignaturStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignaturStatus::Gueltig => write!(f, "valid"),
            SignaturStatus::Ungueltig => write!(f, "invalid"),
            SignaturStatus::NichtSigniert => write!(f, "unsigned"),
            SignaturStatus::Veraendert => write!(f, "modified"),
        }
    }
}

/// Art der Signatur (aus dem signierten Manifest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignaturTyp {
    #[serde(rename = "official")]
    Offiziell,
    #[serde(rename = "commercial")]
    Kommerziell,
    Community,
    #[serde(rename = "private")]
    Privat,
}

/// Ergebnis der Signatur-Berechnung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signatur {
    pub status: SignaturStatus,
    pub typ: Option<SignaturTyp>,
    pub org: Option<String>,
}

impl Signatur {
    /// Vorab vertrauenswuerdige Signatur (z.B. fuer CDN-Plugins)
    pub fn vertraut() -> Self {
        Self {
            status: SignaturStatus::Gueltig,
            typ: None,
            org: None,
        }
    }

    pub fn nicht_signiert() -> Self {
        Self {
            status: SignaturStatus::NichtSigniert,
            typ: None,
            org: None,
        }
    }
}

/// Stabiler Fehlercode fuer Operator-Oberflaechen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FehlerCode {
    #[serde(rename = "signatureInvalid")]
    SignaturUngueltig,
    #[serde(rename = "signatureModified")]
    SignaturVeraendert,
    #[serde(rename = "signatureMissing")]
    SignaturFehlt,
    #[serde(rename = "signatureOrgNotAllowed")]
    SignaturOrgNichtErlaubt,
}

impl FehlerCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FehlerCode::SignaturUngueltig => "signatureInvalid",
            FehlerCode::SignaturVeraendert => "signatureModified",
            FehlerCode::SignaturFehlt => "signatureMissing",
            FehlerCode::SignaturOrgNichtErlaubt => "signatureOrgNotAllowed",
        }
    }
}

/// Abgelehnte Signatur eines Plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturFehler {
    pub plugin_id: String,
    pub signatur_status: SignaturStatus,
}

impl SignaturFehler {
    /// Leitet den Fehlercode deterministisch aus dem Signaturstatus ab
    pub fn als_fehler_code(&self) -> FehlerCode {
        match self.signatur_status {
            SignaturStatus::Ungueltig => FehlerCode::SignaturUngueltig,
            SignaturStatus::Veraendert => FehlerCode::SignaturVeraendert,
            SignaturStatus::NichtSigniert => FehlerCode::SignaturFehlt,
            // Gueltige Signatur, aber signierende Organisation nicht zugelassen
            SignaturStatus::Gueltig => FehlerCode::SignaturOrgNichtErlaubt,
        }
    }
}

impl std::fmt::Display for SignaturFehler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plugin '{}' abgelehnt: Signatur {}",
            self.plugin_id, self.signatur_status
        )
    }
}

/// Eintrag in der Fehlerliste fuer Operatoren (UI/Alerting)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginFehlerEintrag {
    pub plugin_id: String,
    pub fehler_code: FehlerCode,
}
