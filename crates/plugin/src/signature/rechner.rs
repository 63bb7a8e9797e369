//! Signaturberechnung via Ed25519-signiertem MANIFEST.json
//!
//! Das signierte Manifest listet jede Datei des Plugin-Bundles mit ihrer
//! SHA-256 Pruefsumme. Signiert wird der SHA-256 Hash des kanonischen
//! Inhalts (alles ausser der Signatur selbst).
//!
//! Status:
//! - Kein MANIFEST.json: NichtSigniert
//! - Nicht lesbar, fremde Plugin-ID oder kein bekannter Schluessel: Ungueltig
//! - Datei fehlt, Pruefsumme abweichend oder nicht gelistete Datei: Veraendert
//! - Sonst: Gueltig

use std::collections::BTreeMap;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{PluginError, Result};
use crate::plugin::Plugin;
use crate::signature::SignaturRechner;
use crate::types::{Signatur, SignaturStatus, SignaturTyp};

/// Dateiname des signierten Manifests im Plugin-Verzeichnis
pub const SIGNATUR_DATEI: &str = "MANIFEST.json";

/// Signiertes Manifest wie es auf der Platte liegt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigniertesManifest {
    pub plugin: String,
    #[serde(default)]
    pub version: String,
    pub signed_by_org: String,
    pub signature_type: SignaturTyp,
    /// Relativer Pfad (mit `/`) -> SHA-256 hex
    pub files: BTreeMap<String, String>,
    /// Base64-kodierte Ed25519-Signatur
    #[serde(default)]
    pub signature: String,
}

/// Kanonischer, signierter Teil des Manifests
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignierterInhalt<'a> {
    plugin: &'a str,
    version: &'a str,
    signed_by_org: &'a str,
    signature_type: SignaturTyp,
    files: &'a BTreeMap<String, String>,
}

impl SigniertesManifest {
    fn inhalt_hash(&self) -> Result<Vec<u8>> {
        let inhalt = SignierterInhalt {
            plugin: &self.plugin,
            version: &self.version,
            signed_by_org: &self.signed_by_org,
            signature_type: self.signature_type,
            files: &self.files,
        };
        Ok(sha256(&serde_json::to_vec(&inhalt)?))
    }
}

/// Standard-Rechner: prueft gegen eine Liste vertrauenswuerdiger Schluessel
pub struct Ed25519Rechner {
    vertrauenswuerdige_keys: Vec<VerifyingKey>,
}

impl Ed25519Rechner {
    pub fn neu(vertrauenswuerdige_keys: Vec<VerifyingKey>) -> Self {
        Self {
            vertrauenswuerdige_keys,
        }
    }

    /// Erstellt den Rechner aus base64-kodierten oeffentlichen Schluesseln
    pub fn aus_base64(keys: &[String]) -> Result<Self> {
        let keys = keys
            .iter()
            .map(|k| verifying_key_dekodieren(k))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::neu(keys))
    }

    fn signatur_pruefen(&self, manifest: &SigniertesManifest) -> bool {
        let Ok(roh) = BASE64.decode(&manifest.signature) else {
            return false;
        };
        let Ok(signatur) = Signature::from_slice(&roh) else {
            return false;
        };
        let Ok(hash) = manifest.inhalt_hash() else {
            return false;
        };
        self.vertrauenswuerdige_keys
            .iter()
            .any(|key| key.verify(&hash, &signatur).is_ok())
    }
}

impl SignaturRechner for Ed25519Rechner {
    fn berechnen(&self, plugin: &Plugin) -> Result<Signatur> {
        let manifest_pfad = plugin.dir().join(SIGNATUR_DATEI);
        let inhalt = match std::fs::read_to_string(&manifest_pfad) {
            Ok(i) => i,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(plugin_id = %plugin.id(), "Kein signiertes Manifest gefunden");
                return Ok(Signatur::nicht_signiert());
            }
            Err(e) => {
                return Err(PluginError::SignaturBerechnung(format!(
                    "{}: {}",
                    manifest_pfad.display(),
                    e
                )))
            }
        };

        let ungueltig = Signatur {
            status: SignaturStatus::Ungueltig,
            typ: None,
            org: None,
        };

        let manifest: SigniertesManifest = match serde_json::from_str(&inhalt) {
            Ok(m) => m,
            Err(e) => {
                warn!(plugin_id = %plugin.id(), fehler = %e, "Signiertes Manifest nicht lesbar");
                return Ok(ungueltig);
            }
        };

        if manifest.plugin != plugin.id() {
            warn!(
                plugin_id = %plugin.id(),
                manifest_plugin = %manifest.plugin,
                "Signiertes Manifest gehoert zu einem anderen Plugin"
            );
            return Ok(ungueltig);
        }

        if !self.signatur_pruefen(&manifest) {
            warn!(plugin_id = %plugin.id(), "Signatur konnte mit keinem bekannten Schluessel verifiziert werden");
            return Ok(ungueltig);
        }

        let veraendert = Signatur {
            status: SignaturStatus::Veraendert,
            typ: Some(manifest.signature_type),
            org: Some(manifest.signed_by_org.clone()),
        };

        let vorhanden = pruefsummen_berechnen(plugin.dir())?;
        for (datei, erwartet) in &manifest.files {
            match vorhanden.get(datei) {
                Some(ist) if ist.eq_ignore_ascii_case(erwartet) => {}
                _ => {
                    warn!(plugin_id = %plugin.id(), datei = %datei, "Datei fehlt oder wurde veraendert");
                    return Ok(veraendert);
                }
            }
        }
        if let Some(datei) = vorhanden.keys().find(|d| !manifest.files.contains_key(*d)) {
            warn!(plugin_id = %plugin.id(), datei = %datei, "Nicht signierte Datei im Plugin-Verzeichnis");
            return Ok(veraendert);
        }

        Ok(Signatur {
            status: SignaturStatus::Gueltig,
            typ: Some(manifest.signature_type),
            org: Some(manifest.signed_by_org),
        })
    }
}

/// Berechnet SHA-256 Hash beliebiger Bytes
pub fn sha256(daten: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(daten);
    hasher.finalize().to_vec()
}

/// Pruefsummen aller Dateien unterhalb von `dir` (ohne das signierte Manifest)
fn pruefsummen_berechnen(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut summen = BTreeMap::new();
    for eintrag in WalkDir::new(dir).sort_by_file_name() {
        let eintrag = eintrag.map_err(|e| PluginError::SignaturBerechnung(e.to_string()))?;
        if eintrag.file_type().is_dir() {
            continue;
        }
        let relativ = eintrag
            .path()
            .strip_prefix(dir)
            .map_err(|e| PluginError::SignaturBerechnung(e.to_string()))?;
        let schluessel = relativ
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if schluessel == SIGNATUR_DATEI {
            continue;
        }
        let bytes = std::fs::read(eintrag.path())?;
        summen.insert(schluessel, hex::encode(sha256(&bytes)));
    }
    Ok(summen)
}

/// Signiert alle Dateien eines Plugin-Verzeichnisses und schreibt MANIFEST.json
pub fn manifest_signieren(
    dir: &Path,
    plugin_id: &str,
    version: &str,
    org: &str,
    typ: SignaturTyp,
    signing_key: &SigningKey,
) -> Result<SigniertesManifest> {
    let mut manifest = SigniertesManifest {
        plugin: plugin_id.to_string(),
        version: version.to_string(),
        signed_by_org: org.to_string(),
        signature_type: typ,
        files: pruefsummen_berechnen(dir)?,
        signature: String::new(),
    };
    let sig: Signature = signing_key.sign(&manifest.inhalt_hash()?);
    manifest.signature = BASE64.encode(sig.to_bytes());

    std::fs::write(
        dir.join(SIGNATUR_DATEI),
        serde_json::to_vec_pretty(&manifest)?,
    )?;
    Ok(manifest)
}

fn verifying_key_dekodieren(key_b64: &str) -> Result<VerifyingKey> {
    let roh = BASE64
        .decode(key_b64)
        .map_err(|e| PluginError::SchluesselUngueltig(format!("kein base64: {e}")))?;
    let roh: [u8; 32] = roh
        .try_into()
        .map_err(|_| PluginError::SchluesselUngueltig("Schluessel hat falsche Laenge".into()))?;
    VerifyingKey::from_bytes(&roh).map_err(|e| PluginError::SchluesselUngueltig(e.to_string()))
}

/// Generiert ein neues Ed25519-Schluesselpaar (fuer Tests und Setup)
pub fn schluesselpaar_generieren() -> (SigningKey, VerifyingKey) {
    use rand_core::RngCore;
    let mut secret = [0u8; 32];
    rand_core::OsRng.fill_bytes(&mut secret);
    let signing_key = SigningKey::from_bytes(&secret);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}
