//! Suche nach plugin.json Dateien unterhalb der angegebenen Verzeichnisse

use std::path::PathBuf;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::manifest::MANIFEST_DATEI;

/// Findet Manifest-Dateien fuer einen Lade-Batch
pub trait Finder: Send + Sync {
    fn finden(&self, pfade: &[PathBuf]) -> Result<Vec<PathBuf>>;
}

/// Durchsucht Verzeichnisse rekursiv (Symlinks werden verfolgt)
#[derive(Debug, Clone, Default)]
pub struct DateisystemFinder;

impl Finder for DateisystemFinder {
    fn finden(&self, pfade: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut gefunden = Vec::new();

        for wurzel in pfade {
            if !wurzel.exists() {
                warn!(pfad = %wurzel.display(), "Plugin-Verzeichnis existiert nicht, wird uebersprungen");
                continue;
            }

            for eintrag in WalkDir::new(wurzel).follow_links(true) {
                let eintrag = match eintrag {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(pfad = %wurzel.display(), fehler = %e, "Eintrag nicht lesbar, wird uebersprungen");
                        continue;
                    }
                };
                if eintrag.file_type().is_file() && eintrag.file_name() == MANIFEST_DATEI {
                    gefunden.push(eintrag.into_path());
                }
            }
        }

        gefunden.sort();
        gefunden.dedup();
        debug!(anzahl = gefunden.len(), "Manifest-Dateien gefunden");
        Ok(gefunden)
    }
}
