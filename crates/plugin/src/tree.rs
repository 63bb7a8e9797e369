//! Abhaengigkeitsbaum aus der Verzeichnisverschachtelung
//!
//! Ein Plugin ist Kind desjenigen Plugins aus demselben Batch, dessen
//! Verzeichnis sein naechster Vorfahre ist. Bereits registrierte Plugins
//! aus frueheren Batches kommen als Elternteil nicht in Frage.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Weak};

use crate::plugin::Plugin;

/// Normalisiert einen Pfad fuer Vergleiche: einheitliche Trenner, keine
/// abschliessenden Trenner, `.` und `..` rein lexikalisch aufgeloest.
pub fn vergleichs_schluessel(pfad: &Path) -> PathBuf {
    let vereinheitlicht = pfad.to_string_lossy().replace('\\', "/");
    let mut schluessel = PathBuf::new();
    for teil in Path::new(&vereinheitlicht).components() {
        match teil {
            Component::CurDir => {}
            Component::ParentDir => match schluessel.components().next_back() {
                Some(Component::Normal(_)) => {
                    schluessel.pop();
                }
                // `..` oberhalb der Wurzel bleibt die Wurzel
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => schluessel.push(".."),
            },
            _ => schluessel.push(teil.as_os_str()),
        }
    }
    schluessel
}

/// Bestimmt fuer jedes Verzeichnis den Index seines Elternteils im Batch.
///
/// Die Verzeichnisse muessen bereits absolut sein. Das Ergebnis hat dieselbe
/// Laenge und Reihenfolge wie die Eingabe.
pub fn eltern_bestimmen(verzeichnisse: &[PathBuf]) -> Vec<Option<usize>> {
    let index: HashMap<PathBuf, usize> = verzeichnisse
        .iter()
        .enumerate()
        .map(|(i, d)| (vergleichs_schluessel(d), i))
        .collect();

    verzeichnisse
        .iter()
        .map(|dir| {
            let schluessel = vergleichs_schluessel(dir);
            // ancestors() beginnt beim Verzeichnis selbst, daher skip(1)
            schluessel
                .ancestors()
                .skip(1)
                .find_map(|vorfahre| index.get(vorfahre).copied())
        })
        .collect()
}

/// Kehrt die Elternzuordnung in Kinderlisten um
pub fn kinder_bestimmen(eltern: &[Option<usize>]) -> Vec<Vec<usize>> {
    let mut kinder = vec![Vec::new(); eltern.len()];
    for (kind, elternteil) in eltern.iter().enumerate() {
        if let Some(e) = elternteil {
            kinder[*e].push(kind);
        }
    }
    kinder
}

/// Baut aus den Plugins eines Batches den Wald mit Eltern- und Kinderverweisen.
///
/// Kinder gehoeren ihrem Elternteil, der Rueckverweis ist schwach. Das
/// Ergebnis enthaelt jedes Plugin genau einmal, in der Reihenfolge der Eingabe.
pub fn wald_aufbauen(plugins: Vec<Plugin>, eltern: &[Option<usize>]) -> Vec<Arc<Plugin>> {
    let kinder = kinder_bestimmen(eltern);
    let mut plaetze: Vec<Option<Plugin>> = plugins.into_iter().map(Some).collect();
    let mut fertig: Vec<Option<Arc<Plugin>>> = vec![None; plaetze.len()];

    for wurzel in (0..eltern.len()).filter(|i| eltern[*i].is_none()) {
        materialisieren(wurzel, Weak::new(), &kinder, &mut plaetze, &mut fertig);
    }

    fertig.into_iter().flatten().collect()
}

fn materialisieren(
    index: usize,
    elternteil: Weak<Plugin>,
    kinder: &[Vec<usize>],
    plaetze: &mut [Option<Plugin>],
    fertig: &mut [Option<Arc<Plugin>>],
) -> Option<Arc<Plugin>> {
    let mut plugin = plaetze.get_mut(index)?.take()?;
    let arc = Arc::new_cyclic(|selbst| {
        plugin.parent = elternteil;
        plugin.children = kinder[index]
            .iter()
            .filter_map(|&kind| materialisieren(kind, selbst.clone(), kinder, plaetze, fertig))
            .collect();
        plugin
    });
    fertig[index] = Some(Arc::clone(&arc));
    Some(arc)
}
