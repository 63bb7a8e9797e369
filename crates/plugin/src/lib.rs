//! plugwerk-plugin – Plugin-Lade-Pipeline
//!
//! Findet plugin.json Dateien auf der Platte, prueft Manifeste und Signaturen,
//! leitet Eltern/Kind-Beziehungen aus der Verzeichnisverschachtelung ab,
//! registriert akzeptierte Plugins und steuert ihren Start/Stop.
//!
//! # Architektur
//! - [`loader::PluginLoader`] – Load/Unload-Workflow und Fehlerliste
//! - [`manifest::ManifestData`] – plugin.json lesen, validieren, normalisieren
//! - [`signature`] – Signatur berechnen (Ed25519) und gegen Richtlinie pruefen
//! - [`tree`] – Abhaengigkeitsbaum aus Verzeichnispfaden
//! - [`registry::PluginRegistry`] – geladene Plugins, nebenlaeufig nutzbar
//! - [`process`], [`storage`], [`initializer`], [`roles`] – austauschbare Dienste

pub mod assetpath;
pub mod config;
pub mod error;
pub mod finder;
pub mod initializer;
pub mod loader;
pub mod manifest;
pub mod metrics;
pub mod plugin;
pub mod process;
pub mod registry;
pub mod roles;
pub mod signature;
pub mod storage;
pub mod tree;
pub mod types;

// Bequeme Re-Exporte
pub use config::LoaderKonfiguration;
pub use error::{PluginError, Result};
pub use loader::{LoaderDienste, PluginLoader};
pub use manifest::ManifestData;
pub use plugin::Plugin;
pub use registry::PluginRegistry;
pub use types::{
    FehlerCode, PluginClass, PluginFehlerEintrag, PluginTyp, Signatur, SignaturFehler,
    SignaturStatus, SignaturTyp,
};
