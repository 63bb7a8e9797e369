//! Plugwerk Server – Einstiegspunkt
//!
//! Aufruf: `plugwerk-server [--pruefen]`
//!
//! Ohne Argumente werden alle Plugins geladen und der Server laeuft bis zum
//! Shutdown-Signal. Mit `--pruefen` werden die Plugins einmal geladen und
//! wieder gestoppt; der Exit-Code ist 1 wenn ein Plugin abgelehnt wurde.

use anyhow::{bail, Result};
use plugwerk_server::{config::ServerConfig, Server};

/// Betriebsart laut Kommandozeile
#[derive(Debug, PartialEq, Eq)]
enum Modus {
    Dienst,
    Pruefen,
}

fn modus_bestimmen(args: impl IntoIterator<Item = String>) -> Result<Modus> {
    let mut modus = Modus::Dienst;
    for arg in args {
        match arg.as_str() {
            "--pruefen" => modus = Modus::Pruefen,
            anderes => bail!("Unbekanntes Argument: {anderes}"),
        }
    }
    Ok(modus)
}

#[tokio::main]
async fn main() -> Result<()> {
    let modus = modus_bestimmen(std::env::args().skip(1))?;
    let config_pfad = std::env::var("PLUGWERK_CONFIG").unwrap_or_else(|_| "plugwerk.toml".into());
    let config = ServerConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        plugins = %config.extern_verzeichnis().display(),
        kern = config.plugins.kern_verzeichnisse.len(),
        gebuendelt = config.plugins.gebuendelt_verzeichnisse.len(),
        modus = ?modus,
        "Plugwerk Server wird initialisiert"
    );

    let server = Server::neu(config)?;
    match modus {
        Modus::Dienst => server.starten().await?,
        Modus::Pruefen => {
            if !server.pruefen().await {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Initialisiert tracing-subscriber mit dem konfigurierten Level und Format
fn logging_initialisieren(level: &str, format: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}
