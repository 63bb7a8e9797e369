//! Integration-Tests fuer PluginLoader::laden

mod common;

use common::{ids, Optionen, Umgebung};
use plugwerk_plugin::{
    FehlerCode, LoaderKonfiguration, ManifestData, PluginClass, PluginError, PluginFehlerEintrag,
    SignaturStatus,
};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn app_mit_eingebettetem_panel() {
    let u = Umgebung::neu();
    u.plugin_anlegen("app", "app1", "app");
    u.plugin_anlegen("app/panel", "panel1", "panel");

    let geladen = u.laden(PluginClass::Extern).await.unwrap();

    assert_eq!(ids(&geladen), vec!["app1", "panel1"]);
    let panel = &geladen[1];
    assert_eq!(panel.parent().unwrap().id(), "app1");
    assert_eq!(panel.included_in_app_id.as_deref(), Some("app1"));
    assert_eq!(geladen[0].children().len(), 1);
    assert_eq!(geladen[0].children()[0].id(), "panel1");
}

#[tokio::test]
async fn manifest_ohne_id() {
    let u = Umgebung::neu();
    let kaputt = u.manifest_anlegen("kaputt", r#"{ "type": "panel" }"#);
    u.plugin_anlegen("heil", "heil", "panel");

    let err = ManifestData::lesen(&kaputt).unwrap_err();
    assert!(matches!(err, PluginError::ManifestUngueltig(_)));

    let geladen = u.laden(PluginClass::Extern).await.unwrap();
    assert_eq!(ids(&geladen), vec!["heil"]);
}

#[tokio::test]
async fn unbekannter_typ_wird_uebersprungen() {
    let u = Umgebung::neu();
    u.plugin_anlegen("x", "x", "widget");
    assert!(u.laden(PluginClass::Extern).await.unwrap().is_empty());
}

#[tokio::test]
async fn initialisierung_scheitert_beim_zweiten_von_drei() {
    let u = Umgebung::neu();
    u.plugin_anlegen("a", "erstes", "panel");
    u.plugin_anlegen("b", "zweites", "panel");
    u.plugin_anlegen("c", "drittes", "panel");
    u.initialisierer.fehlschlagen_fuer("zweites");

    let err = u.laden(PluginClass::Extern).await.unwrap_err();
    assert!(matches!(err, PluginError::Initialisierung { ref plugin_id, .. } if plugin_id == "zweites"));

    assert!(u.registry.enthaelt("erstes"));
    assert!(!u.registry.enthaelt("zweites"));
    assert!(!u.registry.enthaelt("drittes"));
    assert!(u.journal.enthaelt("start:erstes"));
    assert!(!u.journal.enthaelt("init:drittes"));
}

#[tokio::test]
async fn reihenfolge_der_lebenszyklus_schritte() {
    let u = Umgebung::neu();
    u.plugin_anlegen("a", "acme", "panel");

    u.laden(PluginClass::Extern).await.unwrap();

    assert_eq!(
        u.journal.eintraege(),
        vec!["init:acme", "rollen:acme", "speicher:acme", "start:acme"]
    );
}

#[tokio::test]
async fn ungueltige_signatur_und_spaetere_korrektur() {
    let u = Umgebung::neu();
    u.plugin_anlegen("boese", "boese", "panel");
    u.rechner.setzen("boese", SignaturStatus::Ungueltig);

    let geladen = u.laden(PluginClass::Extern).await.unwrap();
    assert!(geladen.is_empty());
    assert_eq!(
        u.loader.plugin_fehler(),
        vec![PluginFehlerEintrag {
            plugin_id: "boese".into(),
            fehler_code: FehlerCode::SignaturUngueltig,
        }]
    );

    u.rechner.setzen("boese", SignaturStatus::Gueltig);
    let geladen = u.laden(PluginClass::Extern).await.unwrap();
    assert_eq!(ids(&geladen), vec!["boese"]);
    assert!(u.loader.plugin_fehler().is_empty());
}

#[tokio::test]
async fn fehlerliste_ist_sortiert() {
    let u = Umgebung::neu();
    u.plugin_anlegen("1", "zulu", "panel");
    u.plugin_anlegen("2", "alpha", "panel");
    u.rechner.setzen("zulu", SignaturStatus::Veraendert);
    u.rechner.setzen("alpha", SignaturStatus::NichtSigniert);

    u.laden(PluginClass::Extern).await.unwrap();

    let fehler = u.loader.plugin_fehler();
    assert_eq!(fehler[0].plugin_id, "alpha");
    assert_eq!(fehler[0].fehler_code, FehlerCode::SignaturFehlt);
    assert_eq!(fehler[1].plugin_id, "zulu");
    assert_eq!(fehler[1].fehler_code, FehlerCode::SignaturVeraendert);
}

#[tokio::test]
async fn unsigniert_mit_freigabe() {
    let u = Umgebung::mit_optionen(Optionen {
        cfg: LoaderKonfiguration {
            unsigniert_erlaubt: vec!["lokal".into()],
            ..Default::default()
        },
        ..Default::default()
    });
    u.plugin_anlegen("lokal", "lokal", "panel");
    u.plugin_anlegen("fremd", "fremd", "panel");
    u.rechner.setzen("lokal", SignaturStatus::NichtSigniert);
    u.rechner.setzen("fremd", SignaturStatus::NichtSigniert);

    let geladen = u.laden(PluginClass::Extern).await.unwrap();
    assert_eq!(ids(&geladen), vec!["lokal"]);
    assert_eq!(u.loader.plugin_fehler().len(), 1);
}

#[tokio::test]
async fn signierende_org_nicht_zugelassen() {
    let u = Umgebung::mit_optionen(Optionen {
        cfg: LoaderKonfiguration {
            erlaubte_signatur_orgs: vec!["plugwerk".into()],
            ..Default::default()
        },
        signierende_org: Some("acme".into()),
        ..Default::default()
    });
    u.plugin_anlegen("p", "acme-panel", "panel");

    assert!(u.laden(PluginClass::Extern).await.unwrap().is_empty());
    assert_eq!(
        u.loader.plugin_fehler()[0].fehler_code,
        FehlerCode::SignaturOrgNichtErlaubt
    );
}

#[tokio::test]
async fn erneutes_laden_ist_idempotent() {
    let u = Umgebung::neu();
    u.plugin_anlegen("a", "a", "panel");
    u.plugin_anlegen("b", "b", "datasource");

    assert_eq!(u.laden(PluginClass::Extern).await.unwrap().len(), 2);
    let zweites = u.laden(PluginClass::Extern).await.unwrap();

    assert!(zweites.is_empty());
    assert_eq!(u.registry.anzahl(), 2);
}

#[tokio::test]
async fn drei_ebenen_verschachtelung() {
    let u = Umgebung::neu();
    u.plugin_anlegen("a", "a", "app");
    u.plugin_anlegen("a/b", "b", "panel");
    u.plugin_anlegen("a/b/c", "c", "panel");

    let geladen = u.laden(PluginClass::Extern).await.unwrap();

    assert_eq!(ids(&geladen), vec!["a", "b", "c"]);
    assert_eq!(geladen[1].parent().unwrap().id(), "a");
    assert_eq!(geladen[2].parent().unwrap().id(), "b");
    // Nur direkte Kinder einer App werden eingebettet
    assert_eq!(geladen[1].included_in_app_id.as_deref(), Some("a"));
    assert_eq!(geladen[2].included_in_app_id, None);
}

#[tokio::test]
async fn keine_eltern_aus_frueherem_batch() {
    // Bewusst nicht unterstuetzt: Elternteile werden nur innerhalb eines Batches gesucht
    let u = Umgebung::neu();
    let app = u.plugin_anlegen("app", "app1", "app");
    let panel = u.plugin_anlegen("app/panel", "panel1", "panel");
    let abbruch = CancellationToken::new();

    u.loader
        .plugins_laden(&abbruch, PluginClass::Extern, &[app])
        .await
        .unwrap();
    let geladen = u
        .loader
        .plugins_laden(&abbruch, PluginClass::Extern, &[panel])
        .await
        .unwrap();

    assert_eq!(ids(&geladen), vec!["panel1"]);
    assert!(geladen[0].parent().is_none());
    assert_eq!(geladen[0].included_in_app_id, None);
}

#[tokio::test]
async fn kind_ohne_eigene_signatur_folgt_elternteil() {
    let u = Umgebung::neu();
    u.plugin_anlegen("app", "app1", "app");
    u.plugin_anlegen("app/panel", "panel1", "panel");
    u.rechner.setzen("panel1", SignaturStatus::NichtSigniert);

    let geladen = u.laden(PluginClass::Extern).await.unwrap();
    assert_eq!(ids(&geladen), vec!["app1", "panel1"]);
    // Eigener Status bleibt erhalten
    assert_eq!(geladen[1].signatur, SignaturStatus::NichtSigniert);
}

#[tokio::test]
async fn start_fehler_laesst_plugin_registriert() {
    let u = Umgebung::neu();
    u.plugin_anlegen("ds", "ds", "datasource");
    u.prozesse.start_scheitert_fuer("ds");

    let geladen = u.laden(PluginClass::Extern).await.unwrap();
    assert_eq!(ids(&geladen), vec!["ds"]);
    assert!(u.registry.enthaelt("ds"));
}

#[tokio::test]
async fn rollen_fehler_ist_nicht_fatal() {
    let u = Umgebung::mit_optionen(Optionen {
        rollen_scheitern: true,
        ..Default::default()
    });
    u.plugin_anlegen("app", "app1", "app");

    let geladen = u.laden(PluginClass::Extern).await.unwrap();
    assert_eq!(ids(&geladen), vec!["app1"]);
    assert!(u.journal.enthaelt("start:app1"));
}

#[tokio::test]
async fn abgebrochenes_laden() {
    let u = Umgebung::neu();
    u.plugin_anlegen("a", "a", "panel");
    let abbruch = CancellationToken::new();
    abbruch.cancel();

    let err = u
        .loader
        .laden(&abbruch, PluginClass::Extern, &[u.wurzel.path().to_path_buf()])
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::Abgebrochen));
    assert_eq!(u.registry.anzahl(), 0);
    assert!(u.journal.eintraege().is_empty());
}

#[tokio::test]
async fn kern_plugins_ohne_speicher() {
    let u = Umgebung::neu();
    u.plugin_anlegen("panel/graph", "graph", "panel");

    let geladen = u.laden(PluginClass::Kern).await.unwrap();
    assert_eq!(geladen[0].base_url, "public/app/plugins/panel/graph");
    assert!(!u.journal.enthaelt("speicher:graph"));
    assert!(u.journal.enthaelt("start:graph"));
}

#[tokio::test]
async fn paralleles_laden_verschiedener_klassen() {
    let u = Umgebung::neu();
    let kern = u.plugin_anlegen("kern/graph", "graph", "panel");
    let extern_ = u.plugin_anlegen("extern/acme", "acme", "panel");
    let abbruch = CancellationToken::new();

    let kern = [kern];
    let extern_ = [extern_];
    let (a, b) = tokio::join!(
        u.loader.plugins_laden(&abbruch, PluginClass::Kern, &kern),
        u.loader.plugins_laden(&abbruch, PluginClass::Extern, &extern_),
    );
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
    assert_eq!(u.registry.anzahl(), 2);
}

#[tokio::test]
async fn punkt_punkt_im_pfad_wird_aufgeloest() {
    let u = Umgebung::neu();
    u.plugin_anlegen("app", "app1", "app");
    let panel = u.plugin_anlegen("app/panel", "panel1", "panel");
    std::fs::create_dir_all(u.wurzel.path().join("x")).unwrap();
    let umweg = u.wurzel.path().join("x/../app/plugin.json");
    let direkt = u.wurzel.path().join("app/plugin.json");

    let geladen = u
        .loader
        .plugins_laden(
            &CancellationToken::new(),
            PluginClass::Extern,
            &[umweg, direkt, panel],
        )
        .await
        .unwrap();

    // Derselbe Ordner zweimal: nur ein app1
    assert_eq!(ids(&geladen), vec!["app1", "panel1"]);
    assert_eq!(geladen[0].dir(), u.wurzel.path().join("app"));
    assert_eq!(geladen[1].parent().unwrap().id(), "app1");
    assert_eq!(geladen[1].included_in_app_id.as_deref(), Some("app1"));
}

#[tokio::test]
async fn ausgenommenes_plugin_ohne_signaturberechnung() {
    let u = Umgebung::mit_optionen(Optionen {
        cfg: LoaderKonfiguration {
            erlaubte_signatur_orgs: vec!["plugwerk".into()],
            ..Default::default()
        },
        signierende_org: Some("acme".into()),
        ausgenommen: vec!["cdn-panel".into()],
        ..Default::default()
    });
    u.nur_manifest_anlegen("cdn", r#"{ "id": "cdn-panel", "type": "panel" }"#);
    u.rechner.setzen("cdn-panel", SignaturStatus::Ungueltig);

    let geladen = u.laden(PluginClass::Extern).await.unwrap();

    assert_eq!(ids(&geladen), vec!["cdn-panel"]);
    assert!(!u.rechner.berechnet("cdn-panel"));
    assert_eq!(geladen[0].signatur, SignaturStatus::Gueltig);
    assert_eq!(geladen[0].signatur_org, None);
    assert!(!u.wurzel.path().join("cdn/module.js").exists());
    assert!(u.loader.plugin_fehler().is_empty());
}

#[tokio::test]
async fn ausnahme_gilt_nur_fuer_gelistete_ids() {
    let u = Umgebung::mit_optionen(Optionen {
        ausgenommen: vec!["cdn-panel".into()],
        ..Default::default()
    });
    u.plugin_anlegen("cdn", "cdn-panel", "panel");
    u.plugin_anlegen("lokal", "lokal-panel", "panel");
    u.rechner.setzen("lokal-panel", SignaturStatus::Ungueltig);

    let geladen = u.laden(PluginClass::Extern).await.unwrap();

    assert_eq!(ids(&geladen), vec!["cdn-panel"]);
    assert!(u.rechner.berechnet("lokal-panel"));
    assert_eq!(
        u.loader.plugin_fehler()[0].fehler_code,
        FehlerCode::SignaturUngueltig
    );
}
