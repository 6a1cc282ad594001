//! Hover-to-locale navigation: selection scoping, lookup and ensure-and-create

use crate::common::{TestProject, sample_code};
use crosslink::config::LocaleConfig;
use crosslink::providers::{OpenOutcome, open_locale_key};
use crosslink::{FsTextStore, LocaleHoverProvider, LocaleKeyService, OpenLocaleKeyArgs};
use serde_json::Value;
use std::sync::Arc;

fn service() -> Arc<LocaleKeyService> {
    let config = LocaleConfig {
        settle_delay_ms: 10,
        ..Default::default()
    };
    Arc::new(LocaleKeyService::new(Arc::new(FsTextStore), config))
}

#[tokio::test]
async fn test_ensure_then_lookup_round_trip() {
    let project = TestProject::new();
    let en = project.add_file("src/locales/en.json", sample_code::EN_LOCALE);
    let service = service();

    let created = service
        .ensure_key_and_locate(&en, "General.copy.missing", true, true)
        .await
        .unwrap();

    let lookup = service.lookup(&en, "General.copy.missing");
    assert!(lookup.exists);
    assert_eq!(lookup.range, Some(created));
    assert_eq!(lookup.preview.as_deref(), Some("\"\""));

    let written = project.read("src/locales/en.json");
    let parsed: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["General"]["copy"]["text"], "Copy");
    assert_eq!(parsed["General"]["cancel"], "Cancel");
}

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let project = TestProject::new();
    let en = project.add_file("src/locales/en.json", sample_code::EN_LOCALE);
    let service = service();

    let first = service
        .ensure_key_and_locate(&en, "Settings.about.title", true, true)
        .await
        .unwrap();
    let after_first = project.read("src/locales/en.json");

    let second = service
        .ensure_key_and_locate(&en, "Settings.about.title", true, true)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(project.read("src/locales/en.json"), after_first);
}

#[test]
fn test_hover_resolves_the_scoped_segment() {
    let project = TestProject::new();
    project.add_file("src/locales/en.json", sample_code::EN_LOCALE);
    project.add_file("src/locales/fr.json", r#"{"General": {"copy": {}}}"#);
    let document = project.add_file("src/components/copy.tsx", "");

    let provider = LocaleHoverProvider::new(service());
    let text = r#"<span>{t("General.copy.text")}</span>"#;

    // Middle segment resolves "General.copy", present in both locales
    let offset = text.find("copy").unwrap() + 1;
    let hover = provider
        .provide_hover(project.path(), &document, text, offset)
        .unwrap();
    assert!(hover.markdown.contains("`General.copy` (2/3)"));
    assert!(hover.markdown.contains("Go to [en]("));
    assert!(!hover.markdown.contains(r"\(missing"));

    // Leaf resolves the full key, missing in fr
    let offset = text.find("text\"").unwrap();
    let hover = provider
        .provide_hover(project.path(), &document, text, offset)
        .unwrap();
    assert!(hover.markdown.contains("`General.copy.text` (3/3)"));
    assert!(hover.markdown.contains("): Copy"));
    assert!(hover.markdown.contains(r"[fr \(missing\)]("));
}

#[tokio::test]
async fn test_hover_link_creates_missing_key() {
    let project = TestProject::new();
    project.add_file("src/locales/en.json", sample_code::EN_LOCALE);
    let fr = project.add_file("src/locales/fr.json", "{}");
    let document = project.add_file("src/pages/index.tsx", "");

    let service = service();
    let provider = LocaleHoverProvider::new(service.clone());
    let text = r#"t("General.cancel")"#;
    let hover = provider
        .provide_hover(project.path(), &document, text, 12)
        .unwrap();

    let label = r"[fr \(missing\)](";
    let link_start = hover.markdown.find(label).unwrap() + label.len();
    let link_end = link_start + hover.markdown[link_start..].find(')').unwrap();
    let args = OpenLocaleKeyArgs::parse(&hover.markdown[link_start..link_end]).unwrap();
    assert!(args.leaf);
    assert!(args.create_if_missing);

    match open_locale_key(&service, &args).await {
        OpenOutcome::Revealed { location } => assert_eq!(location.path, fr),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(service.lookup(&fr, "General.cancel").exists);
}

#[test]
fn test_locale_files_are_listed_by_locale() {
    let project = TestProject::new();
    project.add_file("src/locales/zh-Hans.json", "{}");
    project.add_file("src/locales/en.json", "{}");
    project.add_file("src/locales/nested/ignored.json", "{}");
    project.add_file("src/locales/readme.md", "");

    let files = service().list_locale_files(project.path()).unwrap();
    let locales: Vec<_> = files.iter().map(|file| file.locale.as_str()).collect();
    assert_eq!(locales, vec!["en", "zh-Hans"]);
}
