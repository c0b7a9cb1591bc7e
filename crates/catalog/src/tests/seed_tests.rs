use std::{fs, io::Cursor, path::Path};

use serde_json::json;

use super::{MemoryStore, RecordingSink};
use crate::{
    seed::{seed_if_empty, SeedBundle, SeedOutcome},
    store::CatalogStore,
    SelectionController,
};

fn write_png(path: &Path, rgba: [u8; 4]) {
    let mut png = Vec::new();
    image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");
    fs::write(path, png).expect("write png");
}

fn bundle_with(dir: &Path, data: serde_json::Value) -> SeedBundle {
    fs::create_dir_all(dir.join("images")).expect("images dir");
    fs::write(dir.join("data.json"), data.to_string()).expect("data.json");
    SeedBundle::new(dir)
}

fn toyota_and_honda(dir: &Path) -> SeedBundle {
    let bundle = bundle_with(
        dir,
        json!([
            {
                "mark": "Toyota",
                "model": "Corolla",
                "rating": 6.5,
                "timesDriven": 2,
                "myChoice": false,
                "imageName": "toyota",
                "tintColor": {"red": 255.0, "green": 102.0, "blue": 0.0}
            },
            {
                "mark": "Honda",
                "model": "Civic",
                "rating": 8.0,
                "lastStarted": "2022-07-20T10:00:00Z",
                "timesDriven": 5,
                "myChoice": true,
                "imageName": "honda"
            }
        ]),
    );
    write_png(&dir.join("images").join("toyota.png"), [255, 102, 0, 255]);
    write_png(&dir.join("images").join("honda.png"), [0, 0, 255, 255]);
    bundle
}

#[tokio::test]
async fn seeding_twice_inserts_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bundle = toyota_and_honda(dir.path());
    let store = MemoryStore::default();

    let first = seed_if_empty(&store, &bundle).await.expect("first seed");
    assert_eq!(
        first,
        SeedOutcome::Seeded {
            inserted: 2,
            skipped: 0
        }
    );
    let second = seed_if_empty(&store, &bundle).await.expect("second seed");
    assert_eq!(second, SeedOutcome::AlreadySeeded);

    assert_eq!(store.count_entries().await.expect("count"), 2);
    assert!(store.is_data_loaded().await.expect("flag"));
}

#[tokio::test]
async fn seeded_entries_carry_descriptor_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bundle = toyota_and_honda(dir.path());
    let store = MemoryStore::default();
    seed_if_empty(&store, &bundle).await.expect("seed");

    let toyota = store.get("Toyota").await;
    assert_eq!(toyota.model, "Corolla");
    assert_eq!(toyota.rating, 6.5);
    assert_eq!(toyota.times_driven, 2);
    assert!(toyota.last_started.is_none());
    let tint = toyota.tint_color.expect("tint");
    assert_eq!((tint.red, tint.green, tint.blue), (255.0, 102.0, 0.0));
    let png = toyota.image_data.expect("image");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let honda = store.get("Honda").await;
    assert!(honda.my_choice);
    assert!(honda.last_started.is_some());
    assert!(honda.tint_color.is_none());
}

#[tokio::test]
async fn missing_bundle_skips_and_leaves_flag_unset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = MemoryStore::default();

    let outcome = seed_if_empty(&store, &SeedBundle::new(dir.path().join("nowhere")))
        .await
        .expect("seed");
    assert!(matches!(outcome, SeedOutcome::Skipped { .. }));
    assert_eq!(store.count_entries().await.expect("count"), 0);
    assert!(!store.is_data_loaded().await.expect("flag"));
}

#[tokio::test]
async fn unparseable_bundle_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("data.json"), "{ not json").expect("write");
    let store = MemoryStore::default();

    let outcome = seed_if_empty(&store, &SeedBundle::new(dir.path()))
        .await
        .expect("seed");
    assert!(!outcome.seeded());
}

#[tokio::test]
async fn bad_descriptors_are_skipped_individually() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bundle = bundle_with(
        dir.path(),
        json!([
            {"mark": "Lada", "model": "Niva", "imageName": "missing",
             "tintColor": {"red": 10.0, "green": 20.0}},
            {"model": "no mark"},
            {"mark": "Lada", "model": "Vesta"},
            {"mark": "Volvo", "model": "XC90", "rating": "high"}
        ]),
    );
    let store = MemoryStore::default();

    let outcome = seed_if_empty(&store, &bundle).await.expect("seed");
    assert_eq!(
        outcome,
        SeedOutcome::Seeded {
            inserted: 1,
            skipped: 3
        }
    );
    let lada = store.get("Lada").await;
    assert_eq!(lada.model, "Niva");
    assert!(lada.image_data.is_none());
    assert!(lada.tint_color.is_none());
}

#[tokio::test]
async fn existing_entries_without_flag_are_not_reseeded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bundle = toyota_and_honda(dir.path());
    let store = MemoryStore::default();
    store
        .insert_entries(&[shared::domain::NewCatalogEntry::new("Toyota", "Corolla")])
        .await
        .expect("insert");

    let outcome = seed_if_empty(&store, &bundle).await.expect("seed");
    assert_eq!(outcome, SeedOutcome::AlreadySeeded);
    assert_eq!(store.count_entries().await.expect("count"), 1);
    assert!(store.is_data_loaded().await.expect("flag"));
}

#[tokio::test]
async fn startup_seeds_then_selects_first_mark() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bundle = toyota_and_honda(dir.path());
    let mut ctl = SelectionController::new(MemoryStore::default(), RecordingSink::default());

    let report = ctl.startup(&bundle, None).await;
    assert!(report.seed.expect("seed").seeded());
    assert_eq!(report.selected.as_deref(), Some("Toyota"));

    let view = ctl.sink().last_view();
    let image = view.image.as_ref().expect("bitmap");
    assert_eq!((image.width, image.height), (4, 4));
    assert_eq!(&image.rgba[..4], &[255, 102, 0, 255]);
    assert!(view.background.is_some());
}

#[tokio::test]
async fn startup_with_empty_catalog_stays_idle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut ctl = SelectionController::new(MemoryStore::default(), RecordingSink::default());

    let report = ctl.startup(&SeedBundle::new(dir.path()), Some("Toyota")).await;
    assert!(matches!(report.seed, Ok(SeedOutcome::Skipped { .. })));
    assert!(report.selected.is_none());
    assert!(ctl.selection().is_none());
    assert!(ctl.sink().views.is_empty());
}
