use super::*;

fn car(mark: &str, model: &str) -> NewCatalogEntry {
    NewCatalogEntry::new(mark, model)
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("catalog.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn inserts_and_finds_entries_by_mark() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let started = DateTime::parse_from_rfc3339("2022-07-24T09:15:00Z")
        .expect("timestamp")
        .with_timezone(&Utc);
    let mut bmw = car("BMW", "M5");
    bmw.rating = 9.5;
    bmw.times_driven = 4;
    bmw.last_started = Some(started);
    bmw.image_data = Some(vec![1, 2, 3]);
    bmw.tint_color = Some(TintColor::new(12.0, 34.0, 56.0));

    let ids = storage
        .insert_entries(&[bmw.clone(), car("Audi", "A4")])
        .await
        .expect("insert");
    assert_eq!(ids.len(), 2);

    let found = storage
        .find_by_mark("BMW")
        .await
        .expect("query")
        .expect("found");
    assert_eq!(found.id, ids[0]);
    assert_eq!(found.rating, 9.5);
    assert_eq!(found.times_driven, 4);
    assert_eq!(found.last_started, Some(started));
    assert_eq!(found.image_data.as_deref(), Some(&[1u8, 2, 3][..]));
    assert_eq!(found.tint_color, Some(TintColor::new(12.0, 34.0, 56.0)));

    let audi = storage
        .find_by_mark("Audi")
        .await
        .expect("query")
        .expect("found");
    assert!(audi.tint_color.is_none());
    assert!(audi.image_data.is_none());

    assert!(storage.find_by_mark("Lada").await.expect("query").is_none());
    assert_eq!(storage.count_entries().await.expect("count"), 2);
    assert_eq!(
        storage.list_marks().await.expect("marks"),
        vec!["BMW".to_string(), "Audi".to_string()]
    );
}

#[tokio::test]
async fn duplicate_mark_rolls_back_the_whole_batch() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let err = storage
        .insert_entries(&[car("Kia", "Rio"), car("Kia", "Ceed")])
        .await
        .expect_err("unique mark");
    assert!(format!("{err:#}").contains("Kia"));
    assert_eq!(storage.count_entries().await.expect("count"), 0);
}

#[tokio::test]
async fn saves_mutable_attributes_only() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_entries(&[car("Lexus", "RX")])
        .await
        .expect("insert");
    let mut lexus = storage
        .find_by_mark("Lexus")
        .await
        .expect("query")
        .expect("found");

    lexus.model = "ignored".into();
    lexus.rating = 3.5;
    lexus.times_driven = 7;
    lexus.my_choice = true;
    storage.save_entry(&lexus).await.expect("save");

    let reloaded = storage
        .find_by_mark("Lexus")
        .await
        .expect("query")
        .expect("found");
    assert_eq!(reloaded.model, "RX");
    assert_eq!(reloaded.rating, 3.5);
    assert_eq!(reloaded.times_driven, 7);
    assert!(reloaded.my_choice);
}

#[tokio::test]
async fn save_entries_is_all_or_nothing() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_entries(&[car("Opel", "Astra")])
        .await
        .expect("insert");
    let mut opel = storage
        .find_by_mark("Opel")
        .await
        .expect("query")
        .expect("found");
    opel.my_choice = true;
    let mut ghost = opel.clone();
    ghost.id = CarId(999);

    storage
        .save_entries(&[opel, ghost])
        .await
        .expect_err("missing id");

    assert!(storage.find_favorites().await.expect("favorites").is_empty());
}

#[tokio::test]
async fn negative_trip_count_is_refused() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_entries(&[car("Seat", "Leon")])
        .await
        .expect("insert");
    let mut seat = storage
        .find_by_mark("Seat")
        .await
        .expect("query")
        .expect("found");
    seat.times_driven = -1;
    assert!(storage.save_entry(&seat).await.is_err());
}

#[tokio::test]
async fn data_loaded_flag_defaults_to_false() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(!storage.is_data_loaded().await.expect("flag"));
    storage.set_data_loaded(true).await.expect("set");
    assert!(storage.is_data_loaded().await.expect("flag"));
    storage.set_data_loaded(false).await.expect("reset");
    assert!(!storage.is_data_loaded().await.expect("flag"));
}

#[tokio::test]
async fn flag_survives_reopen() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        temp_root
            .path()
            .join("catalog.db")
            .to_string_lossy()
            .replace('\\', "/")
    );

    let storage = Storage::new(&database_url).await.expect("db");
    storage.set_data_loaded(true).await.expect("set");
    storage.pool().close().await;

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert!(reopened.is_data_loaded().await.expect("flag"));
}

#[test]
fn memory_urls_have_no_file_path() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert!(sqlite_path("postgres://localhost/db").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/catalog.db?mode=rwc"),
        Some(PathBuf::from("./data/catalog.db"))
    );
}
