//! Export then import through the public API, against real files.

use restart::{
    host::{CssStylesheet, DirectoryExport, FileSource},
    models::{
        settings::{Link, Theme, TimeFormat},
        store::Store,
    },
    services::{
        backup::{export_user_data, import_user_data},
        settings::{load_settings, save_settings},
        tasks::{AddTaskParameters, add_task, load_tasks, toggle_task},
    },
    storage::json::JsonFileStorage,
};
use tempfile::TempDir;

fn populated_store(storage: &JsonFileStorage) -> Store {
    let mut store = Store::load(storage);

    for (title, due) in [
        ("pay rent", Some("2026-11-01T00:00:00Z")),
        ("call mum", None),
        ("book flights", Some("2026-10-21T18:30:00Z")),
    ] {
        add_task(
            &mut store,
            storage,
            AddTaskParameters {
                title: title.to_string(),
                due: due.map(|d| d.parse().unwrap()),
                notes: Some(String::from("from the roundtrip test")),
            },
        )
        .unwrap();
    }
    let id = store.tasks[1].id;
    toggle_task(&mut store, storage, id).unwrap();

    store.settings.theme = Theme::Custom;
    store.settings.custom_theme.bg1 = String::from("#101010");
    store.settings.time_format = TimeFormat::TwentyFourHour;
    store.settings.links = vec![Link {
        title: String::from("news"),
        url: String::from("https://news.ycombinator.com"),
    }];
    store.settings.todoist_api_token = Some(String::from("very-secret"));
    save_settings(storage, &store.settings);

    store
}

#[test]
fn test_export_then_import_reconstructs_state() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source_storage = JsonFileStorage::new(temp_dir.path().join("source"));
    let original = populated_store(&source_storage);

    let mut downloads = DirectoryExport::new(temp_dir.path().join("downloads"));
    export_user_data(&original, &mut downloads).expect("export should succeed");
    let exported_file = downloads
        .last_written()
        .expect("export should write a file")
        .to_path_buf();
    let exported_text = std::fs::read_to_string(&exported_file).unwrap();
    assert!(!exported_text.contains("very-secret"));

    let target_storage = JsonFileStorage::new(temp_dir.path().join("target"));
    let mut target = Store::load(&target_storage);
    let mut stylesheet = CssStylesheet::new(temp_dir.path().join("target").join("theme.css"));

    let report = import_user_data(
        &mut target,
        &target_storage,
        &mut stylesheet,
        &mut FileSource::new(exported_file),
    )
    .expect("import should succeed");

    assert!(report.items_imported.settings);
    assert_eq!(report.items_imported.tasks, 3);
    assert_eq!(report.items_imported.theme, "custom");

    assert_eq!(target.tasks, original.tasks);

    let mut expected_settings = original.settings.clone();
    expected_settings.todoist_api_token = Some(String::new());
    assert_eq!(target.settings, expected_settings);

    // and it all made it to disk
    assert_eq!(load_tasks(&target_storage), original.tasks);
    assert_eq!(load_settings(&target_storage), expected_settings);

    stylesheet.write().unwrap();
    let css = std::fs::read_to_string(stylesheet.path()).unwrap();
    assert!(css.starts_with(":root.theme-custom {"));
    assert!(css.contains("--bg-1: #101010;"));
}

#[test]
fn test_import_rejects_non_json_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("backup.txt");
    std::fs::write(&path, "{}").unwrap();

    let storage = JsonFileStorage::new(temp_dir.path().join("data"));
    let mut store = Store::load(&storage);
    let mut stylesheet = CssStylesheet::new(temp_dir.path().join("theme.css"));

    let err = import_user_data(
        &mut store,
        &storage,
        &mut stylesheet,
        &mut FileSource::new(path),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "Invalid file type. Please select a JSON file.");
    assert!(!stylesheet.is_dirty());
}
