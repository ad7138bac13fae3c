use jiff::{Timestamp, tz::TimeZone};
use log::{error, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    models::{
        backup::{
            APP_NAME, Backup, BackupInfo, DATA_VERSION, ImportData, ImportReport, ImportedItems,
            QuickBackup,
        },
        settings::Theme,
        store::Store,
    },
    services::{
        settings::{StyleTarget, apply_theme, save_settings},
        tasks::{normalize_tasks, save_tasks},
    },
    storage::{QUICK_BACKUP_KEY, Storage, StorageError, set_json},
};

/// Media type an import source must declare
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Where an export file goes: a browser download, a directory, ...
pub trait ExportTarget {
    fn deliver(&mut self, filename: &str, contents: &str) -> std::io::Result<()>;
}

/// A single user-picked file. Read once, in full.
pub trait ImportSource {
    fn media_type(&self) -> &str;
    fn read_to_string(&mut self) -> std::io::Result<String>;
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize backup: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write backup file '{filename}': {source}")]
    Deliver {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid file type. Please select a JSON file.")]
    InvalidFileType(String),

    #[error("Failed to read file")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to parse backup file: {0}")]
    ParseFailed(#[source] serde_json::Error),

    #[error("Invalid backup file format")]
    InvalidFormat,
}

pub fn export_filename(timestamp: Timestamp) -> String {
    format!("re-start-backup-{}.json", timestamp.strftime("%Y-%m-%d"))
}

/// Builds a redacted backup of everything and hands it to `target` as pretty JSON.
pub fn export_user_data(
    store: &Store,
    target: &mut impl ExportTarget,
) -> Result<Backup, ExportError> {
    let backup = Backup {
        version: DATA_VERSION.to_string(),
        timestamp: Timestamp::now(),
        app_name: APP_NAME.to_string(),
        settings: store.settings.redacted(),
        tasks: store.tasks.clone(),
        exported: true,
    };

    let json = serde_json::to_string_pretty(&backup)?;
    let filename = export_filename(backup.timestamp);
    target
        .deliver(&filename, &json)
        .map_err(|e| ExportError::Deliver {
            filename: filename.clone(),
            source: e,
        })?;

    info!("exported {} tasks to {}", backup.tasks.len(), filename);
    Ok(backup)
}

// Truthy in the loose sense: present and not null, "", false or 0
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// Checks that `data` looks like a backup produced by this app.
/// A different `version` is accepted with a warning.
pub fn validate_import_data(data: &Value) -> bool {
    let Some(obj) = data.as_object() else {
        return false;
    };

    if !is_present(obj.get("version")) || !is_present(obj.get("timestamp")) {
        return false;
    }

    if obj.get("appName").and_then(Value::as_str) != Some(APP_NAME) {
        return false;
    }

    match obj.get("settings") {
        None | Some(Value::Null) | Some(Value::Object(_)) => {}
        Some(_) => return false,
    }

    match obj.get("tasks") {
        None | Some(Value::Null) | Some(Value::Array(_)) => {}
        Some(_) => return false,
    }

    if obj.get("version").and_then(Value::as_str) != Some(DATA_VERSION) {
        warn!(
            "version mismatch: expected {}, got {}",
            DATA_VERSION, obj["version"]
        );
    }

    true
}

/// Reads, validates and applies a backup file.
pub fn import_user_data(
    store: &mut Store,
    storage: &impl Storage,
    style: &mut impl StyleTarget,
    source: &mut impl ImportSource,
) -> Result<ImportReport, ImportError> {
    if source.media_type() != JSON_MEDIA_TYPE {
        return Err(ImportError::InvalidFileType(source.media_type().to_string()));
    }

    let content = source.read_to_string().map_err(ImportError::ReadFailed)?;
    let value: Value = serde_json::from_str(&content).map_err(ImportError::ParseFailed)?;

    if !validate_import_data(&value) {
        return Err(ImportError::InvalidFormat);
    }

    let backup_date = local_date(&value["timestamp"]);
    let data: ImportData = serde_json::from_value(value).map_err(ImportError::ParseFailed)?;
    let items_imported =
        apply_imported_data(store, storage, style, data).map_err(ImportError::ParseFailed)?;

    info!(
        "imported backup from {}: {} tasks, settings: {}",
        backup_date, items_imported.tasks, items_imported.settings
    );

    Ok(ImportReport {
        success: true,
        message: format!("Successfully imported backup from {backup_date}"),
        items_imported,
    })
}

// M/D/YYYY in local time, or the raw value when it is not a timestamp.
// Numbers are epoch milliseconds.
fn local_date(value: &Value) -> String {
    let timestamp = match value {
        Value::String(s) => s.parse::<Timestamp>().ok(),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Timestamp::from_millisecond(millis).ok()),
        _ => None,
    };
    match (timestamp, value) {
        (Some(timestamp), _) => timestamp
            .to_zoned(TimeZone::system())
            .strftime("%-m/%-d/%Y")
            .to_string(),
        (None, Value::String(s)) => s.clone(),
        (None, other) => other.to_string(),
    }
}

/// Lays imported settings over the current ones and replaces the task list.
///
/// Everything is computed before anything is committed, so on error the store is
/// unchanged. Absent parts leave their side of the store alone.
pub fn apply_imported_data(
    store: &mut Store,
    storage: &impl Storage,
    style: &mut impl StyleTarget,
    data: ImportData,
) -> Result<ImportedItems, serde_json::Error> {
    let settings = data
        .settings
        .map(|imported| store.settings.overlaid_with(imported))
        .transpose()?;
    let tasks = data.tasks.map(normalize_tasks);

    let has_settings = settings.is_some();
    if let Some(settings) = settings {
        store.settings = settings;
        apply_theme(store.settings.theme, &store.settings, style);
        save_settings(storage, &store.settings);
    }

    let task_count = match tasks {
        Some(tasks) => {
            let count = tasks.len();
            store.tasks = tasks;
            save_tasks(storage, &store.tasks);
            count
        }
        None => 0,
    };

    Ok(ImportedItems {
        settings: has_settings,
        tasks: task_count,
        theme: store.settings.theme.name().to_string(),
    })
}

/// Overwrites the single quick backup slot with the current, unredacted state.
pub fn create_quick_backup(store: &Store, storage: &impl Storage) -> QuickBackup {
    let backup = QuickBackup {
        settings: store.settings.clone(),
        tasks: store.tasks.clone(),
        timestamp: Timestamp::now(),
    };

    if let Err(e) = set_json(storage, QUICK_BACKUP_KEY, &backup) {
        error!("failed to save quick backup: {}", e);
    }

    backup
}

/// Applies the quick backup if there is one. `false` means nothing changed.
pub fn restore_quick_backup(
    store: &mut Store,
    storage: &impl Storage,
    style: &mut impl StyleTarget,
) -> bool {
    let raw = match storage.get(QUICK_BACKUP_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return false,
        Err(e) => {
            error!("failed to restore quick backup: {}", e);
            return false;
        }
    };

    let data = match serde_json::from_str::<ImportData>(&raw) {
        Ok(data) => data,
        Err(e) => {
            error!("failed to restore quick backup: {}", e);
            return false;
        }
    };

    match apply_imported_data(store, storage, style, data) {
        Ok(_) => true,
        Err(e) => {
            error!("failed to restore quick backup: {}", e);
            false
        }
    }
}

/// Takes a quick backup, wipes the whole storage namespace and reloads the store
/// from it, leaving defaults.
///
/// The wipe removes the quick backup slot as well, so the backup is returned to
/// the caller.
pub fn factory_reset(
    store: &mut Store,
    storage: &impl Storage,
    style: &mut impl StyleTarget,
) -> Result<QuickBackup, StorageError> {
    let backup = create_quick_backup(store, storage);

    storage.clear()?;

    *store = Store::load(storage);
    apply_theme(store.settings.theme, &store.settings, style);

    info!("factory reset done, {} tasks dropped", backup.tasks.len());
    Ok(backup)
}

pub fn get_backup_info(store: &Store) -> BackupInfo {
    let completed_tasks = store.get_completed_tasks().count();
    BackupInfo {
        total_tasks: store.tasks.len(),
        active_tasks: store.tasks.len() - completed_tasks,
        completed_tasks,
        custom_links: store.settings.links.len(),
        theme: store.settings.theme.name().to_string(),
        has_custom_theme: store.settings.theme == Theme::Custom,
        last_modified: Timestamp::now(),
    }
}
