use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{settings::Settings, task::Task};

/// Format version written into every export
pub const DATA_VERSION: &str = "1.0";

/// Identifies files produced by this application
pub const APP_NAME: &str = "re-start";

/// A user-facing export. Never mutated after creation.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: String,
    pub timestamp: Timestamp,
    pub app_name: String,
    pub settings: Settings,
    pub tasks: Vec<Task>,
    pub exported: bool,
}

/// Internal snapshot taken before destructive operations. Not redacted.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuickBackup {
    pub settings: Settings,
    pub tasks: Vec<Task>,
    pub timestamp: Timestamp,
}

/// What an import or restore carries. Either part may be absent.
///
/// Settings stay a raw map so they can be laid over the current settings key by key.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ImportData {
    #[serde(default)]
    pub settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImportedItems {
    pub settings: bool,
    pub tasks: usize,
    pub theme: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub items_imported: ImportedItems,
}

/// Summary of the current data, computed without building an export
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub total_tasks: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub custom_links: usize,
    pub theme: String,
    pub has_custom_theme: bool,
    pub last_modified: Timestamp,
}
