use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// UUID to identify the task
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Title of the task, trimmed and never empty
    pub title: String,
    /// Notes of the task, trimmed
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    /// Whether the task is done
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    /// When the task is due
    #[serde(default)]
    pub due: Option<Timestamp>,
    /// When the task was created
    #[serde(default = "Timestamp::now", deserialize_with = "timestamp_or_now")]
    pub created_at: Timestamp,
    /// When the task was completed. Set if and only if `completed` is true
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    /// Insertion index at creation time. Informational only
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: usize,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            notes: String::new(),
            completed: false,
            due: None,
            created_at: Timestamp::now(),
            completed_at: None,
            position: 0,
        }
    }
}

impl Task {
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Partial update of a task. Absent fields are left untouched.
///
/// Has no `id` field, so an `id` key in a JSON patch is ignored.
#[derive(Deserialize, Default, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub due: Option<Option<Timestamp>>,
    #[serde(default, deserialize_with = "double_option")]
    pub completed_at: Option<Option<Timestamp>>,
}

// `null` is read the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn timestamp_or_now<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Timestamp>::deserialize(deserializer).map(|t| t.unwrap_or_else(Timestamp::now))
}

// Distinguishes `"due": null` (clear) from a missing key (keep).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
