use std::{cmp::Ordering, collections::HashSet};

use jiff::{Timestamp, Zoned, tz::TimeZone};
use log::{error, warn};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        settings::TimeFormat,
        store::Store,
        task::{Task, TaskPatch},
    },
    storage::{Storage, TASKS_KEY, set_json},
};

/// Reads the task collection, returning an empty one when absent or unreadable
pub fn load_tasks(storage: &impl Storage) -> Vec<Task> {
    let raw = match storage.get(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            error!("failed to load tasks: {}", e);
            return Vec::new();
        }
    };

    let records = match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(records) => records,
        Err(e) => {
            error!("failed to parse stored tasks: {}", e);
            return Vec::new();
        }
    };

    let tasks = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Task>(record) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!("dropping stored task #{}: {}", index, e);
                None
            }
        })
        .collect();

    normalize_tasks(tasks)
}

/// Best effort: a failed write is logged and the in-memory tasks stay authoritative.
pub fn save_tasks(storage: &impl Storage, tasks: &[Task]) {
    if let Err(e) = set_json(storage, TASKS_KEY, &tasks) {
        error!("failed to save tasks: {}", e);
    }
}

/// Repairs records coming from storage or a backup so the collection invariants hold.
pub fn normalize_tasks(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen_ids = HashSet::new();

    tasks
        .into_iter()
        .filter_map(|mut task| {
            task.title = task.title.trim().to_string();
            task.notes = task.notes.trim().to_string();

            if task.title.is_empty() {
                warn!("dropping task {} with an empty title", task.id);
                return None;
            }

            if !seen_ids.insert(task.id) {
                let new_id = Uuid::new_v4();
                warn!("task id {} is duplicated, reissued as {}", task.id, new_id);
                task.id = new_id;
                seen_ids.insert(new_id);
            }

            match (task.completed, task.completed_at) {
                (true, None) => task.completed_at = Some(task.created_at),
                (false, Some(_)) => task.completed_at = None,
                _ => {}
            }

            Some(task)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
}

pub struct AddTaskParameters {
    pub title: String,
    pub due: Option<Timestamp>,
    pub notes: Option<String>,
}

pub fn add_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: AddTaskParameters,
) -> Result<Task, AddTaskError> {
    let title = parameters.title.trim();
    if title.is_empty() {
        return Err(AddTaskError::EmptyTitle);
    }

    let task = Task {
        id: Uuid::new_v4(),
        title: title.to_string(),
        notes: parameters
            .notes
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        completed: false,
        due: parameters.due,
        created_at: Timestamp::now(),
        completed_at: None,
        position: store.tasks.len(),
    };

    store.tasks.push(task.clone());
    save_tasks(storage, &store.tasks);

    Ok(task)
}

#[derive(Debug, Error)]
pub enum UpdateTaskError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
}

/// Merges `patch` into the task with `id`. `Ok(None)` when no such task exists.
pub fn update_task(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
    patch: TaskPatch,
) -> Result<Option<Task>, UpdateTaskError> {
    let Some(task) = store.tasks.iter_mut().find(|t| t.id == id) else {
        return Ok(None);
    };

    let title = match patch.title {
        Some(title) if title.trim().is_empty() => return Err(UpdateTaskError::EmptyTitle),
        Some(title) => Some(title.trim().to_string()),
        None => None,
    };

    if let Some(title) = title {
        task.title = title;
    }
    if let Some(notes) = patch.notes {
        task.notes = notes.trim().to_string();
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
    if let Some(due) = patch.due {
        task.due = due;
    }
    if let Some(completed_at) = patch.completed_at {
        task.completed_at = completed_at;
    }

    // completed_at is set exactly while the task is completed
    if !task.completed {
        task.completed_at = None;
    } else if task.completed_at.is_none() {
        task.completed_at = Some(Timestamp::now());
    }

    let updated = task.clone();
    save_tasks(storage, &store.tasks);

    Ok(Some(updated))
}

/// Returns whether a task was removed
pub fn delete_task(store: &mut Store, storage: &impl Storage, id: Uuid) -> bool {
    let Some(index) = store.tasks.iter().position(|t| t.id == id) else {
        return false;
    };

    store.tasks.remove(index);
    save_tasks(storage, &store.tasks);
    true
}

pub fn toggle_task(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
) -> Result<Option<Task>, UpdateTaskError> {
    let Some(task) = store.get_task(id) else {
        return Ok(None);
    };

    let completed = !task.completed;
    update_task(
        store,
        storage,
        id,
        TaskPatch {
            completed: Some(completed),
            completed_at: Some(completed.then(Timestamp::now)),
            ..TaskPatch::default()
        },
    )
}

/// Open tasks (and completed ones when asked), in display order
pub fn list_tasks(store: &Store, include_completed: bool) -> Vec<&Task> {
    let mut tasks: Vec<_> = store
        .tasks
        .iter()
        .filter(|t| include_completed || !t.completed)
        .collect();
    sort_tasks(&mut tasks);
    tasks
}

pub fn completed_tasks(store: &Store) -> Vec<&Task> {
    let mut tasks: Vec<_> = store.get_completed_tasks().collect();
    sort_tasks(&mut tasks);
    tasks
}

/// Removes every completed task and returns how many were removed
pub fn clear_completed_tasks(store: &mut Store, storage: &impl Storage) -> usize {
    let before = store.tasks.len();
    store.tasks.retain(|t| !t.completed);
    save_tasks(storage, &store.tasks);
    before - store.tasks.len()
}

/// Display order: open before done; recently completed first; soonest due first;
/// then oldest created first.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    if a.completed != b.completed {
        return a.completed.cmp(&b.completed);
    }

    let by_date = if a.completed {
        match (a.completed_at, b.completed_at) {
            (Some(a_done), Some(b_done)) => b_done.cmp(&a_done),
            _ => Ordering::Equal,
        }
    } else {
        match (a.due, b.due) {
            (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    };

    by_date.then_with(|| a.created_at.cmp(&b.created_at))
}

pub fn sort_tasks(tasks: &mut [&Task]) {
    tasks.sort_by(|a, b| compare_tasks(a, b));
}

pub fn is_overdue(task: &Task, now: Timestamp) -> bool {
    match task.due {
        Some(due) => !task.completed && due < now,
        None => false,
    }
}

/// Whether `due` carries a time of day in `tz`, i.e. is not local midnight
pub fn due_has_time(due: Timestamp, tz: &TimeZone) -> bool {
    let local = due.to_zoned(tz.clone());
    local.hour() != 0 || local.minute() != 0
}

/// Short relative label for a due date: "yesterday", "today", "tmrw", a weekday
/// within the coming week, or "oct 5" otherwise. Optionally followed by the time.
pub fn format_due_date(
    due: Timestamp,
    has_time: bool,
    now: &Zoned,
    time_format: TimeFormat,
) -> String {
    let due = due.to_zoned(now.time_zone().clone());
    let diff_days = now
        .date()
        .until(due.date())
        .map_or(i32::MAX, |span| span.get_days());

    let mut label = match diff_days {
        -1 => "yesterday".to_string(),
        0 => "today".to_string(),
        1 => "tmrw".to_string(),
        2..=6 => due.strftime("%a").to_string().to_lowercase(),
        _ => due.strftime("%b %-d").to_string().to_lowercase(),
    };

    if has_time {
        let time = match time_format {
            TimeFormat::TwelveHour => due.strftime("%-I:%M %p").to_string().to_lowercase(),
            TimeFormat::TwentyFourHour => due.strftime("%H:%M").to_string(),
        };
        label.push(' ');
        label.push_str(&time);
    }

    label
}

#[derive(Debug, Error)]
pub enum ResolveTaskError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Task id '{}' is ambiguous. Matching tasks: {}", .0, .1.join(", "))]
    AmbiguousTaskId(String, Vec<String>),
}

/// Finds the task whose id starts with `prefix` (hyphens optional)
pub fn resolve_task_id(store: &Store, prefix: &str) -> Result<Uuid, ResolveTaskError> {
    let needle = prefix.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(ResolveTaskError::TaskNotFound(prefix.to_string()));
    }

    let matching_tasks: Vec<_> = store
        .tasks
        .iter()
        .filter(|t| t.id.simple().to_string().starts_with(&needle))
        .collect();

    match matching_tasks.len() {
        0 => Err(ResolveTaskError::TaskNotFound(prefix.to_string())),
        1 => Ok(matching_tasks[0].id),
        _ => {
            let titles = matching_tasks.iter().map(|t| t.title.clone()).collect();
            Err(ResolveTaskError::AmbiguousTaskId(prefix.to_string(), titles))
        }
    }
}
