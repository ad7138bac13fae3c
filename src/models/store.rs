use crate::{
    models::{settings::Settings, task::Task},
    services::{settings::load_settings, tasks::load_tasks},
    storage::Storage,
};

/// Live application state. Built once at startup and handed to every service.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub settings: Settings,
    pub tasks: Vec<Task>,
}

impl Store {
    /// Reads settings and tasks from `storage`, falling back to defaults
    pub fn load(storage: &impl Storage) -> Self {
        Self {
            settings: load_settings(storage),
            tasks: load_tasks(storage),
        }
    }

    pub fn get_task(&self, id: uuid::Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_active_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    pub fn get_completed_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.completed)
    }
}
