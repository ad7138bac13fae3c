//! Task list, settings and backups for the re-start new tab dashboard.

pub mod host;
pub mod models;
pub mod services;
pub mod storage;
pub mod ui;
