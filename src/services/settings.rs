use log::{debug, error, warn};
use serde_json::{Map, Value};

use crate::{
    models::{
        settings::{ColorRole, Settings, Theme},
        store::Store,
    },
    storage::{SETTINGS_KEY, Storage, set_json},
};

/// Receives theme colors. The browser page sets CSS variables; the CLI writes a stylesheet.
pub trait StyleTarget {
    fn set_color_variable(&mut self, role: ColorRole, value: &str);
    /// Replaces any previously applied theme marker with `marker`
    fn set_active_theme_marker(&mut self, marker: &str);
}

/// Saved settings laid over the defaults, so keys added since the save are populated.
/// Missing or unreadable data yields the defaults; a single stored value that does
/// not fit keeps its default while the other keys still apply.
pub fn load_settings(storage: &impl Storage) -> Settings {
    let raw = match storage.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Settings::default(),
        Err(e) => {
            error!("failed to load settings: {}", e);
            return Settings::default();
        }
    };

    let parsed = match serde_json::from_str::<Map<String, Value>>(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("failed to parse stored settings: {}", e);
            return Settings::default();
        }
    };

    let (settings, rejected) = Settings::default().overlaid_per_key(parsed);
    for key in rejected {
        warn!("ignoring stored setting '{}', its value does not fit", key);
    }
    settings
}

/// Best effort: a failed write is logged, never returned.
pub fn save_settings(storage: &impl Storage, settings: &Settings) {
    if let Err(e) = set_json(storage, SETTINGS_KEY, settings) {
        error!("failed to save settings: {}", e);
    }
}

/// Pushes the colors of `theme` to `target` and marks it active.
/// `Theme::Custom` takes its colors from `settings.custom_theme`.
pub fn apply_theme(theme: Theme, settings: &Settings, target: &mut impl StyleTarget) {
    target.set_active_theme_marker(&theme.marker());

    let palette = theme
        .builtin_palette()
        .unwrap_or_else(|| settings.custom_theme.clone());
    for role in ColorRole::ALL {
        target.set_color_variable(role, palette.color(role));
    }

    debug!("applied theme {}", theme);
}

pub fn set_theme(
    store: &mut Store,
    storage: &impl Storage,
    target: &mut impl StyleTarget,
    theme: Theme,
) {
    update_settings(store, storage, target, |settings| settings.theme = theme);
}

/// Edits settings in place, persists them and re-applies the resulting theme
pub fn update_settings(
    store: &mut Store,
    storage: &impl Storage,
    target: &mut impl StyleTarget,
    edit: impl FnOnce(&mut Settings),
) {
    edit(&mut store.settings);
    apply_theme(store.settings.theme, &store.settings, target);
    save_settings(storage, &store.settings);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        models::settings::{Palette, TimeFormat, WidgetType},
        storage::memory::MemoryStorage,
    };

    /// Records what a document root would end up with
    #[derive(Default)]
    pub(crate) struct RecordingTarget {
        pub variables: Vec<(ColorRole, String)>,
        pub marker: Option<String>,
        pub marker_changes: usize,
    }

    impl StyleTarget for RecordingTarget {
        fn set_color_variable(&mut self, role: ColorRole, value: &str) {
            self.variables.retain(|(r, _)| *r != role);
            self.variables.push((role, value.to_string()));
        }

        fn set_active_theme_marker(&mut self, marker: &str) {
            self.marker = Some(marker.to_string());
            self.marker_changes += 1;
        }
    }

    impl RecordingTarget {
        pub fn color(&self, role: ColorRole) -> Option<&str> {
            self.variables
                .iter()
                .find(|(r, _)| *r == role)
                .map(|(_, v)| v.as_str())
        }
    }

    #[test]
    fn test_load_settings_defaults_when_missing() {
        let storage = MemoryStorage::new();
        assert_eq!(load_settings(&storage), Settings::default());
    }

    #[test]
    fn test_load_settings_defaults_when_corrupt() {
        let storage = MemoryStorage::new();
        storage.set(SETTINGS_KEY, "{ not json").unwrap();
        assert_eq!(load_settings(&storage), Settings::default());

        storage.set(SETTINGS_KEY, "[1, 2]").unwrap();
        assert_eq!(load_settings(&storage), Settings::default());
    }

    #[test]
    fn test_load_settings_keeps_valid_keys_next_to_unknown_values() {
        let storage = MemoryStorage::new();
        storage
            .set(
                SETTINGS_KEY,
                r#"{"widgetType":"weather","theme":"no-such-theme","links":[],"linksPerColumn":7,"timeFormat":"24hr"}"#,
            )
            .unwrap();

        let settings = load_settings(&storage);

        assert_eq!(settings.widget_type, WidgetType::Tasks);
        assert_eq!(settings.theme, Theme::CatppuccinMocha);
        assert!(settings.links.is_empty());
        assert_eq!(settings.links_per_column, 7);
        assert_eq!(settings.time_format, TimeFormat::TwentyFourHour);
    }

    #[test]
    fn test_load_settings_backfills_missing_keys() {
        let storage = MemoryStorage::new();
        storage
            .set(SETTINGS_KEY, r#"{"timeFormat":"24hr","links":[]}"#)
            .unwrap();

        let settings = load_settings(&storage);

        assert_eq!(settings.time_format, TimeFormat::TwentyFourHour);
        assert!(settings.links.is_empty());
        assert_eq!(settings.theme, Theme::CatppuccinMocha);
        assert_eq!(settings.links_per_column, 4);
    }

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::new();
        let mut settings = Settings::default();
        settings.theme = Theme::Light;
        settings.todoist_api_token = Some(String::from("token"));

        save_settings(&storage, &settings);

        assert_eq!(load_settings(&storage), settings);
    }

    #[test]
    fn test_apply_builtin_theme() {
        let mut target = RecordingTarget::default();

        apply_theme(Theme::Dark, &Settings::default(), &mut target);

        assert_eq!(target.marker.as_deref(), Some("theme-dark"));
        assert_eq!(target.variables.len(), 9);
        assert_eq!(target.color(ColorRole::Bg1), Some("#0d1117"));
        assert_eq!(target.color(ColorRole::TxtErr), Some("#f85149"));
    }

    #[test]
    fn test_apply_custom_theme_uses_settings_palette() {
        let mut target = RecordingTarget::default();
        let mut settings = Settings::default();
        settings.custom_theme = Palette {
            txt1: String::from("#abcdef"),
            ..Palette::light()
        };

        apply_theme(Theme::Light, &settings, &mut target);
        apply_theme(Theme::Custom, &settings, &mut target);

        assert_eq!(target.marker.as_deref(), Some("theme-custom"));
        assert_eq!(target.marker_changes, 2);
        assert_eq!(target.variables.len(), 9);
        assert_eq!(target.color(ColorRole::Txt1), Some("#abcdef"));
    }

    #[test]
    fn test_set_theme_persists_and_applies() {
        let storage = MemoryStorage::new();
        let mut store = Store::default();
        let mut target = RecordingTarget::default();

        set_theme(&mut store, &storage, &mut target, Theme::Light);

        assert_eq!(store.settings.theme, Theme::Light);
        assert_eq!(target.marker.as_deref(), Some("theme-light"));
        assert_eq!(load_settings(&storage).theme, Theme::Light);
    }
}
