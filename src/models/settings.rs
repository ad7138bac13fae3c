use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12hr")]
    TwelveHour,
    #[serde(rename = "24hr")]
    TwentyFourHour,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TempUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    #[default]
    Mph,
    Kmh,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    #[default]
    Tasks,
    News,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    CatppuccinMocha,
    Dark,
    Light,
    Custom,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::CatppuccinMocha, Theme::Dark, Theme::Light, Theme::Custom];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::CatppuccinMocha => "catppuccin-mocha",
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Custom => "custom",
        }
    }

    /// Class-style marker placed on the document root, e.g. `theme-dark`
    pub fn marker(&self) -> String {
        format!("theme-{}", self.name())
    }

    /// Colors for the built-in themes. `None` for `Custom`, whose colors live in settings.
    pub fn builtin_palette(&self) -> Option<Palette> {
        match self {
            Theme::CatppuccinMocha => Some(Palette::catppuccin_mocha()),
            Theme::Dark => Some(Palette::dark()),
            Theme::Light => Some(Palette::light()),
            Theme::Custom => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown theme '{0}'. Expected one of: catppuccin-mocha, dark, light, custom")]
pub struct UnknownThemeError(pub String);

impl std::str::FromStr for Theme {
    type Err = UnknownThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.name() == s)
            .ok_or_else(|| UnknownThemeError(s.to_string()))
    }
}

/// The nine color roles a theme defines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Bg1,
    Bg2,
    Bg3,
    Bg4,
    Txt4,
    Txt3,
    Txt2,
    Txt1,
    TxtErr,
}

impl ColorRole {
    pub const ALL: [ColorRole; 9] = [
        ColorRole::Bg1,
        ColorRole::Bg2,
        ColorRole::Bg3,
        ColorRole::Bg4,
        ColorRole::Txt4,
        ColorRole::Txt3,
        ColorRole::Txt2,
        ColorRole::Txt1,
        ColorRole::TxtErr,
    ];

    /// CSS custom property name for this role
    pub fn variable(&self) -> &'static str {
        match self {
            ColorRole::Bg1 => "--bg-1",
            ColorRole::Bg2 => "--bg-2",
            ColorRole::Bg3 => "--bg-3",
            ColorRole::Bg4 => "--bg-4",
            ColorRole::Txt4 => "--txt-4",
            ColorRole::Txt3 => "--txt-3",
            ColorRole::Txt2 => "--txt-2",
            ColorRole::Txt1 => "--txt-1",
            ColorRole::TxtErr => "--txt-err",
        }
    }
}

/// Color value per role. Serialized as the `customTheme` settings object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Palette {
    pub bg1: String,
    pub bg2: String,
    pub bg3: String,
    pub bg4: String,
    pub txt4: String,
    pub txt3: String,
    pub txt2: String,
    pub txt1: String,
    pub txt_err: String,
}

impl Palette {
    fn from_colors(colors: [&str; 9]) -> Self {
        let [bg1, bg2, bg3, bg4, txt4, txt3, txt2, txt1, txt_err] = colors.map(String::from);
        Self {
            bg1,
            bg2,
            bg3,
            bg4,
            txt4,
            txt3,
            txt2,
            txt1,
            txt_err,
        }
    }

    pub fn catppuccin_mocha() -> Self {
        Self::from_colors([
            "#1e1e2e", "#313244", "#45475a", "#585b70", "#6c7086", "#a6adc8", "#cdd6f4",
            "#f5e0dc", "#f38ba8",
        ])
    }

    pub fn dark() -> Self {
        Self::from_colors([
            "#0d1117", "#161b22", "#21262d", "#30363d", "#7d8590", "#8b949e", "#c9d1d9",
            "#f0f6fc", "#f85149",
        ])
    }

    pub fn light() -> Self {
        Self::from_colors([
            "#ffffff", "#f6f8fa", "#e1e4e8", "#d1d5da", "#6a737d", "#586069", "#24292e",
            "#1a1a1a", "#d73a49",
        ])
    }

    pub fn color(&self, role: ColorRole) -> &str {
        match role {
            ColorRole::Bg1 => &self.bg1,
            ColorRole::Bg2 => &self.bg2,
            ColorRole::Bg3 => &self.bg3,
            ColorRole::Bg4 => &self.bg4,
            ColorRole::Txt4 => &self.txt4,
            ColorRole::Txt3 => &self.txt3,
            ColorRole::Txt2 => &self.txt2,
            ColorRole::Txt1 => &self.txt1,
            ColorRole::TxtErr => &self.txt_err,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::catppuccin_mocha()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub title: String,
    pub url: String,
}

impl Link {
    fn new(title: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub time_format: TimeFormat,
    pub latitude: f64,
    pub longitude: f64,
    pub temp_unit: TempUnit,
    pub speed_unit: SpeedUnit,
    pub widget_type: WidgetType,
    pub theme: Theme,
    pub custom_theme: Palette,
    pub links_per_column: u32,
    pub links: Vec<Link>,
    /// Todoist integration token. Never leaves the app in an export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todoist_api_token: Option<String>,
    /// Keys this version does not know about, kept so they survive a save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::TwelveHour,
            latitude: 38.388129,
            longitude: 27.175331,
            temp_unit: TempUnit::Fahrenheit,
            speed_unit: SpeedUnit::Mph,
            widget_type: WidgetType::Tasks,
            theme: Theme::CatppuccinMocha,
            custom_theme: Palette::catppuccin_mocha(),
            links_per_column: 4,
            links: vec![
                Link::new("gmail", "https://mail.google.com"),
                Link::new("calendar", "https://calendar.google.com"),
                Link::new("drive", "https://drive.google.com"),
                Link::new("docs", "https://docs.google.com"),
                Link::new("github", "https://github.com"),
                Link::new("slack", "https://slack.com"),
                Link::new("keep", "https://keep.google.com"),
                Link::new("leetcode", "https://leetcode.com/problemset"),
                Link::new("perplexity", "https://perplexity.ai"),
                Link::new("claude", "https://claude.ai"),
                Link::new("aistudio", "https://aistudio.google.com"),
                Link::new("chatgpt", "https://chat.openai.com"),
                Link::new("youtube", "https://youtube.com"),
                Link::new("reddit", "https://reddit.com"),
                Link::new("twitter", "https://x.com"),
                Link::new("feedly", "https://feedly.com"),
            ],
            todoist_api_token: None,
            extra: Map::new(),
        }
    }
}

/// Shallow ordered merge: every key of `top` replaces the same key in `base`.
/// Nested objects are replaced whole, not merged.
pub fn overlay(base: &mut Map<String, Value>, top: Map<String, Value>) {
    for (key, value) in top {
        base.insert(key, value);
    }
}

impl Settings {
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Returns `self` with every key of `top` laid over it. `self` is not touched.
    pub fn overlaid_with(&self, top: Map<String, Value>) -> Result<Settings, serde_json::Error> {
        let mut merged = self.to_map()?;
        overlay(&mut merged, top);
        serde_json::from_value(Value::Object(merged))
    }

    /// Like [`Settings::overlaid_with`], one key at a time. A key whose value does
    /// not fit the schema keeps its value from `self` and is returned in the second
    /// element instead.
    pub fn overlaid_per_key(&self, top: Map<String, Value>) -> (Settings, Vec<String>) {
        let mut merged = self.clone();
        let mut rejected = Vec::new();

        for (key, value) in top {
            let single = Map::from_iter([(key.clone(), value)]);
            match merged.overlaid_with(single) {
                Ok(settings) => merged = settings,
                Err(_) => rejected.push(key),
            }
        }

        (merged, rejected)
    }

    /// Copy safe to hand outside the app: the integration token is blanked.
    pub fn redacted(&self) -> Settings {
        let mut settings = self.clone();
        if settings.todoist_api_token.is_some() {
            settings.todoist_api_token = Some(String::new());
        }
        settings
    }

    /// Colors for the active theme
    pub fn active_palette(&self) -> Palette {
        self.theme
            .builtin_palette()
            .unwrap_or_else(|| self.custom_theme.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_serializes_every_key() {
        let map = Settings::default().to_map().unwrap();
        for key in [
            "timeFormat",
            "latitude",
            "longitude",
            "tempUnit",
            "speedUnit",
            "widgetType",
            "theme",
            "customTheme",
            "linksPerColumn",
            "links",
        ] {
            assert!(map.contains_key(key), "missing {key}");
        }
        assert!(!map.contains_key("todoistApiToken"));
        assert_eq!(map["timeFormat"], json!("12hr"));
        assert_eq!(map["theme"], json!("catppuccin-mocha"));
        assert_eq!(map["customTheme"]["txtErr"], json!("#f38ba8"));
    }

    #[test]
    fn test_overlay_top_wins_per_key() {
        let mut base = json!({ "a": 1, "b": { "x": 1, "y": 2 } })
            .as_object()
            .unwrap()
            .clone();
        let top = json!({ "b": { "x": 9 }, "c": 3 }).as_object().unwrap().clone();

        overlay(&mut base, top);

        assert_eq!(Value::Object(base), json!({ "a": 1, "b": { "x": 9 }, "c": 3 }));
    }

    #[test]
    fn test_overlaid_with_backfills_and_keeps_unknown_keys() {
        let top = json!({ "theme": "light", "futureFlag": true })
            .as_object()
            .unwrap()
            .clone();

        let merged = Settings::default().overlaid_with(top).unwrap();

        assert_eq!(merged.theme, Theme::Light);
        assert_eq!(merged.links_per_column, 4);
        assert_eq!(merged.extra.get("futureFlag"), Some(&json!(true)));
        assert_eq!(merged.to_map().unwrap()["futureFlag"], json!(true));
    }

    #[test]
    fn test_partial_custom_theme_fills_missing_roles() {
        let top = json!({ "customTheme": { "bg1": "#000000" } })
            .as_object()
            .unwrap()
            .clone();

        let merged = Settings::default().overlaid_with(top).unwrap();

        assert_eq!(merged.custom_theme.bg1, "#000000");
        assert_eq!(merged.custom_theme.txt_err, "#f38ba8");
    }

    #[test]
    fn test_overlay_with_wrong_type_fails() {
        let top = json!({ "linksPerColumn": "four" }).as_object().unwrap().clone();
        assert!(Settings::default().overlaid_with(top).is_err());
    }

    #[test]
    fn test_overlaid_per_key_skips_only_bad_values() {
        let top = json!({
            "widgetType": "weather",
            "links": [],
            "linksPerColumn": 7,
            "timeFormat": "24hr",
            "latitude": null
        })
        .as_object()
        .unwrap()
        .clone();

        let (merged, mut rejected) = Settings::default().overlaid_per_key(top);
        rejected.sort();

        assert_eq!(rejected, ["latitude", "widgetType"]);
        assert_eq!(merged.widget_type, WidgetType::Tasks);
        assert_eq!(merged.latitude, Settings::default().latitude);
        assert!(merged.links.is_empty());
        assert_eq!(merged.links_per_column, 7);
        assert_eq!(merged.time_format, TimeFormat::TwentyFourHour);
    }

    #[test]
    fn test_redacted_blanks_present_token_only() {
        let mut settings = Settings::default();
        assert_eq!(settings.redacted().todoist_api_token, None);

        settings.todoist_api_token = Some(String::from("secret"));
        assert_eq!(settings.redacted().todoist_api_token.as_deref(), Some(""));
        assert_eq!(settings.todoist_api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_theme_parse_and_marker() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("solarized".parse::<Theme>().is_err());
        assert_eq!(Theme::CatppuccinMocha.marker(), "theme-catppuccin-mocha");
    }

    #[test]
    fn test_active_palette_for_custom_uses_settings() {
        let mut settings = Settings::default();
        settings.theme = Theme::Custom;
        settings.custom_theme.bg1 = String::from("#123456");

        assert_eq!(settings.active_palette().color(ColorRole::Bg1), "#123456");

        settings.theme = Theme::Light;
        assert_eq!(settings.active_palette().color(ColorRole::Bg1), "#ffffff");
    }
}
