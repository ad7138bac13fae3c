//! Filesystem stand-ins for what the browser page provides: CSS variables,
//! file downloads and file uploads.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    models::settings::{ColorRole, Settings},
    services::{
        backup::{ExportTarget, ImportSource, JSON_MEDIA_TYPE},
        settings::{StyleTarget, apply_theme},
    },
};

/// Collects theme variables and writes them as a stylesheet scoped to the theme marker.
pub struct CssStylesheet {
    path: PathBuf,
    marker: Option<String>,
    variables: Vec<(ColorRole, String)>,
}

impl CssStylesheet {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            marker: None,
            variables: Vec::new(),
        }
    }

    /// Stylesheet already carrying the theme selected in `settings`
    pub fn with_active_theme(path: PathBuf, settings: &Settings) -> Self {
        let mut stylesheet = Self::new(path);
        apply_theme(settings.theme, settings, &mut stylesheet);
        stylesheet
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.marker.is_some() || !self.variables.is_empty()
    }

    pub fn render(&self) -> String {
        let selector = match &self.marker {
            Some(marker) => format!(":root.{marker}"),
            None => String::from(":root"),
        };

        let mut css = format!("{selector} {{\n");
        for role in ColorRole::ALL {
            if let Some((_, value)) = self.variables.iter().find(|(r, _)| *r == role) {
                css.push_str(&format!("  {}: {};\n", role.variable(), value));
            }
        }
        css.push_str("}\n");
        css
    }

    pub fn write(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, self.render())
    }
}

impl StyleTarget for CssStylesheet {
    fn set_color_variable(&mut self, role: ColorRole, value: &str) {
        match self.variables.iter_mut().find(|(r, _)| *r == role) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.variables.push((role, value.to_string())),
        }
    }

    fn set_active_theme_marker(&mut self, marker: &str) {
        self.marker = Some(marker.to_string());
    }
}

/// Saves exports into a directory, like a browser's downloads folder.
pub struct DirectoryExport {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl DirectoryExport {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            last_written: None,
        }
    }

    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl ExportTarget for DirectoryExport {
    fn deliver(&mut self, filename: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, contents)?;
        self.last_written = Some(path);
        Ok(())
    }
}

/// A file on disk offered for import. Its media type comes from the extension.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ImportSource for FileSource {
    fn media_type(&self) -> &str {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => JSON_MEDIA_TYPE,
            Some(ext) if ext.eq_ignore_ascii_case("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }

    fn read_to_string(&mut self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}
