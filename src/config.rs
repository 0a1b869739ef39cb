use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::report::ReportFormat;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "RUSTY_CUTOFF_CONFIG";
/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "rusty-cutoff.json";

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Free-text column the location filter searches.
    pub name_column: String,
    /// Categorical column the reservation filter searches.
    pub reservation_column: String,
    /// Identifier columns that are never offered as a cut-off column.
    pub excluded_columns: Vec<String>,
    /// Display columns preselected for a new batch (kept only if present).
    pub default_display_columns: Vec<String>,
    /// Rows in the "top colleges" table.
    pub top_n: usize,
    pub report: ReportSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name_column: "CollegeName".to_string(),
            reservation_column: "Reservation Details".to_string(),
            excluded_columns: vec![
                "ChoiceCodeDisplay".to_string(),
                "CollegeName".to_string(),
                "Reservation Details".to_string(),
            ],
            default_display_columns: vec![
                "ChoiceCodeDisplay".to_string(),
                "ST".to_string(),
                "General".to_string(),
                "CollegeName".to_string(),
            ],
            top_n: 5,
            report: ReportSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Load from `$RUSTY_CUTOFF_CONFIG`, else `./rusty-cutoff.json`, else
    /// fall back to the defaults.  A file that exists but does not parse is
    /// an error.
    pub fn discover() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(CONFIG_FILE)).filter(|p| p.exists()));
        match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                log::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub format: ReportFormat,
    /// Fixed width in millimetres per display column.
    pub column_widths: BTreeMap<String, f32>,
    /// Width for display columns not listed in `column_widths`.
    pub default_column_width: f32,
    /// Header of the blank trailing column left for manual annotation.
    pub annotation_label: String,
    pub annotation_width: f32,
    /// Repeat the table header at the top of every page.
    pub repeat_header: bool,
    pub page: PageSettings,
    pub style: ReportStyle,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let column_widths = [
            ("ChoiceCodeDisplay", 24.0),
            ("ST", 10.0),
            ("General", 15.0),
            ("CollegeName", 131.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            format: ReportFormat::Pdf,
            column_widths,
            default_column_width: 15.0,
            annotation_label: "Preference".to_string(),
            annotation_width: 15.0,
            repeat_header: true,
            page: PageSettings::default(),
            style: ReportStyle::default(),
        }
    }
}

/// Page geometry in millimetres and font sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    /// Rows that would cross into this margin move to the next page.
    pub margin_bottom: f32,
    pub banner_height: f32,
    pub banner_font_size: f32,
    pub heading_line_height: f32,
    pub heading_font_size: f32,
    pub heading_gap: f32,
    pub table_font_size: f32,
    pub line_height: f32,
    pub cell_padding: f32,
}

impl Default for PageSettings {
    fn default() -> Self {
        // A4 portrait
        Self {
            width: 210.0,
            height: 297.0,
            margin_left: 7.5,
            margin_right: 7.5,
            margin_top: 10.0,
            margin_bottom: 20.0,
            banner_height: 10.0,
            banner_font_size: 10.0,
            heading_line_height: 6.0,
            heading_font_size: 9.0,
            heading_gap: 5.0,
            table_font_size: 6.15,
            line_height: 6.0,
            cell_padding: 1.0,
        }
    }
}

impl PageSettings {
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Lowest y a row may reach before a page break.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

/// RGB colours used by the renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStyle {
    pub banner_color: [u8; 3],
    pub text_color: [u8; 3],
    pub header_fill: [u8; 3],
    pub border_color: [u8; 3],
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            banner_color: [255, 0, 0],
            text_color: [0, 0, 0],
            header_fill: [200, 220, 255],
            border_color: [0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "top_n": 3, "report": { "format": "text" } }"#).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.report.format, ReportFormat::Text);
        assert_eq!(config.name_column, "CollegeName");
        assert_eq!(config.report.annotation_label, "Preference");
    }

    #[test]
    fn config_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = AppConfig::default();
        config.report.column_widths.insert("SC".into(), 12.5);
        config.save_to_file(&path).unwrap();
        assert_eq!(AppConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());
    }
}
