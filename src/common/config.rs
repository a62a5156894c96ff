use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::layout_engine::{GridSettings, TextDirection};
use crate::model::Binding;

pub fn config_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config")
        .join("tabgrid")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub switcher: SwitcherSettings,
    #[serde(default)]
    pub bindings: BindingSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct SwitcherSettings {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    #[serde(default)]
    pub row_limit: Option<usize>,
    #[serde(default)]
    pub column_limit: Option<usize>,
    /// Largest fraction of the screen a thumbnail may cover, per dimension.
    #[serde(default = "default_thumbnail_scale")]
    pub thumbnail_scale: f64,
    #[serde(default = "default_tile_padding")]
    pub tile_padding: f64,
    #[serde(default = "default_popup_padding")]
    pub popup_padding: f64,
    #[serde(default = "default_title_height")]
    pub title_height: f64,
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    #[serde(default = "default_fade_duration_ms")]
    pub fade_duration_ms: u64,
    #[serde(default = "default_hover_reset_ms")]
    pub hover_reset_ms: u64,
    #[serde(default = "yes")]
    pub wrap_workspaces: bool,
    #[serde(default)]
    pub text_direction: TextDirection,
}

impl Default for SwitcherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            spacing: default_spacing(),
            row_limit: None,
            column_limit: None,
            thumbnail_scale: default_thumbnail_scale(),
            tile_padding: default_tile_padding(),
            popup_padding: default_popup_padding(),
            title_height: default_title_height(),
            reveal_delay_ms: default_reveal_delay_ms(),
            fade_duration_ms: default_fade_duration_ms(),
            hover_reset_ms: default_hover_reset_ms(),
            wrap_workspaces: true,
            text_direction: TextDirection::default(),
        }
    }
}

impl SwitcherSettings {
    pub fn grid(&self) -> GridSettings {
        GridSettings {
            spacing: self.spacing,
            row_limit: self.row_limit,
            column_limit: self.column_limit,
        }
    }

    pub fn reveal_delay(&self) -> Duration { Duration::from_millis(self.reveal_delay_ms) }

    pub fn fade_duration(&self) -> Duration { Duration::from_millis(self.fade_duration_ms) }

    pub fn hover_reset(&self) -> Duration { Duration::from_millis(self.hover_reset_ms) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(self.spacing >= 0.0) {
            issues.push(format!("spacing must be non-negative, got {}", self.spacing));
        }
        if !(self.thumbnail_scale > 0.0 && self.thumbnail_scale <= 1.0) {
            issues.push(format!(
                "thumbnail_scale must be in (0, 1], got {}",
                self.thumbnail_scale
            ));
        }
        for (name, value) in [
            ("tile_padding", self.tile_padding),
            ("popup_padding", self.popup_padding),
            ("title_height", self.title_height),
        ] {
            if !(value >= 0.0) {
                issues.push(format!("{name} must be non-negative, got {value}"));
            }
        }
        if self.row_limit == Some(0) {
            issues.push("row_limit must be at least 1 when set".to_string());
        }
        if self.column_limit == Some(0) {
            issues.push("column_limit must be at least 1 when set".to_string());
        }

        issues
    }
}

/// Which of the host bindings get the switcher installed.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct BindingSettings {
    #[serde(default = "yes")]
    pub switch_windows: bool,
    #[serde(default = "yes")]
    pub switch_windows_backward: bool,
    #[serde(default = "yes")]
    pub switch_group: bool,
    #[serde(default = "yes")]
    pub switch_group_backward: bool,
    #[serde(default = "yes")]
    pub switch_panels: bool,
}

impl Default for BindingSettings {
    fn default() -> Self {
        Self {
            switch_windows: true,
            switch_windows_backward: true,
            switch_group: true,
            switch_group_backward: true,
            switch_panels: true,
        }
    }
}

impl BindingSettings {
    pub fn is_installed(&self, binding: Binding) -> bool {
        match binding {
            Binding::SwitchWindows => self.switch_windows,
            Binding::SwitchWindowsBackward => self.switch_windows_backward,
            Binding::SwitchGroup => self.switch_group,
            Binding::SwitchGroupBackward => self.switch_group_backward,
            Binding::SwitchPanels => self.switch_panels,
            Binding::NoSwitchWindows => false,
        }
    }

    pub fn installed(&self) -> Vec<Binding> {
        Binding::REGISTERED.into_iter().filter(|b| self.is_installed(*b)).collect()
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.switcher.validate();
        if self.switcher.enabled && self.bindings.installed().is_empty() {
            issues.push("switcher is enabled but no bindings are installed".to_string());
        }
        issues
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }

    pub fn default() -> Config {
        Self::parse(include_str!("../../tabgrid.default.toml"))
            .expect("embedded default config is valid")
    }

    /// Reads `path` if it exists, otherwise falls back to the defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            Self::read(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Vec<String> { self.settings.validate() }
}

fn yes() -> bool { true }

fn default_spacing() -> f64 { 10.0 }

fn default_thumbnail_scale() -> f64 { 0.1 }

fn default_tile_padding() -> f64 { 6.0 }

fn default_popup_padding() -> f64 { 12.0 }

fn default_title_height() -> f64 { 24.0 }

fn default_reveal_delay_ms() -> u64 { 150 }

fn default_fade_duration_ms() -> u64 { 100 }

fn default_hover_reset_ms() -> u64 { 500 }

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn embedded_default_matches_struct_defaults() {
        let config = Config::default();
        assert_eq!(config.settings, Settings::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());

        let config = Config::parse(
            r#"
            [settings.switcher]
            row_limit = 2
            text_direction = "rtl"
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.switcher.row_limit, Some(2));
        assert_eq!(config.settings.switcher.text_direction, TextDirection::Rtl);
        assert_eq!(config.settings.switcher.spacing, 10.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[settings.switcher]\nspacin = 4.0\n").is_err());
        assert!(Config::parse("[keys]\n").is_err());
    }

    #[test]
    fn validate_reports_bad_values() {
        let mut config = Config::default();
        config.settings.switcher.thumbnail_scale = 0.0;
        config.settings.switcher.column_limit = Some(0);
        config.settings.switcher.spacing = -1.0;
        let issues = config.validate();
        assert_eq!(issues.len(), 3, "{issues:?}");
    }

    #[test]
    fn validate_wants_at_least_one_binding() {
        let config = Config::parse(
            r#"
            [settings.bindings]
            switch_windows = false
            switch_windows_backward = false
            switch_group = false
            switch_group_backward = false
            switch_panels = false
            "#,
        )
        .unwrap();
        assert!(config.settings.bindings.installed().is_empty());
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn installed_bindings_follow_flags() {
        let config = Config::parse("[settings.bindings]\nswitch_panels = false\n").unwrap();
        assert_eq!(
            config.settings.bindings.installed(),
            vec![
                Binding::SwitchWindows,
                Binding::SwitchWindowsBackward,
                Binding::SwitchGroup,
                Binding::SwitchGroupBackward,
            ]
        );
    }

    #[test]
    fn read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[settings.switcher]\nreveal_delay_ms = 40\nwrap_workspaces = false").unwrap();
        let config = Config::read(file.path()).unwrap();
        assert_eq!(config.settings.switcher.reveal_delay(), Duration::from_millis(40));
        assert!(!config.settings.switcher.wrap_workspaces);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(Config::read(&dir.path().join("nope.toml")).is_err());
    }
}
