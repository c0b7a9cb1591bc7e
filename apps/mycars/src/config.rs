use std::{collections::HashMap, fs, path::Path};

use catalog::RenderOptions;
use chrono::FixedOffset;

pub const DEFAULT_CONFIG_FILE: &str = "mycars.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub seed_dir: String,
    pub date_format: String,
    pub utc_offset_minutes: i32,
    pub initial_mark: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/mycars.db".into(),
            seed_dir: "./assets".into(),
            date_format: catalog::render::DEFAULT_DATE_FORMAT.into(),
            utc_offset_minutes: 0,
            initial_mark: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn render_options(&self) -> RenderOptions {
        let utc_offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(
                    minutes = self.utc_offset_minutes,
                    "utc offset out of range; using UTC"
                );
                RenderOptions::default().utc_offset
            });
        RenderOptions {
            date_format: self.date_format.clone(),
            utc_offset,
        }
    }

    fn apply(&mut self, key: &str, value: String, warnings: &mut Vec<String>) {
        match key {
            "database_url" => self.database_url = value,
            "seed_dir" => self.seed_dir = value,
            "date_format" => self.date_format = value,
            "utc_offset_minutes" => match value.trim().parse() {
                Ok(minutes) => self.utc_offset_minutes = minutes,
                Err(_) => {
                    warnings.push(format!("ignoring non-numeric utc_offset_minutes '{value}'"))
                }
            },
            "initial_mark" => {
                self.initial_mark = Some(value).filter(|mark| !mark.trim().is_empty())
            }
            "log_filter" => self.log_filter = value,
            _ => {}
        }
    }
}

/// Settings plus the problems met while reading them. Loading happens before
/// the subscriber exists, so the caller logs `warnings` once tracing is up.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub warnings: Vec<String>,
}

impl LoadedSettings {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("{warning}");
        }
    }
}

/// Defaults, then the config file, then environment variables.
pub fn load_settings(config_path: &Path) -> LoadedSettings {
    let file = fs::read_to_string(config_path).ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> LoadedSettings {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                for (key, value) in file_cfg {
                    settings.apply(&key, value, &mut warnings);
                }
            }
            Err(error) => warnings.push(format!("ignoring unreadable config file: {error}")),
        }
    }

    const ENV_KEYS: [(&str, &str); 7] = [
        ("DATABASE_URL", "database_url"),
        ("APP__DATABASE_URL", "database_url"),
        ("APP__SEED_DIR", "seed_dir"),
        ("APP__DATE_FORMAT", "date_format"),
        ("APP__UTC_OFFSET_MINUTES", "utc_offset_minutes"),
        ("APP__INITIAL_MARK", "initial_mark"),
        ("APP__LOG_FILTER", "log_filter"),
    ];
    for (var, key) in ENV_KEYS {
        if let Some(value) = env(var) {
            settings.apply(key, value, &mut warnings);
        }
    }

    LoadedSettings { settings, warnings }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
