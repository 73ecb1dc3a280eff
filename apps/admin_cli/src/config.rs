use std::{fs, path::Path};

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3333/api".into(),
            token: None,
            email: None,
            password: None,
            log_level: "info".into(),
        }
    }
}

/// Keys accepted in the settings file. The password is never read from disk.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    token: Option<String>,
    email: Option<String>,
    log_level: Option<String>,
}

/// Defaults, then `path` if it parses, then the process environment.
pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, lookup);
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileSettings>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.token {
        settings.token = Some(v);
    }
    if let Some(v) = file_cfg.email {
        settings.email = Some(v);
    }
    if let Some(v) = file_cfg.log_level {
        settings.log_level = v;
    }
}

/// Later keys in each list win.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let last = |keys: &[&str]| keys.iter().filter_map(|key| lookup(*key)).last();

    if let Some(v) = last(&["ADMIN_API_URL", "APP__API_URL"]) {
        settings.api_url = v;
    }
    if let Some(v) = last(&["ADMIN_TOKEN", "APP__TOKEN"]) {
        settings.token = Some(v);
    }
    if let Some(v) = last(&["ADMIN_EMAIL", "APP__EMAIL"]) {
        settings.email = Some(v);
    }
    if let Some(v) = last(&["ADMIN_PASSWORD", "APP__PASSWORD"]) {
        settings.password = Some(v);
    }
    if let Some(v) = last(&["APP__LOG_LEVEL"]) {
        settings.log_level = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
