use super::*;

use std::{collections::HashMap, io::Write};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
api_url = "https://painel.example.com/api"
email = "ana@example.com"
log_level = "debug"
"#,
    );

    assert_eq!(settings.api_url, "https://painel.example.com/api");
    assert_eq!(settings.email.as_deref(), Some("ana@example.com"));
    assert_eq!(settings.log_level, "debug");
    assert_eq!(settings.token, None);
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "api_url = [unterminated");
    assert_eq!(settings, Settings::default());
}

#[test]
fn password_is_not_read_from_file() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "password = \"hunter2\"\n");
    assert_eq!(settings.password, None);
}

#[test]
fn app_prefixed_env_wins_over_short_name() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_of(&[
            ("ADMIN_API_URL", "http://a/api"),
            ("APP__API_URL", "http://b/api"),
            ("ADMIN_TOKEN", "tok"),
            ("ADMIN_PASSWORD", "secret"),
        ]),
    );

    assert_eq!(settings.api_url, "http://b/api");
    assert_eq!(settings.token.as_deref(), Some("tok"));
    assert_eq!(settings.password.as_deref(), Some("secret"));
    assert_eq!(settings.log_level, "info");
}

#[test]
fn load_settings_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "token = \"from-file\"").expect("write");

    let settings = load_settings_with(file.path(), env_of(&[]));

    assert_eq!(
        settings,
        Settings {
            token: Some("from-file".to_string()),
            ..Settings::default()
        }
    );
}

#[test]
fn env_overrides_values_read_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "token = \"from-file\"\nlog_level = \"warn\"").expect("write");

    let settings = load_settings_with(file.path(), env_of(&[("APP__TOKEN", "from-env")]));

    assert_eq!(settings.token.as_deref(), Some("from-env"));
    assert_eq!(settings.log_level, "warn");
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = load_settings_with(&dir.path().join("absent.toml"), env_of(&[]));
    assert_eq!(settings, Settings::default());
}
