use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "personnel.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/personnel.db".into(),
            log_filter: "warn".into(),
        }
    }
}

/// Keys accepted in `personnel.toml`; all optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    database_url: Option<String>,
    log_filter: Option<String>,
}

impl Settings {
    /// A command-line url replaces whatever the file and environment chose.
    pub fn with_override(mut self, database_url: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        self
    }

    pub fn connection_url(&self) -> String {
        normalize_database_url(&self.database_url)
    }
}

/// Defaults, then `personnel.toml` in the working directory, then the
/// environment. Call after `.env` has been loaded.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Shared by both binaries so they open the same database.
pub fn load_settings_from(
    path: &Path,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    apply_file(&mut settings, path)?;
    apply_env(&mut settings, var);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(name) = var("DB_NAME").filter(|v| !v.trim().is_empty()) {
        settings.database_url = format!("sqlite://./data/{}.db", name.trim());
    }
    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

/// Turns plain paths into `sqlite://` urls; anything with a scheme is kept.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/test.db"),
            "sqlite://./data/test.db"
        );
        assert_eq!(
            normalize_database_url("sqlite:./data/test.db"),
            "sqlite://./data/test.db"
        );
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_database_url("  "),
            Settings::default().database_url
        );
    }

    #[test]
    fn db_name_picks_file_and_explicit_url_wins() {
        let mut settings = Settings::default();
        apply_env(&mut settings, env_of(&[("DB_NAME", "personnel_db")]));
        assert_eq!(settings.database_url, "sqlite://./data/personnel_db.db");

        apply_env(
            &mut settings,
            env_of(&[
                ("DB_NAME", "personnel_db"),
                ("DATABASE_URL", "sqlite::memory:"),
                ("APP__LOG_FILTER", "debug"),
            ]),
        );
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn reads_toml_file_and_ignores_missing_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();
        apply_file(&mut settings, &dir.path().join("absent.toml")).expect("missing file is fine");
        assert_eq!(settings, Settings::default());

        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "database_url = \"sqlite://./elsewhere.db\"\nlog_filter = \"info\"\n",
        )
        .expect("write config");
        apply_file(&mut settings, &path).expect("config");
        assert_eq!(settings.database_url, "sqlite://./elsewhere.db");
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn file_then_env_then_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "database_url = \"./from_file.db\"\n").expect("write config");

        let settings = load_settings_from(&path, env_of(&[])).expect("settings");
        assert_eq!(settings.connection_url(), "sqlite://./from_file.db");

        let settings =
            load_settings_from(&path, env_of(&[("DB_NAME", "staff")])).expect("settings");
        assert_eq!(settings.connection_url(), "sqlite://./data/staff.db");

        let settings = settings.with_override(Some("sqlite:./cli.db".into()));
        assert_eq!(settings.connection_url(), "sqlite://./cli.db");

        let env = env_of(&[("APP__DATABASE_URL", "sqlite::memory:")]);
        let settings = load_settings_from(&path, env)
            .expect("settings")
            .with_override(None);
        assert_eq!(settings.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "database_url = [").expect("write config");
        let mut settings = Settings::default();
        assert!(apply_file(&mut settings, &path).is_err());
    }
}
