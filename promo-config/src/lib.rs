//! Loader for the bot configuration with file + environment overlays.
//!
//! The document is usually `config.json` next to the binary, but any format the
//! `config` crate recognises by suffix (JSON, YAML, TOML) works. Values can be
//! overridden with `PROMO__`-prefixed environment variables
//! (`PROMO__TWITTER__ACCESS_TOKEN`) and may reference other variables with
//! `${VAR}`. Relative content paths are resolved against the directory of the
//! configuration file.
use config::{Config, Environment, File};
use promo_common::observability::LogFormat;
use promo_common::{PromoError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_STARTER_PACKS_CSV: &str = "starter_packs.csv";
pub const DEFAULT_FEEDS_CSV: &str = "feeds.csv";
pub const DEFAULT_REASONS_FILE: &str = "bluesky_reasons.txt";

#[derive(Debug, Deserialize)]
pub struct PromoConfig {
    pub twitter: TwitterCredentials,
    #[serde(default = "default_starter_packs_csv")]
    pub starter_packs_csv: PathBuf,
    #[serde(default = "default_feeds_csv")]
    pub feeds_csv: PathBuf,
    #[serde(default = "default_reasons_file")]
    pub bluesky_reasons_file: PathBuf,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub log: LogSettings,
}

/// OAuth 1.0a user-context credentials. All four are required.
#[derive(Clone, Deserialize)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

impl TwitterCredentials {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(PromoError::Config(format!(
                    "Missing required Twitter configuration key: {name}"
                )));
            }
        }
        Ok(())
    }
}

/// Cadence of the posting loop.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retry_secs: default_retry_secs(),
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            console: default_console(),
        }
    }
}

fn default_starter_packs_csv() -> PathBuf {
    DEFAULT_STARTER_PACKS_CSV.into()
}
fn default_feeds_csv() -> PathBuf {
    DEFAULT_FEEDS_CSV.into()
}
fn default_reasons_file() -> PathBuf {
    DEFAULT_REASONS_FILE.into()
}
fn default_interval_secs() -> u64 {
    2 * 60 * 60
}
fn default_retry_secs() -> u64 {
    5 * 60
}
fn default_console() -> bool {
    true
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn resolve_against(base: Option<&Path>, path: &mut PathBuf) {
    if let Some(base) = base {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
}

/// Builder hides the `config` crate wiring (file + env overrides).
pub struct PromoConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    base_dir: Option<PathBuf>,
}

impl Default for PromoConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PromoConfigLoader {
    /// Start empty; `PROMO__` env overrides are layered on top at [`Self::load`].
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            base_dir: None,
        }
    }

    /// Attach a required JSON/YAML/TOML file; the `config` crate infers format by suffix.
    ///
    /// Relative content paths in the document become relative to this file's directory.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        self.base_dir = path.parent().map(|p| {
            if p.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                p.to_path_buf()
            }
        });
        self.builder = self
            .builder
            .add_source(File::from(path).required(true));
        self
    }

    /// Allow tests to merge inline JSON snippets.
    ///
    /// ```
    /// use promo_config::PromoConfigLoader;
    ///
    /// let cfg = PromoConfigLoader::new()
    ///     .with_json_str(
    ///         r#"{"twitter": {"consumer_key": "ck", "consumer_secret": "cs",
    ///                         "access_token": "at", "access_token_secret": "ats"}}"#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.feeds_csv.to_str(), Some("feeds.csv"));
    /// assert_eq!(cfg.schedule.interval_secs, 7200);
    /// ```
    pub fn with_json_str(mut self, json: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(json, config::FileFormat::Json));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Fails when the file is missing or malformed, when the `twitter` section or any
    /// of its four credentials is absent, or when a credential is blank.
    pub fn load(self) -> Result<PromoConfig> {
        let cfg = self
            .builder
            .add_source(Environment::with_prefix("PROMO").separator("__"))
            .build()
            .map_err(|e| PromoError::Config(e.to_string()))?;

        let mut v: Value = cfg
            .try_deserialize()
            .map_err(|e| PromoError::Config(e.to_string()))?;
        expand_env_in_value(&mut v);

        let mut typed: PromoConfig =
            serde_json::from_value(v).map_err(|e| PromoError::Config(e.to_string()))?;
        typed.twitter.validate()?;

        let base = self.base_dir.as_deref();
        resolve_against(base, &mut typed.starter_packs_csv);
        resolve_against(base, &mut typed.feeds_csv);
        resolve_against(base, &mut typed.bluesky_reasons_file);

        tracing::debug!(?base, "config.loaded");
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_nested_credentials() {
        temp_env::with_vars([("CK", Some("key")), ("CS", Some("secret"))], || {
            let mut v = json!({ "twitter": { "consumer_key": "${CK}", "consumer_secret": "$CS" } });
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!({ "twitter": { "consumer_key": "key", "consumer_secret": "secret" } })
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_PROMO}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_PROMO}"));
    }

    #[test]
    fn relative_paths_join_base_absolute_paths_stay() {
        let mut rel = PathBuf::from("feeds.csv");
        resolve_against(Some(Path::new("/etc/promo")), &mut rel);
        assert_eq!(rel, PathBuf::from("/etc/promo/feeds.csv"));

        let mut abs = PathBuf::from("/data/feeds.csv");
        resolve_against(Some(Path::new("/etc/promo")), &mut abs);
        assert_eq!(abs, PathBuf::from("/data/feeds.csv"));

        let mut untouched = PathBuf::from("feeds.csv");
        resolve_against(None, &mut untouched);
        assert_eq!(untouched, PathBuf::from("feeds.csv"));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = TwitterCredentials {
            consumer_key: "ck-secret-value".into(),
            consumer_secret: "cs".into(),
            access_token: "at".into(),
            access_token_secret: "ats".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("ck-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn schedule_defaults_are_two_hours_and_five_minutes() {
        let s = ScheduleConfig::default();
        assert_eq!(s.interval(), Duration::from_secs(7200));
        assert_eq!(s.retry_delay(), Duration::from_secs(300));
    }
}
