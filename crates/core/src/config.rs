//! Desk runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed by reference into the
//! API client, the views and the reminder runner. Nothing in this crate reads environment
//! variables; binaries collect them into [`EnvOverrides`] and call [`CoreConfig::resolve`].
//!
//! Precedence, lowest first: built-in defaults, the optional YAML file, environment values.

use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_REMINDER_INTERVAL, PATIENTS_PATH, SESSION_FILENAME, TASKS_PATH,
};
use crate::{DeskError, DeskResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patients_url: Url,
    tasks_url: Url,
    session_path: PathBuf,
    reminder_interval: Duration,
    export_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Config` if either service URL is not http(s) or the reminder
    /// interval is zero.
    pub fn new(
        patients_url: Url,
        tasks_url: Url,
        session_path: PathBuf,
        reminder_interval: Duration,
        export_dir: PathBuf,
    ) -> DeskResult<Self> {
        for url in [&patients_url, &tasks_url] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(DeskError::Config(format!(
                    "service URL must be http or https: {url}"
                )));
            }
        }
        if reminder_interval.is_zero() {
            return Err(DeskError::Config(
                "reminder interval must be greater than zero".into(),
            ));
        }
        Ok(Self {
            patients_url,
            tasks_url,
            session_path,
            reminder_interval,
            export_dir,
        })
    }

    /// Resolve configuration from an optional YAML file and environment values.
    pub fn resolve(file: Option<FileConfig>, env: EnvOverrides) -> DeskResult<Self> {
        let file = file.unwrap_or_default();

        let base = env
            .api_base
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let patients_url = match env.patients_url.or(file.patients_url) {
            Some(raw) => parse_url(&raw)?,
            None => join_base(&base, PATIENTS_PATH)?,
        };
        let tasks_url = match env.tasks_url.or(file.tasks_url) {
            Some(raw) => parse_url(&raw)?,
            None => join_base(&base, TASKS_PATH)?,
        };

        let session_path = env
            .session_file
            .or(file.session_file)
            .unwrap_or_else(|| PathBuf::from(SESSION_FILENAME));

        let reminder_interval = match env.reminder_interval_secs {
            Some(raw) => Duration::from_secs(parse_secs(&raw)?),
            None => file
                .reminder_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REMINDER_INTERVAL),
        };

        let export_dir = env
            .export_dir
            .or(file.export_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(
            patients_url,
            tasks_url,
            session_path,
            reminder_interval,
            export_dir,
        )
    }

    pub fn patients_url(&self) -> &Url {
        &self.patients_url
    }

    pub fn tasks_url(&self) -> &Url {
        &self.tasks_url
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn reminder_interval(&self) -> Duration {
        self.reminder_interval
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}

/// Optional YAML configuration file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub patients_url: Option<String>,
    #[serde(default)]
    pub tasks_url: Option<String>,
    #[serde(default)]
    pub session_file: Option<PathBuf>,
    #[serde(default)]
    pub reminder_interval_secs: Option<u64>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Parse YAML text, reporting the offending key path on failure.
    pub fn parse(yaml: &str) -> DeskResult<Self> {
        let de = serde_yaml::Deserializer::from_str(yaml);
        serde_path_to_error::deserialize(de).map_err(|e| {
            let path = e.path().to_string();
            DeskError::Config(format!("{path}: {}", e.into_inner()))
        })
    }

    pub fn load(path: &Path) -> DeskResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(DeskError::ConfigRead)?;
        Self::parse(&raw)
    }

    /// Load the file when a path was given.
    pub fn load_optional(path: Option<&Path>) -> DeskResult<Option<Self>> {
        path.map(Self::load).transpose()
    }
}

/// Raw environment values, gathered by the binary.
///
/// Empty or whitespace-only values count as unset.
#[derive(Clone, Debug, Default)]
pub struct EnvOverrides {
    /// Path of the YAML file (`SERVISOFT_CONFIG`).
    pub config_file: Option<PathBuf>,
    pub api_base: Option<String>,
    pub patients_url: Option<String>,
    pub tasks_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub reminder_interval_secs: Option<String>,
    pub export_dir: Option<PathBuf>,
}

impl EnvOverrides {
    /// Build from a variable lookup such as `|k| std::env::var(k).ok()`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            config_file: get("SERVISOFT_CONFIG").map(PathBuf::from),
            api_base: get("SERVISOFT_API_BASE"),
            patients_url: get("SERVISOFT_PATIENTS_URL"),
            tasks_url: get("SERVISOFT_TASKS_URL"),
            session_file: get("SERVISOFT_SESSION_FILE").map(PathBuf::from),
            reminder_interval_secs: get("SERVISOFT_REMINDER_INTERVAL_SECS"),
            export_dir: get("SERVISOFT_EXPORT_DIR").map(PathBuf::from),
        }
    }
}

fn parse_url(raw: &str) -> DeskResult<Url> {
    Url::parse(raw.trim()).map_err(|e| DeskError::Config(format!("invalid URL {raw:?}: {e}")))
}

fn join_base(base: &str, path: &str) -> DeskResult<Url> {
    let base = base.trim().trim_end_matches('/');
    parse_url(&format!("{base}{path}"))
}

fn parse_secs(raw: &str) -> DeskResult<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        DeskError::Config(format!(
            "SERVISOFT_REMINDER_INTERVAL_SECS must be a whole number of seconds, got {raw:?}"
        ))
    })
}
