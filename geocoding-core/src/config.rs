use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Provider used when a request names none and no default is configured.
pub const FALLBACK_PROVIDER: &str = "NOMINATIM";

pub const ENV_CONFIG_PATH: &str = "GEOCODER_CONFIG";
pub const ENV_HOST: &str = "GEOCODER_HOST";
pub const ENV_PORT: &str = "GEOCODER_PORT";
pub const ENV_TIMEOUT_SECS: &str = "GEOCODER_TIMEOUT_SECS";
pub const ENV_DEFAULT_PROVIDER: &str = "DEFAULT_GEOCODER";

/// Immutable snapshot of the process environment.
///
/// Kept sorted so that numbered variables are always scanned in the same
/// order regardless of how the OS enumerates them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of `name`, treating empty and whitespace-only values as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Collect `<prefix><n>` variables keyed by `n`.
    ///
    /// Suffixes that are not plain decimal integers >= 1 are skipped. When two
    /// names parse to the same index (`_1` and `_01`) the one that sorts last
    /// wins.
    pub fn numbered(&self, prefix: &str) -> BTreeMap<u32, String> {
        let mut found = BTreeMap::new();

        for (name, value) in &self.vars {
            let Some(suffix) = name.strip_prefix(prefix) else {
                continue;
            };
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let Ok(index) = suffix.parse::<u32>() else {
                continue;
            };
            if index == 0 {
                continue;
            }
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            found.insert(index, value.to_string());
        }

        found
    }
}

/// Gateway settings. Provider credentials are not part of this file; they
/// come from the environment only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Per-request timeout for outbound provider calls.
    pub timeout_secs: u64,
    /// Provider used when a request omits `platform`.
    pub default_provider: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            timeout_secs: 30,
            default_provider: None,
        }
    }
}

impl Config {
    /// Load config from `path`, or from the platform config directory when
    /// `path` is `None`. A missing file at the platform location yields the
    /// defaults; a missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::config_file_path()?, false),
        };

        if !path.exists() {
            if explicit {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Path to the config file in the platform config directory.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "geocoding", "geocoding-gateway")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override file values with `GEOCODER_*` / `DEFAULT_GEOCODER` variables.
    pub fn apply_env(mut self, env: &Environment) -> Result<Self> {
        if let Some(host) = env.get(ENV_HOST) {
            self.host = host.to_string();
        }
        if let Some(port) = env.get(ENV_PORT) {
            self.port = port
                .parse()
                .with_context(|| format!("{ENV_PORT} must be a port number, got '{port}'"))?;
        }
        if let Some(secs) = env.get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = secs
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be whole seconds, got '{secs}'"))?;
        }
        if let Some(name) = env.get(ENV_DEFAULT_PROVIDER) {
            self.default_provider = Some(name.to_string());
        }

        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Canonical name of the provider used when a request names none.
    pub fn default_provider_name(&self) -> String {
        self.default_provider
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_PROVIDER)
            .to_uppercase()
    }
}
