//! Configuration – reads/writes `~/.beamlab/config.toml`.

use beam_geometry::Estimator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which overlap estimator new scenes use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    #[default]
    ClosedForm,
    MonteCarlo,
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorKind::ClosedForm => write!(f, "closed_form"),
            EstimatorKind::MonteCarlo => write!(f, "monte_carlo"),
        }
    }
}

impl std::str::FromStr for EstimatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "closed_form" | "closed" => Ok(EstimatorKind::ClosedForm),
            "monte_carlo" | "mc" => Ok(EstimatorKind::MonteCarlo),
            other => Err(format!("unknown estimator '{other}' (expected closed_form or monte_carlo)")),
        }
    }
}

/// Persisted user configuration stored in `~/.beamlab/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub estimator: EstimatorKind,

    /// Sample count used when `estimator = "monte_carlo"`.
    #[serde(default = "default_samples")]
    pub monte_carlo_samples: usize,

    /// Seed for the Monte Carlo RNG.  Same seed, same estimate.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Scenario loaded at start-up, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scenario: Option<PathBuf>,
}

fn default_samples() -> usize {
    beam_geometry::overlap::DEFAULT_SAMPLE_COUNT
}
fn default_seed() -> u64 {
    42
}

impl Default for Config {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::default(),
            monte_carlo_samples: default_samples(),
            seed: default_seed(),
            default_scenario: None,
        }
    }
}

impl Config {
    /// The estimator described by this config.
    pub fn estimator(&self) -> Estimator {
        match self.estimator {
            EstimatorKind::ClosedForm => Estimator::ClosedForm,
            EstimatorKind::MonteCarlo => Estimator::monte_carlo(self.monte_carlo_samples, self.seed),
        }
    }
}

/// Return the path to `~/.beamlab/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".beamlab").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Load the config, falling back to defaults (plus env overrides) when the
/// file is missing or unreadable.
pub fn load_or_default() -> Config {
    match load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) | Err(_) => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

/// Apply `BEAMLAB_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `BEAMLAB_ESTIMATOR` | `estimator` |
/// | `BEAMLAB_SAMPLES` | `monte_carlo_samples` |
/// | `BEAMLAB_SEED` | `seed` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("BEAMLAB_ESTIMATOR")
        && let Ok(kind) = v.parse::<EstimatorKind>()
    {
        cfg.estimator = kind;
    }
    if let Ok(v) = std::env::var("BEAMLAB_SAMPLES")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.monte_carlo_samples = n;
    }
    if let Ok(v) = std::env::var("BEAMLAB_SEED")
        && let Ok(seed) = v.parse::<u64>()
    {
        cfg.seed = seed;
    }
}

/// Save the config to disk, creating `~/.beamlab/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
