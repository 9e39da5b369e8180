use anyhow::{bail, Context, Result};
use lightpoint_core::DetectionConfig;
use std::path::PathBuf;
use std::time::Duration;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Named threshold profile (default: "default").
    pub profile: String,
    /// Optional TOML file with a full or partial `DetectionConfig`.
    /// When set it replaces the profile.
    pub config_path: Option<PathBuf>,
    /// Settling time after a baseline before count changes are reported.
    pub stable_period: Duration,
    /// Whether region classification may use the rayon pool.
    pub parallel: bool,
}

impl Config {
    /// Load configuration from `LIGHTPOINT_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            profile: std::env::var("LIGHTPOINT_PROFILE").unwrap_or_else(|_| "default".to_string()),
            config_path: std::env::var("LIGHTPOINT_CONFIG").ok().map(PathBuf::from),
            stable_period: Duration::from_millis(env_u64("LIGHTPOINT_STABLE_PERIOD_MS", 2000)),
            parallel: std::env::var("LIGHTPOINT_PARALLEL")
                .map(|v| v != "0")
                .unwrap_or(true),
        }
    }

    /// Resolve the detection thresholds: TOML file if given, else the profile.
    pub fn detection(&self) -> Result<DetectionConfig> {
        let mut cfg = match &self.config_path {
            Some(path) => {
                let src = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                parse_detection(&src).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => match DetectionConfig::profile(&self.profile) {
                Some(cfg) => cfg,
                None => bail!(
                    "unknown profile '{}' (expected one of {:?})",
                    self.profile,
                    DetectionConfig::PROFILES
                ),
            },
        };
        cfg.parallel &= self.parallel;
        Ok(cfg)
    }
}

pub fn parse_detection(src: &str) -> Result<DetectionConfig> {
    Ok(toml::from_str(src)?)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
