use crate::error::{AppError, Result};
use crate::meter::MeterId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TOTALS_URL: &str = "http://localhost/metern/programs/programtotal.php";
pub const DEFAULT_SNAPSHOT_DIR: &str = "/run/shm";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint returning the recorded running totals of all meters
    #[serde(default = "default_totals_url")]
    pub totals_url: String,
    /// Directory the metering daemon refreshes `metern<N>.txt` snapshots in
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    /// Unset means the totals request may block indefinitely
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    pub meters: Vec<MeterConfig>,
}

fn default_totals_url() -> String {
    DEFAULT_TOTALS_URL.into()
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_DIR)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    pub id: MeterId,
    #[serde(default)]
    pub name: Option<String>,
    /// Tolerance for telling a blackout reset apart from a normal reading
    pub passo: i64,
}

impl Config {
    /// Load YAML from disk with `$(VAR)`/`${VAR}` substitution, then apply
    /// `METERN_TOTALS_URL` / `METERN_SNAPSHOT_DIR` overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let expanded = expand_env_placeholders(&raw)?;
        let mut cfg: Config = serde_yaml::from_str(&expanded)?;

        if let Ok(url) = std::env::var("METERN_TOTALS_URL") {
            cfg.totals_url = url;
        }
        if let Ok(dir) = std::env::var("METERN_SNAPSHOT_DIR") {
            cfg.snapshot_dir = PathBuf::from(dir);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.totals_url.trim().is_empty() {
            return Err(AppError::Config("totals_url cannot be empty".to_string()));
        }

        if self.snapshot_dir.as_os_str().is_empty() {
            return Err(AppError::Config("snapshot_dir cannot be empty".to_string()));
        }

        if self.http_timeout_secs == Some(0) {
            return Err(AppError::Config(
                "http_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.meters.is_empty() {
            return Err(AppError::Config(
                "config must include at least one meter".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for m in &self.meters {
            if !seen.insert(&m.id) {
                return Err(AppError::Config(format!("duplicate meter id {}", m.id)));
            }
        }

        Ok(())
    }

    pub fn meter(&self, id: &MeterId) -> Result<&MeterConfig> {
        self.meters
            .iter()
            .find(|m| &m.id == id)
            .ok_or_else(|| AppError::UnknownMeter(id.to_string()))
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

/// Replace `$(VAR)` and `${VAR}` with environment values.
/// `$$` is an escaped `$`; any other `$` is kept as-is.
fn expand_env_placeholders(input: &str) -> Result<String> {
    let re = regex::Regex::new(
        r"\$\$|\$\(([A-Za-z_][A-Za-z0-9_]*)\)|\$\{([A-Za-z_][A-Za-z0-9_]*)\}",
    )
    .map_err(|e| AppError::Config(format!("placeholder pattern: {}", e)))?;

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for cap in re.captures_iter(input) {
        let Some(whole) = cap.get(0) else { continue };
        out.push_str(&input[last..whole.start()]);
        match cap.get(1).or_else(|| cap.get(2)) {
            Some(var) => {
                let value = std::env::var(var.as_str()).map_err(|_| {
                    AppError::Config(format!("missing environment variable: {}", var.as_str()))
                })?;
                out.push_str(&value);
            }
            None => out.push('$'),
        }
        last = whole.end();
    }
    out.push_str(&input[last..]);

    Ok(out)
}
