//! Repository configuration, stored as `<root>/config.toml`.

use std::io;
use std::path::Path;

use cndl_chunk::GbmParams;
use cndl_ledger::{DEFAULT_BRANCH, DEFAULT_STAGING_NAMESPACE};
use cndl_refs::normalize_ref_name;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Upper bound on `demo.steps`; one demo chunk holds at most this many samples.
pub const MAX_DEMO_STEPS: usize = 1_000_000;

/// Top-level configuration, parsed from TOML. Every field is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Branch advanced by `commit`.
    pub branch: String,
    /// Ref namespace that `add` stages symbols under.
    pub staging_namespace: String,
    /// Commit message when none is given.
    pub default_message: String,
    /// `[demo]` section: parameters for generated series.
    pub demo: GbmParams,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            staging_namespace: DEFAULT_STAGING_NAMESPACE.to_string(),
            default_message: "snapshot".to_string(),
            demo: GbmParams::default(),
        }
    }
}

impl RepoConfig {
    /// Load and validate config from a TOML file. A missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)
                .and_then(|config| config.validate().map(|()| config))
                .map_err(|e| e.at(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SdkError::io("read config", path)(e)),
        }
    }

    /// Validate, then write the config as TOML, replacing any existing file.
    pub fn save(&self, path: &Path) -> SdkResult<()> {
        self.validate().map_err(|e| e.at(path))?;
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(SdkError::io("write config", path))
    }

    /// Check the settings that TOML alone cannot.
    ///
    /// The branch must be a valid ref outside the staging namespace, otherwise
    /// `commit` would fold the branch itself into the snapshot. Demo
    /// parameters must describe a finite, bounded walk.
    pub fn validate(&self) -> SdkResult<()> {
        let branch = normalize_ref_name(&self.branch)
            .map_err(|e| invalid(format!("branch: {e}")))?;

        let namespace = self.staging_namespace.trim_end_matches('/');
        if namespace.is_empty() {
            return Err(invalid("staging_namespace must not be empty"));
        }
        let namespace = normalize_ref_name(namespace)
            .map_err(|e| invalid(format!("staging_namespace: {e}")))?;

        if branch == namespace
            || branch.starts_with(&format!("{namespace}/"))
            || namespace.starts_with(&format!("{branch}/"))
        {
            return Err(invalid(format!(
                "branch {branch:?} overlaps staging namespace {namespace:?}"
            )));
        }

        let demo = &self.demo;
        if demo.steps == 0 || demo.steps > MAX_DEMO_STEPS {
            return Err(invalid(format!(
                "demo.steps must be between 1 and {MAX_DEMO_STEPS}, got {}",
                demo.steps
            )));
        }
        if !demo.initial_price.is_finite() || demo.initial_price <= 0.0 {
            return Err(invalid(format!(
                "demo.initial_price must be positive, got {}",
                demo.initial_price
            )));
        }
        if !demo.drift.is_finite() {
            return Err(invalid(format!("demo.drift must be finite, got {}", demo.drift)));
        }
        if !demo.volatility.is_finite() || demo.volatility < 0.0 {
            return Err(invalid(format!(
                "demo.volatility must be non-negative, got {}",
                demo.volatility
            )));
        }
        Ok(())
    }

    pub fn from_toml(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| invalid(e.to_string()))
    }

    pub fn to_toml(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| invalid(e.to_string()))
    }
}

fn invalid(reason: impl Into<String>) -> SdkError {
    SdkError::Config {
        path: Default::default(),
        reason: reason.into(),
    }
}

impl SdkError {
    /// Attach the config file path to a [`SdkError::Config`].
    fn at(self, path: &Path) -> Self {
        match self {
            SdkError::Config { reason, .. } => SdkError::Config {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        }
    }
}
