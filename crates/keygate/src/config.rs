//! process-wide configuration
//!
//! ```toml
//! [quorum]
//! threshold = 4
//! authorities = ["0x8d4d...", "0xfbe6...", ...]
//!
//! [sharing]
//! threshold = 4
//! shares = 7
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::quorum::normalize_identity;
use crate::{Error, Result};

/// default k for both approvals and shares
pub const DEFAULT_THRESHOLD: usize = 4;

/// default n for both authorities and shares
pub const DEFAULT_SHARES: usize = 7;

/// approval quorum: who may vote and how many votes release a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumConfig {
    pub threshold: usize,
    pub authorities: Vec<String>,
}

impl QuorumConfig {
    pub fn new<I, S>(threshold: usize, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            threshold,
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(Error::Config("quorum threshold must be at least 1".into()));
        }
        if self.threshold > self.authorities.len() {
            return Err(Error::Config(format!(
                "quorum threshold {} exceeds {} authorities",
                self.threshold,
                self.authorities.len()
            )));
        }
        let mut seen = HashSet::new();
        for authority in &self.authorities {
            let id = normalize_identity(authority);
            if id.is_empty() {
                return Err(Error::Config("empty authority identity".into()));
            }
            if !seen.insert(id) {
                return Err(Error::Config(format!("duplicate authority '{}'", authority.trim())));
            }
        }
        Ok(())
    }
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_THRESHOLD,
            (1..=DEFAULT_SHARES).map(|i| format!("authority-{}", i)),
        )
    }
}

/// shamir parameters for the threshold-cryptography mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingConfig {
    pub threshold: usize,
    pub shares: usize,
}

impl SharingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 || self.threshold > self.shares {
            return Err(Error::Config(format!(
                "share threshold must satisfy 1 <= k <= n, got k={} n={}",
                self.threshold, self.shares
            )));
        }
        Ok(())
    }
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            shares: DEFAULT_SHARES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quorum: QuorumConfig,
    pub sharing: SharingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.quorum.validate()?;
        self.sharing.validate()
    }
}
