//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded by the binary
//! through `dotenvy`) and can be overridden by CLI flags.
//!
//! | Variable                  | Default     |
//! |---------------------------|-------------|
//! | `COSTIMPACT_ACCESS_CODE`  | `A`         |
//! | `COSTIMPACT_SKU_LIMIT`    | `3000000`   |
//! | `COSTIMPACT_PRO`          | `false`     |
//! | `COSTIMPACT_PORT`         | `3000`      |
//! | `COSTIMPACT_MAX_UPLOAD_MB`| `200`       |

use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_ACCESS_CODE: &str = "COSTIMPACT_ACCESS_CODE";
pub const ENV_SKU_LIMIT: &str = "COSTIMPACT_SKU_LIMIT";
pub const ENV_PRO: &str = "COSTIMPACT_PRO";
pub const ENV_PORT: &str = "COSTIMPACT_PORT";
pub const ENV_MAX_UPLOAD_MB: &str = "COSTIMPACT_MAX_UPLOAD_MB";

pub const DEFAULT_ACCESS_CODE: &str = "A";
pub const DEFAULT_SKU_LIMIT: usize = 3_000_000;
pub const DEFAULT_PORT: u16 = 3000;
/// Whole request body, all three files together.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

/// Tier limits passed into each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLimits {
    /// Maximum number of unique SKUs per run on the basic tier.
    pub sku_limit: usize,
    /// Pro tier runs have no SKU limit.
    pub is_pro: bool,
}

impl RunLimits {
    /// Whether `sku_count` unique SKUs may be processed.
    pub fn allows(&self, sku_count: usize) -> bool {
        self.is_pro || sku_count <= self.sku_limit
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            sku_limit: DEFAULT_SKU_LIMIT,
            is_pro: false,
        }
    }
}

/// Shared-secret check in front of the tool.
#[derive(Clone)]
pub struct AccessGate {
    code: String,
}

impl AccessGate {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// True when `candidate` equals the configured code.
    pub fn check(&self, candidate: &str) -> bool {
        // Compare every byte so timing does not depend on the mismatch position
        let expected = self.code.as_bytes();
        let given = candidate.as_bytes();
        if expected.len() != given.len() {
            return false;
        }
        expected
            .iter()
            .zip(given)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").field("code", &"***").finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gate: AccessGate,
    pub limits: RunLimits,
    pub port: u16,
    /// Request body limit for uploads, in megabytes.
    pub max_upload_mb: usize,
}

impl AppConfig {
    /// Request body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl AppConfig {
    /// Read configuration from environment variables, falling back to defaults.
    ///
    /// Unparseable values are reported on stderr and replaced by defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (environment, tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let access_code = lookup(ENV_ACCESS_CODE)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ACCESS_CODE.to_string());

        let sku_limit = parse_or(lookup(ENV_SKU_LIMIT), ENV_SKU_LIMIT, DEFAULT_SKU_LIMIT);
        let port = parse_or(lookup(ENV_PORT), ENV_PORT, DEFAULT_PORT);
        let is_pro = lookup(ENV_PRO).map(|v| parse_flag(&v)).unwrap_or(false);
        let max_upload_mb = parse_or(
            lookup(ENV_MAX_UPLOAD_MB),
            ENV_MAX_UPLOAD_MB,
            DEFAULT_MAX_UPLOAD_MB,
        );

        Self {
            gate: AccessGate::new(access_code),
            limits: RunLimits { sku_limit, is_pro },
            port,
            max_upload_mb,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gate: AccessGate::new(DEFAULT_ACCESS_CODE),
            limits: RunLimits::default(),
            port: DEFAULT_PORT,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            eprintln!("⚠️  Ignoring invalid {}={:?}, using default", key, value);
            default
        }),
        None => default,
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "y" | "on")
}
