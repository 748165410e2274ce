//! Runtime configuration.
//!
//! Values come from environment variables; anything missing or unparsable
//! falls back to the default.

use crate::availability::SlotPolicy;

/// Application-level constants
pub const APP_NAME: &str = "HealEasy";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_CANCELLED_FREES_SLOT: &str = "HEALEASY_CANCELLED_FREES_SLOT";
pub const ENV_PAGE_SIZE: &str = "HEALEASY_PAGE_SIZE";

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "healeasy=info,warn"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    pub slot_policy: SlotPolicy,
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            slot_policy: SlotPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = AppConfig::default();

        if let Some(raw) = lookup(ENV_CANCELLED_FREES_SLOT) {
            match parse_flag(&raw) {
                Some(flag) => config.slot_policy.cancelled_frees_slot = flag,
                None => tracing::warn!(
                    key = ENV_CANCELLED_FREES_SLOT,
                    value = %raw,
                    "Ignoring invalid boolean"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => config.page_size = size,
                _ => tracing::warn!(key = ENV_PAGE_SIZE, value = %raw, "Ignoring invalid page size"),
            }
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
