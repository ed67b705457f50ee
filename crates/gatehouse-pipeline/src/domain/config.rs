//! Pipeline configuration with validation.
//!
//! Every policy knob is explicit and supplied at construction; `validate`
//! fails fast before the chain serves any traffic.

use crate::domain::types::{Method, Role};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for one interceptor chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Audit logging configuration.
    pub audit: AuditConfig,
    /// Time-of-day access window.
    pub time: TimeWindowConfig,
    /// Sliding-window rate limiting.
    pub rate: RateLimitConfig,
    /// Role-based access control.
    pub rbac: RbacConfig,
}

impl PipelineConfig {
    /// Validate configuration. Invalid policy is fatal at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate.max_events == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "max_events cannot be 0".into(),
            ));
        }
        if self.rate.window.is_zero() {
            return Err(ConfigError::InvalidRateLimit("window cannot be 0".into()));
        }
        // start == end makes the wraparound rule degenerate (always inside),
        // which silently disables the gate. Reject it instead.
        if self.time.allowed_start == self.time.allowed_end {
            return Err(ConfigError::InvalidTimeWindow(
                "allowed_start and allowed_end must differ".into(),
            ));
        }
        if self.rbac.allowed_roles.is_empty() {
            return Err(ConfigError::InvalidRbacPolicy(
                "allowed_roles cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Audit gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Destination file for the append-only audit log.
    pub log_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("requests.log"),
        }
    }
}

/// Time-of-day access window applied to guarded path prefixes.
///
/// The allowed interval is `[allowed_start, allowed_end)`. A window that
/// crosses midnight (`allowed_start > allowed_end`) is handled explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindowConfig {
    /// Start of the allowed interval (inclusive).
    pub allowed_start: NaiveTime,
    /// End of the allowed interval (exclusive).
    pub allowed_end: NaiveTime,
    /// Substring patterns for paths the gate applies to.
    pub guarded_prefixes: Vec<String>,
}

impl Default for TimeWindowConfig {
    fn default() -> Self {
        Self {
            // Messaging is open 6 AM - 9 PM.
            allowed_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            allowed_end: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN),
            guarded_prefixes: vec!["/api/chats/".to_string(), "/chats/".to_string()],
        }
    }
}

/// Sliding-window rate limit applied to matching method + path requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum admitted events per client within one window.
    pub max_events: u32,
    /// Sliding window duration.
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Method the limit applies to.
    pub method: Method,
    /// Substring patterns for paths the limit applies to.
    pub path_patterns: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_events: 5,
            window: Duration::from_secs(60),
            method: Method::Post,
            path_patterns: vec![
                "/api/chats/messages/".to_string(),
                "/chats/messages/".to_string(),
            ],
        }
    }
}

/// Role-based access policy: protected path patterns and the roles allowed
/// to reach them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Substring patterns for protected paths.
    pub protected_patterns: Vec<String>,
    /// Roles admitted to protected paths.
    pub allowed_roles: Vec<Role>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            protected_patterns: vec![
                "/admin/".to_string(),
                "/api/admin/".to_string(),
                "/api/chats/conversations/delete/".to_string(),
                "/api/chats/messages/delete/".to_string(),
                "/api/users/ban/".to_string(),
                "/api/users/unban/".to_string(),
                "/api/reports/".to_string(),
                "/api/settings/".to_string(),
            ],
            allowed_roles: vec![Role::Admin, Role::Moderator],
        }
    }
}

/// Configuration errors. All are fatal before serving traffic.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid rate limiting configuration.
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    /// Invalid time-of-day window.
    #[error("invalid time window: {0}")]
    InvalidTimeWindow(String),
    /// Invalid role policy.
    #[error("invalid rbac policy: {0}")]
    InvalidRbacPolicy(String),
}

/// Humantime serde module for Duration serialization.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
