//! Domain types for the interceptor pipeline.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AuditConfig, ConfigError, PipelineConfig, RateLimitConfig, RbacConfig, TimeWindowConfig,
};
pub use error::PipelineError;
pub use types::{derive_client_identity, Method, Principal, Request, Response, Role};
