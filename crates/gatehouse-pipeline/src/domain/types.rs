//! Core request types shared by every gate.
//!
//! A [`Request`] is constructed once at the boundary and never mutated while
//! it travels through the chain. Client identity derivation happens at
//! construction time so gates only ever see a plain string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// HTTP-style request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Error for unrecognized method strings at the boundary.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown request method: {0}")]
pub struct UnknownMethod(pub String);

/// Resolved access role for a principal.
///
/// Ordered from least to most privileged. Resolution from principal
/// attributes is a pure function, see `middleware::rbac::resolve_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anonymous,
    User,
    Moderator,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Anonymous => "anonymous",
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        };
        write!(f, "{}", name)
    }
}

/// Authenticated actor attached to a request.
///
/// All fields beyond the username are optional signals consumed by role
/// resolution; absent signals simply fall through to the next rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Principal {
    /// Login name, used for audit records.
    pub username: String,
    /// Platform-level superuser flag.
    pub is_superuser: bool,
    /// Staff / elevated-operator flag.
    pub is_staff: bool,
    /// Explicit role attribute, matched case-insensitively.
    pub role: Option<String>,
    /// Group memberships, matched case-insensitively.
    pub groups: Vec<String>,
}

impl Principal {
    /// Principal with only a username set.
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

/// An incoming request as seen by the gates. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique id for correlating log lines.
    pub id: Uuid,
    pub method: Method,
    pub path: String,
    /// Derived client identity: forwarded-for token or direct remote address.
    pub client_identity: String,
    /// `None` for unauthenticated requests.
    pub principal: Option<Principal>,
    pub arrival: DateTime<Utc>,
}

impl Request {
    /// Build a request at the boundary, deriving the client identity from the
    /// forwarded-for header (first entry wins) or the direct remote address.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        forwarded_for: Option<&str>,
        remote_addr: &str,
        principal: Option<Principal>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            client_identity: derive_client_identity(forwarded_for, remote_addr),
            principal,
            arrival: Utc::now(),
        }
    }

    /// Display name for audit records.
    pub fn principal_name(&self) -> &str {
        self.principal
            .as_ref()
            .map(|p| p.username.as_str())
            .unwrap_or("Anonymous")
    }
}

/// First forwarded-for entry if present, else the direct remote address.
pub fn derive_client_identity(forwarded_for: Option<&str>, remote_addr: &str) -> String {
    match forwarded_for {
        Some(list) => list
            .split(',')
            .next()
            .map(|ip| ip.trim())
            .filter(|ip| !ip.is_empty())
            .unwrap_or(remote_addr)
            .to_string(),
        None => remote_addr.to_string(),
    }
}

/// Outcome of running a request through the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    /// All gates passed; payload produced by the terminal handler.
    Ok { body: serde_json::Value },
    /// A gate rejected the request.
    Forbidden { message: String },
}

impl Response {
    pub fn ok(body: serde_json::Value) -> Self {
        Response::Ok { body }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Response::Forbidden {
            message: message.into(),
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Response::Forbidden { .. })
    }
}
