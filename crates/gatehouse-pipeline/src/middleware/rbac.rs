//! Role-based authorization for protected paths.
//!
//! Role resolution is an explicit, ordered rule set over the fixed
//! [`Principal`] structure. Same attributes always resolve to the same role.

use crate::domain::config::RbacConfig;
use crate::domain::types::{Principal, Request, Role};
use crate::middleware::{Gate, GateDecision};
use tracing::debug;

/// Resolve a principal's role. Pure function, precedence order:
///
/// 1. unauthenticated → `Anonymous`
/// 2. superuser flag → `Admin`
/// 3. staff flag → `Admin`
/// 4. explicit `role` attribute, lower-cased (unknown values → `User`)
/// 5. group membership: admin-equivalent → `Admin`, moderator-equivalent → `Moderator`
/// 6. otherwise → `User`
pub fn resolve_role(principal: Option<&Principal>) -> Role {
    let Some(principal) = principal else {
        return Role::Anonymous;
    };

    if principal.is_superuser {
        return Role::Admin;
    }
    if principal.is_staff {
        return Role::Admin;
    }

    if let Some(role) = &principal.role {
        return match role.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            _ => Role::User,
        };
    }

    let mut groups = principal.groups.iter().map(|g| g.to_lowercase());
    if groups.any(|g| g == "admin" || g == "administrator") {
        return Role::Admin;
    }
    let mut groups = principal.groups.iter().map(|g| g.to_lowercase());
    if groups.any(|g| g == "moderator" || g == "mod") {
        return Role::Moderator;
    }

    Role::User
}

/// Rejects requests to protected paths unless the resolved role is allowed.
pub struct RbacGate {
    config: RbacConfig,
}

impl RbacGate {
    pub fn new(config: RbacConfig) -> Self {
        Self { config }
    }

    fn is_protected(&self, path: &str) -> bool {
        self.config
            .protected_patterns
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
    }

    fn allowed_roles_description(&self) -> String {
        self.config
            .allowed_roles
            .iter()
            .map(Role::to_string)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

impl Gate for RbacGate {
    fn name(&self) -> &'static str {
        "rbac"
    }

    fn check(&self, request: &Request) -> GateDecision {
        if !self.is_protected(&request.path) {
            return GateDecision::Pass;
        }

        let role = resolve_role(request.principal.as_ref());
        if self.config.allowed_roles.contains(&role) {
            return GateDecision::Pass;
        }

        debug!(
            request_id = %request.id,
            path = %request.path,
            role = %role,
            "insufficient role for protected path"
        );
        GateDecision::deny(format!(
            "Access denied. This action requires {} privileges. Your current role: {}",
            self.allowed_roles_description(),
            role,
        ))
    }
}
