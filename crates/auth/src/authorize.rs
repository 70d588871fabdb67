use thiserror::Error;

use crate::{AccessMask, Action, Permission, User};

/// Flattened permissions of the current user's active roles.
///
/// Built once per user record and never patched in place: replacing the user
/// means building a new set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("forbidden: missing '{action}' on view '{view}'")]
    Forbidden { view: String, action: Action },
}

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collect permissions from every active role; inactive roles are ignored
    /// whatever their masks say.
    pub fn from_user(user: &User) -> Self {
        let permissions = user
            .active_roles()
            .flat_map(|role| role.permissions.iter().cloned())
            .collect();
        Self { permissions }
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Effective mask for a view: union over every matching permission.
    pub fn mask_for(&self, view: &str) -> AccessMask {
        self.permissions
            .iter()
            .filter(|p| p.view() == view)
            .fold(AccessMask::empty(), |acc, p| acc | p.access)
    }

    /// Whether `action` is granted on `view`. Unknown views are denied.
    pub fn check_access(&self, view: &str, action: Action) -> bool {
        self.mask_for(view).allows(action)
    }

    /// Whether any of the requested bits is granted on `view`.
    pub fn check_access_any(&self, view: &str, requested: AccessMask) -> bool {
        self.mask_for(view).allows_any(requested)
    }

    /// Distinct views the user can at least read, in first-seen order.
    pub fn readable_views(&self) -> Vec<&str> {
        let mut views: Vec<&str> = Vec::new();
        for p in &self.permissions {
            if p.allows(Action::Read) && !views.contains(&p.view()) {
                views.push(p.view());
            }
        }
        views
    }
}

/// Authorize an action on a view against a resolved permission set.
///
/// - No IO
/// - No panics
pub fn authorize(permissions: &PermissionSet, view: &str, action: Action) -> Result<(), AuthzError> {
    if permissions.check_access(view, action) {
        Ok(())
    } else {
        tracing::debug!(view, %action, "access denied");
        Err(AuthzError::Forbidden {
            view: view.to_string(),
            action,
        })
    }
}
