use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId};

use crate::{AccessMask, Permission};

/// Role as the backend models it: a named, switchable bundle of permissions.
///
/// Only `active` roles contribute to the current user's effective access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            active: false,
            permissions: Vec::new(),
        }
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    /// Shape expected by `POST /role`: permission names flattened to the
    /// view identifier.
    pub fn to_payload(&self) -> RolePayload {
        RolePayload {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            active: self.active,
            permissions: self
                .permissions
                .iter()
                .map(|p| PermissionPayload {
                    id: p.id,
                    name: p.name.value.clone(),
                    access: p.access,
                })
                .collect(),
        }
    }
}

impl Entity for Role {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    pub permissions: Vec<PermissionPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    pub access: AccessMask,
}
