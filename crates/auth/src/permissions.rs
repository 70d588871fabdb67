use serde::{Deserialize, Deserializer, Serialize};

use freightdesk_core::{Entity, EntityId};

use crate::{AccessMask, Action};

/// Screen category a permission belongs to (menu grouping metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenType {
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Permission identifier plus display metadata.
///
/// `value` is the view identifier used as the lookup key for access checks
/// (e.g. `"cargo"`). Everything else is presentation metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionName {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_type: Option<ScreenType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl PermissionName {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

// The backend sends the full object, but flattened role payloads carry the
// bare identifier string.
impl<'de> Deserialize<'de> for PermissionName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Full {
            value: String,
            #[serde(default)]
            authority: Option<String>,
            #[serde(default)]
            description: Option<String>,
            #[serde(default)]
            icon: Option<String>,
            #[serde(default)]
            screen_type: Option<ScreenType>,
            #[serde(default)]
            view: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Bare(String),
            Full(Full),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Bare(value) => PermissionName::new(value),
            Wire::Full(f) => PermissionName {
                value: f.value,
                authority: f.authority,
                description: f.description,
                icon: f.icon,
                screen_type: f.screen_type,
                view: f.view,
            },
        })
    }
}

/// A grant of CRUD access on one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: PermissionName,
    #[serde(default, alias = "operationPermissions")]
    pub access: AccessMask,
}

impl Permission {
    pub fn new(view: impl Into<String>, access: AccessMask) -> Self {
        Self {
            id: None,
            name: PermissionName::new(view),
            access,
        }
    }

    /// View identifier this permission applies to.
    pub fn view(&self) -> &str {
        &self.name.value
    }

    pub fn allows(&self, action: Action) -> bool {
        self.access.allows(action)
    }
}

impl Entity for Permission {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}
