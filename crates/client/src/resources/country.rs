use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId};

use super::{Resource, ResourceStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Entity for Country {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Country {
    const NAME: &'static str = "country";
    const PATH: &'static str = "/country";
    const LIST_PATH: &'static str = "/country/all";
}

pub type CountryStore = ResourceStore<Country>;
