//! Carriers: the trucking companies paid for transport.

use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId};

use super::{Resource, ResourceStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    /// Outstanding balance; maintained by the backend from payments.
    #[serde(default)]
    pub balance: f64,
}

impl Entity for Carrier {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Carrier {
    const NAME: &'static str = "carrier";
    const PATH: &'static str = "/carrier";
    const LIST_PATH: &'static str = "/carrier";
}

pub type CarrierStore = ResourceStore<Carrier>;
