use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId};

use crate::error::ApiError;

use super::{Resource, ResourceStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub registration_country: String,
    pub volume_m3: f64,
    pub departure_warehouse: String,
    pub delivery_warehouse: String,
    pub driver_phone: String,
    #[serde(default)]
    pub additional_information: String,
}

impl Entity for Truck {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Truck {
    const NAME: &'static str = "truck";
    const PATH: &'static str = "/truck";
    const LIST_PATH: &'static str = "/truck";
}

/// Row of `/truck/ids`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruckIdRow {
    pub id: EntityId,
}

pub type TruckStore = ResourceStore<Truck>;

impl ResourceStore<Truck> {
    /// Ids of every truck, ascending.
    pub async fn fetch_ids(&self) -> Result<Vec<EntityId>, ApiError> {
        let mut rows: Vec<TruckIdRow> = self
            .api()
            .get("/truck/ids")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load truck ids"))?;
        rows.sort_by_key(|row| row.id);
        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}
