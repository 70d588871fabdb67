use serde::{Deserialize, Serialize};
use serde_json::Value;

use freightdesk_core::{DomainError, Entity, EntityId, IdRef};

use crate::error::ApiError;

use super::{to_payload, City, Resource, ResourceStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    /// Domestic warehouse as opposed to a partner abroad.
    #[serde(default)]
    pub is_local: bool,
    pub city: City,
    pub address: String,
    pub phone_number: String,
    #[serde(default)]
    pub volume_m3: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WarehousePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<EntityId>,
    name: &'a str,
    is_local: bool,
    city: IdRef,
    address: &'a str,
    phone_number: &'a str,
    volume_m3: f64,
}

impl Entity for Warehouse {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Warehouse {
    const NAME: &'static str = "warehouse";
    const PATH: &'static str = "/warehouse";
    const LIST_PATH: &'static str = "/warehouse/all";

    fn payload(&self) -> Result<Value, ApiError> {
        let city = self
            .city
            .id
            .ok_or_else(|| DomainError::validation("warehouse must reference a saved city"))?;
        to_payload(&WarehousePayload {
            id: self.id,
            name: &self.name,
            is_local: self.is_local,
            city: city.into(),
            address: &self.address,
            phone_number: &self.phone_number,
            volume_m3: self.volume_m3,
        })
    }
}

pub type WarehouseStore = ResourceStore<Warehouse>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::client;
    use serde_json::json;

    #[tokio::test]
    async fn update_sends_city_reference_and_replaces_entry() {
        let (api, transport) = client();
        let listed = json!({
            "id": 2, "name": "Central", "isLocal": true, "address": "Main st 1",
            "phoneNumber": "+996", "volumeM3": 1200.0,
            "city": { "id": 4, "name": "Bishkek", "country": { "id": 1, "name": "KG" } }
        });
        let mut renamed = listed.clone();
        renamed["name"] = json!("Central 2");
        transport.reply(200, json!([listed])).reply(200, renamed);

        let store = WarehouseStore::new(api);
        let mut warehouse = store.fetch_all().await.unwrap().remove(0);
        warehouse.name = "Central 2".into();
        store.update(&warehouse).await.unwrap();

        let body = transport.requests()[1].body.clone().unwrap();
        assert_eq!(body["city"], json!({ "id": 4 }));
        assert_eq!(body["isLocal"], json!(true));
        assert_eq!(store.items()[0].name, "Central 2");
    }
}
