//! Shipping clients (the customers who own the cargo).

use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId};

use super::{Resource, ResourceStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_code: Option<String>,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl Client {
    pub fn new(full_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
            client_code: None,
            phone_number: phone_number.into(),
            whatsapp_number: None,
            email: None,
            additional_info: None,
        }
    }
}

impl Entity for Client {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Client {
    const NAME: &'static str = "client";
    const PATH: &'static str = "/client";
    const LIST_PATH: &'static str = "/client/all";
}

pub type ClientStore = ResourceStore<Client>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::client;
    use serde_json::json;

    #[tokio::test]
    async fn list_endpoint_differs_from_resource_path() {
        let (api, transport) = client();
        transport
            .reply(200, json!([{ "id": 1, "fullName": "Aibek", "phoneNumber": "+996" }]))
            .reply(200, json!({ "id": 2, "fullName": "Dana", "phoneNumber": "+7", "clientCode": "D-2" }));
        let store = ClientStore::new(api);

        store.fetch_all().await.unwrap();
        let created = store.create(&Client::new("Dana", "+7")).await.unwrap();

        assert_eq!(created.client_code.as_deref(), Some("D-2"));
        let requests = transport.requests();
        assert!(requests[0].url.ends_with("/client/all"));
        assert!(requests[1].url.ends_with("/client"));
        assert_eq!(
            requests[1].body,
            Some(json!({ "fullName": "Dana", "phoneNumber": "+7" }))
        );
        assert_eq!(store.len(), 2);
    }
}
