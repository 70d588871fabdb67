use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId, IdRef};

use super::{Resource, ResourceStore};

/// Tariff attached to a cargo.
///
/// The backend embeds the full cargo in responses; only its id is kept, so
/// the outgoing payload carries `cargo: {id}` as the backend expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub cargo: IdRef,
    pub amount: f64,
}

impl Entity for Price {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Price {
    const NAME: &'static str = "price";
    const PATH: &'static str = "/price";
    const LIST_PATH: &'static str = "/price/all";
}

pub type PriceStore = ResourceStore<Price>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_cargo_collapses_to_reference() {
        let price: Price = serde_json::from_value(json!({
            "id": 7,
            "cargo": { "id": 3, "weight": 10.0, "client": "ACME" },
            "amount": 150.0
        }))
        .unwrap();
        assert_eq!(
            price.payload().unwrap(),
            json!({ "id": 7, "cargo": { "id": 3 }, "amount": 150.0 })
        );
    }
}
