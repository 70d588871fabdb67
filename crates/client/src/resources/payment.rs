//! Payments: clients paying for cargo, the company paying carriers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use freightdesk_core::{Entity, EntityId};

use crate::error::ApiError;

use super::{to_payload, Resource, ResourceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    ClientPaysForCargo,
    CompanyPaysCarriers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Date the money actually moved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Client or carrier, depending on `payment_type`. Snake case on the wire.
    pub payer_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
}

impl Entity for Payment {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Payment {
    const NAME: &'static str = "payment";
    const PATH: &'static str = "/payment";
    const LIST_PATH: &'static str = "/payment";

    /// Updates send the status as its bare value (or `null`).
    fn update_payload(&self) -> Result<Value, ApiError> {
        let mut payload = to_payload(self)?;
        if let Value::Object(map) = &mut payload {
            let status = self
                .status
                .as_ref()
                .map_or(Value::Null, |s| Value::String(s.value.clone()));
            map.insert("status".to_string(), status);
        }
        Ok(payload)
    }
}

pub type PaymentStore = ResourceStore<Payment>;

impl ResourceStore<Payment> {
    /// Record a client paying for cargo.
    pub async fn create_for_cargo(&self, payment: &Payment) -> Result<Payment, ApiError> {
        self.create_at("/payment/cargo", payment.payload()?).await
    }

    /// Record the company paying a carrier for a truck run.
    pub async fn create_for_truck(&self, payment: &Payment) -> Result<Payment, ApiError> {
        self.create_at("/payment/truck", payment.payload()?).await
    }
}
