//! Cargo: the consignments moving through the warehouses.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId};

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::transport::Method;

use super::{Resource, ResourceStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cargo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub weight: f64,
    pub volume: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_arrival_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_date: Option<String>,
    pub client: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Cargo {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for Cargo {
    const NAME: &'static str = "cargo";
    const PATH: &'static str = "/cargo";
    const LIST_PATH: &'static str = "/cargo";
}

/// One value of the backend's cargo status enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoStatus {
    pub value: String,
    #[serde(default)]
    pub description: String,
}

/// Row of `/cargo/ids`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoIdRow {
    pub id: EntityId,
}

/// Body of `POST /cargo/reassign-all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignCargo {
    pub from_user_id: EntityId,
    pub to_user_id: EntityId,
}

/// Cargo collection plus the status enumeration and cargo-only endpoints.
#[derive(Debug)]
pub struct CargoStore {
    store: ResourceStore<Cargo>,
    statuses: RwLock<Vec<CargoStatus>>,
}

impl std::ops::Deref for CargoStore {
    type Target = ResourceStore<Cargo>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl CargoStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            store: ResourceStore::new(api),
            statuses: RwLock::new(Vec::new()),
        }
    }

    pub fn statuses(&self) -> Vec<CargoStatus> {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load `/enums/cargoStatuses`, keeping the backend's order.
    pub async fn fetch_statuses(&self) -> Result<Vec<CargoStatus>, ApiError> {
        let statuses: Vec<CargoStatus> = self
            .api()
            .get("/enums/cargoStatuses")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load cargo statuses"))?;
        *self.statuses.write().unwrap_or_else(PoisonError::into_inner) = statuses.clone();
        Ok(statuses)
    }

    /// Record the price charged for a cargo.
    pub async fn set_price(&self, cargo_id: EntityId, price: f64) -> Result<(), ApiError> {
        let options = RequestOptions::new()
            .param("cargoId", cargo_id)
            .param("price", price)
            .with_body(serde_json::json!({}));
        self.api()
            .send_raw(Method::Post, "/cargo/price", options)
            .await
            .inspect_err(|e| tracing::error!(%cargo_id, error = %e, "failed to set cargo price"))?;
        tracing::info!(%cargo_id, price, "cargo price set");
        Ok(())
    }

    /// Whether any cargo is still attached to the given user account.
    pub async fn is_linked_to_user(&self, auth_id: EntityId) -> Result<bool, ApiError> {
        let options = RequestOptions::new().param("userId", auth_id);
        self.api()
            .send(Method::Get, "/cargo/is-linked", options)
            .await
            .inspect_err(|e| tracing::error!(%auth_id, error = %e, "cargo link check failed"))
    }

    /// Move every cargo owned by one user to another.
    pub async fn reassign_all(&self, from: EntityId, to: EntityId) -> Result<(), ApiError> {
        let body = ReassignCargo {
            from_user_id: from,
            to_user_id: to,
        };
        self.api()
            .send_raw(Method::Post, "/cargo/reassign-all", RequestOptions::json(&body)?)
            .await
            .inspect_err(|e| tracing::error!(%from, %to, error = %e, "cargo reassignment failed"))?;
        tracing::info!(%from, %to, "cargo reassigned");
        Ok(())
    }

    /// Ids of every cargo, ascending.
    pub async fn fetch_ids(&self) -> Result<Vec<EntityId>, ApiError> {
        let mut rows: Vec<CargoIdRow> = self.api().get("/cargo/ids").await?;
        rows.sort_by_key(|row| row.id);
        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}
