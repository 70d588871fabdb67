//! Assignment of cargo to trucks.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use freightdesk_core::EntityId;

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::transport::Method;

use super::{Cargo, Client, Truck};

/// A truck with the cargo loaded onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoTruck {
    pub truck: Truck,
    #[serde(default)]
    pub cargos: Vec<Cargo>,
}

/// Body of the assign/unassign endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoTruckLink {
    pub cargo_id: EntityId,
    pub truck_id: EntityId,
}

#[derive(Debug, Default)]
struct Lists {
    assignments: Vec<CargoTruck>,
    by_truck: Vec<Cargo>,
    unassigned: Vec<Cargo>,
    clients: Vec<Client>,
}

#[derive(Debug)]
pub struct CargoTruckStore {
    api: ApiClient,
    lists: RwLock<Lists>,
}

impl CargoTruckStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            lists: RwLock::new(Lists::default()),
        }
    }

    fn update<F: FnOnce(&mut Lists)>(&self, f: F) {
        f(&mut self.lists.write().unwrap_or_else(PoisonError::into_inner));
    }

    fn snapshot<T, F: FnOnce(&Lists) -> T>(&self, f: F) -> T {
        f(&self.lists.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn assignments(&self) -> Vec<CargoTruck> {
        self.snapshot(|l| l.assignments.clone())
    }

    /// Cargo of the truck last loaded with [`CargoTruckStore::fetch_by_truck`].
    pub fn cargos_by_truck(&self) -> Vec<Cargo> {
        self.snapshot(|l| l.by_truck.clone())
    }

    pub fn unassigned(&self) -> Vec<Cargo> {
        self.snapshot(|l| l.unassigned.clone())
    }

    /// Clients offered when building a load.
    pub fn clients(&self) -> Vec<Client> {
        self.snapshot(|l| l.clients.clone())
    }

    pub async fn fetch_all(&self) -> Result<Vec<CargoTruck>, ApiError> {
        let assignments: Vec<CargoTruck> = self
            .api
            .get("/cargo-truck")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load truck assignments"))?;
        self.update(|l| l.assignments = assignments.clone());
        Ok(assignments)
    }

    pub async fn fetch_by_truck(&self, truck_id: EntityId) -> Result<Vec<Cargo>, ApiError> {
        let loaded: CargoTruck = self
            .api
            .get(&format!("/cargo-truck/{truck_id}"))
            .await
            .inspect_err(|e| tracing::error!(%truck_id, error = %e, "failed to load truck cargo"))?;
        self.update(|l| l.by_truck = loaded.cargos.clone());
        Ok(loaded.cargos)
    }

    /// Cargo not yet placed on any truck.
    pub async fn fetch_unassigned(&self) -> Result<Vec<Cargo>, ApiError> {
        let cargos: Vec<Cargo> = self
            .api
            .get("/cargo-truck/unassigned-cargos")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load unassigned cargo"))?;
        self.update(|l| l.unassigned = cargos.clone());
        Ok(cargos)
    }

    /// Client directory from the public endpoint, for picking cargo owners.
    pub async fn fetch_clients(&self) -> Result<Vec<Client>, ApiError> {
        let clients: Vec<Client> = self
            .api
            .get("/public/clients")
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load clients"))?;
        self.update(|l| l.clients = clients.clone());
        Ok(clients)
    }

    pub async fn assign(&self, cargo_id: EntityId, truck_id: EntityId) -> Result<(), ApiError> {
        self.link("/cargo-truck/assign", cargo_id, truck_id).await?;
        tracing::info!(%cargo_id, %truck_id, "cargo assigned to truck");
        Ok(())
    }

    pub async fn unassign(&self, cargo_id: EntityId, truck_id: EntityId) -> Result<(), ApiError> {
        self.link("/cargo-truck/unassign", cargo_id, truck_id).await?;
        tracing::info!(%cargo_id, %truck_id, "cargo removed from truck");
        Ok(())
    }

    async fn link(&self, path: &str, cargo_id: EntityId, truck_id: EntityId) -> Result<(), ApiError> {
        let body = CargoTruckLink { cargo_id, truck_id };
        self.api
            .send_raw(Method::Post, path, RequestOptions::json(&body)?)
            .await
            .map(|_| ())
            .inspect_err(|e| tracing::error!(path, %cargo_id, %truck_id, error = %e, "link change failed"))
    }
}
