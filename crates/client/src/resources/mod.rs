//! Resource stores: one CRUD state container per backend entity type.
//!
//! Every store follows the same contract. Local state changes only after the
//! backend confirmed the operation; a failed call returns the error and
//! leaves the collection exactly as it was.

use std::fmt::Debug;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use freightdesk_core::{sort_by_id, DomainError, Entity, EntityId};

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::transport::Method;

pub mod cargo;
pub mod cargo_truck;
pub mod carrier;
pub mod city;
pub mod client;
pub mod country;
pub mod payment;
pub mod price;
pub mod truck;
pub mod users;
pub mod warehouse;

pub use cargo::{Cargo, CargoIdRow, CargoStatus, CargoStore, ReassignCargo};
pub use cargo_truck::{CargoTruck, CargoTruckLink, CargoTruckStore};
pub use carrier::{Carrier, CarrierStore};
pub use city::{City, CityStore};
pub use client::{Client, ClientStore};
pub use country::{Country, CountryStore};
pub use payment::{Payment, PaymentStatus, PaymentStore, PaymentType};
pub use price::{Price, PriceStore};
pub use truck::{Truck, TruckIdRow, TruckStore};
pub use users::AccessStore;
pub use warehouse::{Warehouse, WarehouseStore};

/// A backend entity served by a conventional REST resource.
///
/// `PATH` receives `POST`/`PUT` with the entity body and `DELETE {PATH}/{id}`;
/// `LIST_PATH` answers `GET` with the full collection.
pub trait Resource:
    Entity + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Human-readable name used in logs.
    const NAME: &'static str;
    const PATH: &'static str;
    const LIST_PATH: &'static str;

    /// Body sent on create. Defaults to the entity itself.
    fn payload(&self) -> Result<Value, ApiError> {
        to_payload(self)
    }

    /// Body sent on update. Defaults to [`Resource::payload`].
    fn update_payload(&self) -> Result<Value, ApiError> {
        self.payload()
    }
}

pub(crate) fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::Decode(format!("failed to serialize request body: {e}")))
}

/// Generic CRUD store over one [`Resource`].
#[derive(Debug)]
pub struct ResourceStore<R: Resource> {
    api: ApiClient,
    items: RwLock<Vec<R>>,
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<R>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<R>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the whole collection, sorted by id, replacing the local list.
    pub async fn fetch_all(&self) -> Result<Vec<R>, ApiError> {
        match self.api.get::<Vec<R>>(R::LIST_PATH).await {
            Ok(mut items) => {
                sort_by_id(&mut items);
                tracing::debug!(resource = R::NAME, count = items.len(), "collection loaded");
                *self.write() = items.clone();
                Ok(items)
            }
            Err(e) => {
                tracing::error!(resource = R::NAME, error = %e, "failed to load collection");
                Err(e)
            }
        }
    }

    /// Create on the server and append what the server returned.
    pub async fn create(&self, entity: &R) -> Result<R, ApiError> {
        let payload = entity.payload()?;
        self.create_at(R::PATH, payload).await
    }

    /// Update on the server and replace the local entry with the same id.
    pub async fn update(&self, entity: &R) -> Result<R, ApiError> {
        let id = entity.id().ok_or(DomainError::MissingId)?;
        let payload = entity.update_payload()?;

        let updated: R = match self
            .api
            .send(Method::Put, R::PATH, RequestOptions::new().with_body(payload))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(resource = R::NAME, %id, error = %e, "update failed");
                return Err(e);
            }
        };

        let mut items = self.write();
        if let Some(slot) = items.iter_mut().find(|item| item.id() == Some(id)) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// `DELETE {PATH}/{id}`, then drop the local entry.
    pub async fn delete(&self, id: EntityId) -> Result<(), ApiError> {
        let path = format!("{}/{id}", R::PATH);
        self.delete_at(&path, RequestOptions::new(), id).await
    }

    /// Snapshot of the local collection.
    pub fn items(&self) -> Vec<R> {
        self.read().clone()
    }

    pub fn get(&self, id: EntityId) -> Option<R> {
        self.read().iter().find(|item| item.id() == Some(id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// POST `payload` to `path` and append the returned entity.
    pub(crate) async fn create_at(&self, path: &str, payload: Value) -> Result<R, ApiError> {
        let created: R = match self
            .api
            .send(Method::Post, path, RequestOptions::new().with_body(payload))
            .await
        {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(resource = R::NAME, path, error = %e, "create failed");
                return Err(e);
            }
        };

        tracing::debug!(resource = R::NAME, id = ?created.id(), "created");
        self.write().push(created.clone());
        Ok(created)
    }

    pub(crate) async fn delete_at(
        &self,
        path: &str,
        options: RequestOptions,
        id: EntityId,
    ) -> Result<(), ApiError> {
        if let Err(e) = self.api.delete(path, options).await {
            tracing::error!(resource = R::NAME, %id, error = %e, "delete failed");
            return Err(e);
        }
        self.write().retain(|item| item.id() != Some(id));
        Ok(())
    }
}
