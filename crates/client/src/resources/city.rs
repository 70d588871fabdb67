use serde::{Deserialize, Serialize};
use serde_json::Value;

use freightdesk_core::{DomainError, Entity, EntityId, IdRef};

use crate::error::ApiError;

use super::{to_payload, Country, Resource, ResourceStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub country: Country,
}

/// Outgoing shape: the country travels as a bare reference.
#[derive(Debug, Serialize)]
struct CityPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<EntityId>,
    name: &'a str,
    description: &'a str,
    country: IdRef,
}

impl Entity for City {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

impl Resource for City {
    const NAME: &'static str = "city";
    const PATH: &'static str = "/city";
    const LIST_PATH: &'static str = "/city/all";

    fn payload(&self) -> Result<Value, ApiError> {
        let country = self
            .country
            .id
            .ok_or_else(|| DomainError::validation("city must reference a saved country"))?;
        to_payload(&CityPayload {
            id: self.id,
            name: &self.name,
            description: &self.description,
            country: country.into(),
        })
    }
}

pub type CityStore = ResourceStore<City>;
