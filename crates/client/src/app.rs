//! Application wiring: one session, one API client, every store.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::notifications::Notifications;
use crate::resources::{
    AccessStore, CargoStore, CargoTruckStore, CarrierStore, CityStore, ClientStore, CountryStore,
    PaymentStore, PriceStore, TruckStore, WarehouseStore,
};
use crate::session::{Session, SessionStore};
use crate::storage::{MemoryStorage, TokenStorage};
use crate::transport::Transport;

/// Shared handles to everything a front-end needs.
///
/// Stores hold their own locks, so `AppState` is shared as-is (typically in
/// an `Arc`) across tasks.
#[derive(Debug)]
pub struct AppState {
    pub api: ApiClient,
    pub session: SessionStore,
    pub notifications: Notifications,
    pub cargo: CargoStore,
    pub trucks: TruckStore,
    pub clients: ClientStore,
    pub cities: CityStore,
    pub countries: CountryStore,
    pub warehouses: WarehouseStore,
    pub payments: PaymentStore,
    pub prices: PriceStore,
    pub carriers: CarrierStore,
    pub cargo_trucks: CargoTruckStore,
    pub access: AccessStore,
}

impl AppState {
    /// Production wiring: `reqwest` transport, in-memory token storage.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let session = Arc::new(Session::new(Arc::new(MemoryStorage::new())));
        let api = ApiClient::with_reqwest(config, session)?;
        Ok(Self::from_api(api))
    }

    /// Wiring over a caller-supplied transport and storage.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        let session = Arc::new(Session::new(storage));
        Self::from_api(ApiClient::new(config, transport, session))
    }

    fn from_api(api: ApiClient) -> Self {
        let session = SessionStore::new(api.clone());
        Self {
            notifications: Notifications::new(),
            cargo: CargoStore::new(api.clone()),
            trucks: TruckStore::new(api.clone()),
            clients: ClientStore::new(api.clone()),
            cities: CityStore::new(api.clone()),
            countries: CountryStore::new(api.clone()),
            warehouses: WarehouseStore::new(api.clone()),
            payments: PaymentStore::new(api.clone()),
            prices: PriceStore::new(api.clone()),
            carriers: CarrierStore::new(api.clone()),
            cargo_trucks: CargoTruckStore::new(api.clone()),
            access: AccessStore::new(session.clone()),
            session,
            api,
        }
    }

    /// Shorthand for the shared session state.
    pub fn current(&self) -> &Arc<Session> {
        self.api.session()
    }
}
