use std::sync::Arc;

use crate::config::Config;
use crate::services::{AccountService, RequestWorkflow, ReservationService, ReviewService, ShopService};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self { store, config: Arc::new(config) }
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(Arc::clone(&self.store), Arc::clone(&self.config))
    }

    pub fn workflow(&self) -> RequestWorkflow {
        RequestWorkflow::new(Arc::clone(&self.store))
    }

    pub fn shops(&self) -> ShopService {
        ShopService::new(Arc::clone(&self.store))
    }

    pub fn reservations(&self) -> ReservationService {
        ReservationService::new(Arc::clone(&self.store), self.config.max_reservations)
    }

    pub fn reviews(&self) -> ReviewService {
        ReviewService::new(Arc::clone(&self.store))
    }
}
