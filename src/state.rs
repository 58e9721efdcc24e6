// src/state.rs
use std::sync::Arc;

use dashmap::DashMap;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::fulfillment::FulfillmentClient;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub fulfillment: FulfillmentClient,
    pub order_locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl AppState {
    pub fn new(db_pool: PgPool, fulfillment: FulfillmentClient) -> Self {
        Self {
            db_pool,
            fulfillment,
            order_locks: Arc::new(DashMap::new()),
        }
    }

    /// Lock guarding order placement for one user. Held across the whole
    /// workflow so two concurrent placements cannot both submit the same cart
    /// to the fulfillment provider.
    pub fn placement_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.order_locks.entry(user_id).or_default().value().clone()
    }
}
