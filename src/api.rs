//! HTTP API for the USSD learning gateway

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::db::Database;
use crate::runtime::{DatabaseStorage, ProductionRuntime, UssdRuntime};
use crate::services::ContentServices;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ProductionRuntime>,
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database, services: ContentServices, adapter_timeout: Duration) -> Self {
        let runtime: ProductionRuntime = UssdRuntime::new(
            DatabaseStorage::new(db.clone()),
            services.translator,
            services.summarizer,
        )
        .with_adapter_timeout(adapter_timeout);
        Self {
            runtime: Arc::new(runtime),
            db,
        }
    }
}
