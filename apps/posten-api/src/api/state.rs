use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::delivery::DeliveryService;
use crate::infrastructure::UpstreamStatus;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub delivery: Arc<DeliveryService>,
    pub upstream_status: UpstreamStatus,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        delivery: DeliveryService,
        upstream_status: UpstreamStatus,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            delivery: Arc::new(delivery),
            upstream_status,
            static_dir,
        }
    }
}
