use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::offline::OfflineService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<OfflineService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<OfflineService>) -> Self {
        let metrics = Arc::clone(service.metrics());
        Self {
            config: Arc::new(config),
            service,
            metrics,
        }
    }
}
