use std::sync::Arc;
use tokio::sync::Mutex;

use crate::catalog::{Catalog, CatalogCache};
use crate::config::Config;
use crate::tracker::Tracker;

use super::api::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tracker: Arc<Mutex<Tracker>>,
    pub catalog: Arc<CatalogCache>,
}

impl AppState {
    pub fn new(config: Config, tracker: Tracker, catalog: CatalogCache) -> Self {
        Self {
            config: Arc::new(config),
            tracker: Arc::new(Mutex::new(tracker)),
            catalog: Arc::new(catalog),
        }
    }

    /// Refreshes the catalog off the async runtime.
    pub async fn load_catalog(&self) -> ApiResult<Catalog> {
        let cache = self.catalog.clone();
        let catalog = tokio::task::spawn_blocking(move || cache.refresh())
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))??;
        Ok(catalog)
    }
}

#[cfg(test)]
use crate::tracker::testing::FakeRig;

/// State backed by a fresh one-satellite catalog in a scratch directory.
#[cfg(test)]
pub(crate) fn scratch_state(name: &str, rig: Option<FakeRig>) -> AppState {
    use crate::predict::fixtures::{ISS_LINE1, ISS_LINE2, ISS_NAME};
    use crate::radio::Rig;
    use crate::tracker::testing::FakeEphemeris;

    let dir = std::env::temp_dir().join(format!("dplr-web-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tle.txt");
    std::fs::write(&path, format!("{}\n{}\n{}\n", ISS_NAME, ISS_LINE1, ISS_LINE2)).unwrap();

    let config = Config::parse("tracking: { interval: 100ms }").unwrap();
    let catalog = CatalogCache::new(path, String::new(), config.catalog.max_age);
    let rig = rig.map(|r| Box::new(r) as Box<dyn Rig>);
    let tracker = Tracker::new(rig, Arc::new(FakeEphemeris::new(2.0)));
    AppState::new(config, tracker, catalog)
}
