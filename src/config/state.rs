// Application state module
// Immutable per-process state shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::dispatch::routes::{self, RouteTable};
use crate::dispatch::static_files::StaticAssetResolver;

/// Application state
///
/// Constructed once at startup and shared read-only across connections.
/// Nothing here is mutated after construction, so concurrent dispatches need
/// no synchronization.
pub struct AppState {
    pub config: Config,
    pub assets: Arc<StaticAssetResolver>,
    pub routes: RouteTable,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let assets = Arc::new(StaticAssetResolver::new(&config.site.root));
        let routes = routes::build_routes(&assets);
        Self {
            config,
            assets,
            routes,
        }
    }
}
