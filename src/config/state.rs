// Application state module
// Everything a request needs, shared read-only across connections

use super::types::Config;
use crate::store::{StoreAdapter, TripleStore};

/// Application state
pub struct AppState<S> {
    pub config: Config,
    pub store: StoreAdapter<S>,
}

impl<S: TripleStore> AppState<S> {
    /// Build the state around one long-lived store instance
    pub fn new(config: Config, store: S) -> Self {
        Self {
            config,
            store: StoreAdapter::new(store),
        }
    }
}
