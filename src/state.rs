//! Shared application state for request handlers.

use std::sync::Arc;

use crate::store::RoleSource;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the role source every request queries. Nothing in here changes
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoleSource>,
}

impl AppState {
    /// Creates a new application state around the given role source.
    pub fn new(store: impl RoleSource + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
