use std::sync::Arc;

use manuscript_core::events::EventBus;
use manuscript_core::store::ArticleStore;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: Arc<dyn ArticleStore>,
    config: AppConfig,
    event_bus: EventBus,
}

impl AppState {
    pub fn new(store: Arc<dyn ArticleStore>, config: AppConfig, event_bus: EventBus) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store,
                config,
                event_bus,
            }),
        }
    }

    pub fn store(&self) -> &dyn ArticleStore {
        self.inner.store.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }
}
