use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::registry::Registry;
use crate::signaling::{LifecycleManager, SignalRouter};

/// Shared state handed to every request and connection task.
///
/// The registry is created here once and injected into the router and
/// lifecycle manager; nothing reaches it through a global.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<Registry>,
    pub router: SignalRouter,
    pub lifecycle: LifecycleManager,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(Registry::new());

        Self {
            settings: Arc::new(settings),
            router: SignalRouter::new(registry.clone()),
            lifecycle: LifecycleManager::new(registry.clone()),
            registry,
            start_time: Instant::now(),
        }
    }
}
