use std::sync::Arc;

use crate::{
    core::Config,
    events::Bus,
    hooks::HookFactory,
    provider::ProviderRef,
    subscribers::{Subscribe, SubscriberSet},
};
use super::orchestrator::{Listener, Orchestrator};

/// Builder for constructing an [`Orchestrator`].
pub struct OrchestratorBuilder {
    cfg: Config,
    provider: ProviderRef,
    hooks: Box<dyn HookFactory>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl OrchestratorBuilder {
    /// Creates a builder with the default configuration and no subscribers.
    pub fn new(provider: ProviderRef, hooks: impl HookFactory) -> Self {
        Self {
            cfg: Config::default(),
            provider,
            hooks: Box::new(hooks),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the runtime configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets notice subscribers.
    ///
    /// Subscribers receive runtime notices (monitor lifecycle, descendants, refusals)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the orchestrator.
    ///
    /// With subscribers configured, their workers and the bus listener are spawned here,
    /// so this must then be called inside a tokio runtime.
    pub fn build(self) -> Arc<Orchestrator> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            Some(Listener::spawn(&bus, set))
        };

        Arc::new(Orchestrator::new_internal(
            self.cfg,
            bus,
            self.provider,
            self.hooks,
            listener,
        ))
    }
}
