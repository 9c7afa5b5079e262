//! Builder for configuring dispatch engines

use std::sync::Arc;

use tracing::warn;

use super::{DispatchConfig, DispatchEngine, Picker, RandomPicker};
use crate::Result;
use crate::prompt::Persona;
use crate::providers::{Availability, ReqwestTransport, Transport};

/// Builder for [`DispatchEngine`].
///
/// Only the availability set is required. Transport defaults to
/// [`ReqwestTransport`] and randomness to [`RandomPicker`].
pub struct DispatchEngineBuilder {
    availability: Arc<Availability>,
    transport: Option<Arc<dyn Transport>>,
    picker: Option<Arc<dyn Picker>>,
    persona: Persona,
    config: DispatchConfig,
}

impl DispatchEngineBuilder {
    pub fn new(availability: Arc<Availability>) -> Self {
        Self {
            availability,
            transport: None,
            picker: None,
            persona: Persona::default(),
            config: DispatchConfig::default(),
        }
    }

    /// Use a custom transport (e.g. a scripted one in tests).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom source of randomness.
    pub fn picker(mut self, picker: Arc<dyn Picker>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin new sessions to `provider`.
    pub fn forced_provider(mut self, provider: impl Into<String>) -> Self {
        self.config.forced_provider = Some(provider.into());
        self
    }

    pub fn build(self) -> Result<DispatchEngine> {
        if let Some(forced) = &self.config.forced_provider
            && !self.availability.contains(forced)
        {
            warn!(provider = %forced, "forced provider has no credentials, random selection will be used");
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(DispatchEngine {
            availability: self.availability,
            transport,
            picker: self.picker.unwrap_or_else(|| Arc::new(RandomPicker)),
            persona: self.persona,
            config: self.config,
        })
    }
}
