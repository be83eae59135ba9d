//! Registry for geocoding providers.

use std::sync::Arc;

use crate::model::ProviderId;
use crate::ports::{GeocodeError, GeocoderPort, ProviderMeta};

/// A geocoding provider bundled with its static metadata.
pub struct GeocoderPlugin {
    /// Static metadata describing the provider.
    pub meta: ProviderMeta,
    /// Implementation of the geocoding contract.
    pub geocoder: Arc<dyn GeocoderPort>,
}

/// Registry that resolves plugins by provider identifier.
///
/// Registration order is preserved; the first plugin is the default provider.
pub struct ProviderRegistry {
    plugins: Vec<GeocoderPlugin>,
}

impl ProviderRegistry {
    /// Build a registry from the provided plugin list.
    #[must_use]
    pub fn new(plugins: Vec<GeocoderPlugin>) -> Self {
        Self { plugins }
    }

    /// Return metadata for all registered providers, in registration order.
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderMeta> {
        self.plugins.iter().map(|plugin| plugin.meta.clone()).collect()
    }

    /// Iterator over provider metadata.
    pub fn providers_iter(&self) -> impl Iterator<Item = &ProviderMeta> {
        self.plugins.iter().map(|plugin| &plugin.meta)
    }

    /// Look up a plugin for the given provider.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::UnknownProvider`] when no plugin is registered.
    pub fn plugin(&self, provider: &ProviderId) -> Result<&GeocoderPlugin, GeocodeError> {
        self.plugins
            .iter()
            .find(|plugin| plugin.meta.id == *provider)
            .ok_or(GeocodeError::UnknownProvider)
    }
}
