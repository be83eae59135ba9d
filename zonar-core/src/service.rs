//! High-level service facade combining providers, zones, and the resolver.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::machine::ResolveTicket;
use crate::model::{Candidate, Coordinates, Located, ProviderId, ResolutionResult};
use crate::plugin::ProviderRegistry;
use crate::ports::{GeocodeError, ProviderMeta, ResolveError};
use crate::resolver::DeliveryResolver;
use crate::zones::ZoneStore;

/// Public entry point for suggestion, geocoding, and resolution calls.
pub struct ZonarService {
    registry: Arc<ProviderRegistry>,
    resolver: DeliveryResolver,
}

impl ZonarService {
    /// Create a new service bound to the provided registry and resolver.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, resolver: DeliveryResolver) -> Self {
        Self { registry, resolver }
    }

    /// List all registered geocoding providers.
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderMeta> {
        self.registry.providers()
    }

    /// The shared zone polygons.
    #[must_use]
    pub fn zones(&self) -> &Arc<ZoneStore> {
        self.resolver.zones()
    }

    /// Fetch suggestions from the given provider.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] if the provider is unknown or its call fails.
    pub async fn suggest(
        &self,
        provider: &ProviderId,
        text: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, GeocodeError> {
        let plugin = self.registry.plugin(provider)?;
        plugin.geocoder.suggest(text, limit).await
    }

    /// Geocode a chosen candidate into coordinates and an address line.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] if the provider is unknown or its call fails.
    pub async fn resolve_candidate(
        &self,
        provider: &ProviderId,
        candidate: &Candidate,
    ) -> Result<Located, GeocodeError> {
        let plugin = self.registry.plugin(provider)?;
        plugin.geocoder.resolve_candidate(candidate).await
    }

    /// Reverse-geocode a coordinate into an address line.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] if the provider is unknown or its call fails.
    pub async fn reverse_geocode(
        &self,
        provider: &ProviderId,
        coordinates: Coordinates,
    ) -> Result<Located, GeocodeError> {
        let plugin = self.registry.plugin(provider)?;
        plugin.geocoder.reverse_geocode(coordinates).await
    }

    /// Run one resolution ticket against the zone store and the backend.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] on transport failure.
    pub async fn resolve(
        &self,
        ticket: &ResolveTicket,
        basket_total: Decimal,
    ) -> Result<ResolutionResult, ResolveError> {
        self.resolver.resolve(ticket, basket_total).await
    }
}
