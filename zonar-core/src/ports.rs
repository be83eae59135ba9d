//! Traits describing geocoder and backend capabilities plus their error shapes.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use rust_decimal::Decimal;

use crate::model::{
    Candidate, Coordinates, Located, ProviderId, ResolutionResult, ShippingMethod, ZoneId,
};

/// Errors that can occur while talking to a geocoding provider.
///
/// Providers never leak their own error shapes; everything funnels into this
/// enum, and [`GeocodeError::hint`] gives the transient message shown to the
/// user.
#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The provider returned no usable candidates.
    #[error("Address not found")]
    NotFound,
    /// No provider registered under the requested id.
    #[error("Unknown provider")]
    UnknownProvider,
    /// Internal provider error.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl GeocodeError {
    /// Human-readable fallback message for the hint line.
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            GeocodeError::NotFound => "Адрес не найден",
            GeocodeError::Network(_) | GeocodeError::UnknownProvider | GeocodeError::Provider(_) => {
                "Не удалось выполнить поиск адреса"
            }
        }
    }
}

/// Errors from the time/zone resolution endpoint.
///
/// These are transport-level failures only; "address outside the delivery
/// zone" and friends arrive in-band inside [`ResolutionResult`].
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// Network layer failed or the server answered with a non-success status.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The server answered with something the client could not interpret.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Static metadata describing a geocoding provider and its map defaults.
#[derive(Debug, Clone)]
pub struct ProviderMeta {
    /// Unique identifier used for registry lookups.
    pub id: ProviderId,
    /// Human-friendly display name.
    pub name: String,
    /// Suggestion fetches start once the query reaches this many characters.
    pub min_query_len: usize,
    /// Initial map center.
    pub center: Coordinates,
    /// Smallest zoom the provider supports.
    pub min_zoom: u8,
    /// Largest zoom the provider supports.
    pub max_zoom: u8,
}

/// Trait for provider-specific geocoding backends.
#[async_trait]
pub trait GeocoderPort: Send + Sync {
    /// Metadata describing this provider.
    fn meta(&self) -> &ProviderMeta;

    /// Free-text suggestion search.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] when the provider request fails.
    async fn suggest(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, GeocodeError>;

    /// Turn a chosen candidate into coordinates and a normalized address line.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] when the provider request fails or the
    /// candidate's handle no longer resolves.
    async fn resolve_candidate(&self, candidate: &Candidate) -> Result<Located, GeocodeError>;

    /// Coordinate to address line (reverse geocoding).
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] when the provider request fails or nothing
    /// is found near the point.
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Located, GeocodeError>;
}

/// Parameters of one time/zone resolution call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    /// Captured coordinates, when the address has been located client-side.
    pub coordinates: Option<Coordinates>,
    /// Captured display address, when known.
    pub address: Option<String>,
    /// Shipping-method branch the server should take.
    pub method: ShippingMethod,
    /// Client-side zone guess from the optimism pass; the server re-checks it.
    pub zone_hint: Option<ZoneId>,
    /// Current basket total, used to evaluate the zone minimum.
    pub basket_total: Decimal,
}

/// Trait for the authoritative server-side resolution endpoint.
#[async_trait]
pub trait ResolverPort: Send + Sync {
    /// Ask the server for zone, time estimate, and minimum order.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] on transport failure; in-band rejections
    /// come back as `Ok` results carrying an error message.
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolutionResult, ResolveError>;
}
