//! HTTP client for the storefront backend.
//!
//! Two concerns live here: downloading the delivery-zone polygons and asking
//! the server for the authoritative zone, time estimate, and minimum order.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use zonar_core::{
    model::{Coordinates, ResolutionResult, ZoneId},
    ports::{ResolveError, ResolveRequest, ResolverPort},
    zones::{ZoneCollection, ZoneStore},
};

/// Path of the zone GeoJSON document, relative to the shop base URL.
pub const ZONES_PATH: &str = "/shop/zones/";
/// Path of the time/zone resolution endpoint, relative to the shop base URL.
pub const RESOLVE_PATH: &str = "/shop/gettime/";

/// Timestamp layouts the backend has been seen emitting.
const TIME_FORMATS: [&str; 2] = ["%d.%m.%Y %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Raw payload of the resolution endpoint.
#[derive(Debug, Deserialize)]
struct ResolveWire {
    #[serde(default)]
    error: Option<String>,

    #[serde(rename = "zonaId", default)]
    zona_id: u32,

    /// Time line in the form "~ 35 мин.".
    #[serde(default)]
    order_minutes: Option<String>,

    #[serde(default)]
    min_order: Option<Decimal>,

    #[serde(default)]
    delivery_time_text: Option<String>,

    #[serde(rename = "timeUTC", default)]
    time_utc: Option<String>,

    /// "lat,lon" pair.
    #[serde(default)]
    coords: Option<String>,

    #[serde(default)]
    address: Option<String>,
}

impl ResolveWire {
    fn into_result(self) -> ResolutionResult {
        ResolutionResult {
            error: self.error,
            zone_id: ZoneId(self.zona_id),
            minutes: self.order_minutes.as_deref().and_then(parse_minutes),
            min_order: self.min_order,
            // The caller compares the minimum against the basket total.
            min_order_met: false,
            time_text: self.delivery_time_text,
            time_utc: self.time_utc.as_deref().and_then(parse_time),
            address: self.address,
            coordinates: self.coords.as_deref().and_then(Coordinates::from_wire),
        }
    }
}

/// Pull the minute count out of lines like "~ 35 мин.".
fn parse_minutes(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Download the delivery-zone polygons and build the zone store.
///
/// # Errors
///
/// Returns a [`ResolveError`] on transport failure or an undecodable body.
pub async fn fetch_zones(client: &Client, base_url: &str) -> Result<ZoneStore, ResolveError> {
    let url = format!("{}{ZONES_PATH}", base_url.trim_end_matches('/'));
    let collection: ZoneCollection = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let store = ZoneStore::new(collection);
    tracing::info!(zones = store.len(), "loaded delivery zones");
    Ok(store)
}

/// [`ResolverPort`] implementation over the shop's resolution endpoint.
pub struct ShopResolver {
    client: Client,
    resolve_url: String,
}

impl ShopResolver {
    /// Create a resolver bound to the given shop base URL.
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            resolve_url: format!("{}{RESOLVE_PATH}", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ResolverPort for ShopResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolutionResult, ResolveError> {
        let coords = request
            .coordinates
            .map(Coordinates::to_wire)
            .unwrap_or_default();
        let address = request.address.clone().unwrap_or_default();
        let zone_hint = request.zone_hint.unwrap_or(ZoneId::NONE);

        let form = [
            ("coords", coords.as_str()),
            ("address", address.as_str()),
            ("shipping_method", request.method.code()),
            ("zonaId", &zone_hint.to_string()),
        ];

        tracing::debug!(
            method = %request.method,
            zone_hint = %zone_hint,
            "requesting time resolution"
        );

        let body = self
            .client
            .post(&self.resolve_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let wire: ResolveWire = serde_json::from_str(&body)
            .map_err(|error| ResolveError::Malformed(error.to_string()))?;
        Ok(wire.into_result())
    }
}
