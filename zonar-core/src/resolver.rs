//! Shipping-method branching around the authoritative resolution call.
//!
//! The zone store lookup here is a UI optimism pass only: it decides whether
//! the server is worth calling and which zone to hint. Whenever a call is
//! made, the server's answer wins.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::machine::ResolveTicket;
use crate::model::{ResolutionResult, ShippingMethod};
use crate::ports::{ResolveError, ResolveRequest, ResolverPort};
use crate::zones::ZoneStore;

/// Fixed message for addresses no polygon covers.
pub const MSG_OUT_OF_ZONE: &str = "Адрес вне зоны доставки";
/// Message for zone-delivery requests issued without an address.
pub const MSG_NO_ADDRESS: &str = "Укажите адрес";

/// Resolver combining the zone store optimism pass with the server call.
pub struct DeliveryResolver {
    zones: Arc<ZoneStore>,
    port: Arc<dyn ResolverPort>,
}

impl DeliveryResolver {
    /// Create a resolver over the shared zone store and the backend port.
    #[must_use]
    pub fn new(zones: Arc<ZoneStore>, port: Arc<dyn ResolverPort>) -> Self {
        Self { zones, port }
    }

    /// The shared zone polygons.
    #[must_use]
    pub fn zones(&self) -> &Arc<ZoneStore> {
        &self.zones
    }

    /// Resolve one ticket issued by the capture machine.
    ///
    /// Zone delivery requires coordinates and short-circuits to a local
    /// rejection when no polygon contains them; pickup and free shipping go
    /// straight to the server. `min_order_met` is evaluated against
    /// `basket_total` on the way out.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] only for transport-level failures.
    pub async fn resolve(
        &self,
        ticket: &ResolveTicket,
        basket_total: Decimal,
    ) -> Result<ResolutionResult, ResolveError> {
        let mut request = ResolveRequest {
            coordinates: ticket.coordinates,
            address: ticket.address.clone(),
            method: ticket.method,
            zone_hint: None,
            basket_total,
        };

        let mut result = match ticket.method {
            ShippingMethod::SelfPickup | ShippingMethod::FreeShipping => {
                self.port.resolve(&request).await?
            }
            ShippingMethod::ZoneDelivery => {
                let Some(coordinates) = ticket.coordinates else {
                    return Ok(ResolutionResult::rejected(MSG_NO_ADDRESS));
                };
                match self.zones.locate(coordinates) {
                    None => {
                        tracing::debug!(%coordinates, "point outside every zone, skipping server call");
                        return Ok(ResolutionResult::rejected(MSG_OUT_OF_ZONE));
                    }
                    Some(zone) => {
                        request.zone_hint = Some(zone.id);
                        self.port.resolve(&request).await?
                    }
                }
            }
        };

        result.min_order_met = result
            .min_order
            .is_none_or(|min_order| basket_total >= min_order);
        Ok(result)
    }
}
