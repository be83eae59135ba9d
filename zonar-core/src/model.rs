//! Domain data structures for addresses, shipping methods, and resolution results.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Geographic point, latitude first (the order used on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinates {
    /// Construct a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Wire format used by the resolution endpoint: `"lat,lon"`.
    #[must_use]
    pub fn to_wire(self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    /// Parse the `"lat,lon"` wire format. Returns `None` on any malformed input.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        let mut parts = raw.split(',');
        let lat = parts.next()?.trim().parse().ok()?;
        let lon = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { lat, lon })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{}", self.lat, self.lon)
    }
}

/// Geocoder confidence that a candidate identifies an exact building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// House-level hit; safe to capture.
    Exact,
    /// Street, house-number range, or nearby hit; the user must narrow it down.
    Approximate,
    /// Provider could not classify the hit.
    Ambiguous,
}

/// Identifier for a registered geocoding provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Where a suggestion points: some providers return coordinates directly,
/// others hand back an opaque id that must be geocoded in a second step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CandidateLocation {
    /// Direct coordinates.
    Point(Coordinates),
    /// Provider-specific handle for a follow-up geocoding call.
    Handle(String),
}

/// One entry of a suggestion list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Display address shown in the suggestion list.
    pub label: String,
    /// Confidence bucket reported by the provider.
    pub precision: Precision,
    /// Coordinates or an opaque geocoding handle.
    pub location: CandidateLocation,
}

/// A fully geocoded address: display line plus coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Located {
    /// Normalized display address.
    pub address_line: String,
    /// Resolved coordinates.
    pub coordinates: Coordinates,
    /// Confidence of the geocoding hit.
    pub precision: Precision,
}

/// Shipping methods understood by the resolution endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShippingMethod {
    /// Courier delivery priced and timed per zone; requires an address.
    ZoneDelivery,
    /// Customer picks the order up; no address involved.
    SelfPickup,
    /// Flat free shipping; skips the zone lookup, address is display-only.
    FreeShipping,
}

impl ShippingMethod {
    /// Wire code sent as the `shipping_method` form field.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            ShippingMethod::ZoneDelivery => "zona-shipping",
            ShippingMethod::SelfPickup => "self-pick-up",
            ShippingMethod::FreeShipping => "free-shipping",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.code())
    }
}

/// Delivery zone number. Zero means "no containing zone" (or pickup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// The "no zone" sentinel used throughout the wire protocol.
    pub const NONE: ZoneId = ZoneId(0);

    /// True when this is the "no zone" sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The single source of truth for the address currently being evaluated.
///
/// Invariant: `valid` implies `captured` and `coordinates.is_some()`, and
/// `!captured` implies `!valid`. Only the capture machine mutates a slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressSlot {
    /// User-typed or provider-returned display address.
    pub raw_text: String,
    /// Coordinates once the address has been located.
    pub coordinates: Option<Coordinates>,
    /// True once an address has been committed (suggestion, map point, restore).
    pub captured: bool,
    /// True only after a successful zone+time resolution.
    pub valid: bool,
    /// The text field is locked while a captured address is being evaluated.
    pub read_only: bool,
}

impl AddressSlot {
    /// Reset every field back to the empty state.
    pub fn reset(&mut self) {
        *self = AddressSlot::default();
    }

    /// Check the slot invariant; used by tests and debug assertions.
    #[must_use]
    pub fn invariant_holds(&self) -> bool {
        if self.valid && !(self.captured && self.coordinates.is_some()) {
            return false;
        }
        !(!self.captured && self.valid)
    }
}

/// Outcome of one time/zone resolution call. Ephemeral: each new request
/// supersedes the previous result regardless of arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    /// In-band rejection message (out of zone, zone unavailable, no address).
    pub error: Option<String>,
    /// Authoritative zone, `ZoneId::NONE` for rejections and pickup.
    pub zone_id: ZoneId,
    /// Delivery or pickup estimate in minutes, when the server gave a number.
    pub minutes: Option<u32>,
    /// Minimum order amount for the zone.
    pub min_order: Option<Decimal>,
    /// Whether the basket total meets the zone minimum.
    pub min_order_met: bool,
    /// Display line for the delivery-time panel.
    pub time_text: Option<String>,
    /// Server timestamp for the order-time field, when present.
    pub time_utc: Option<NaiveDateTime>,
    /// Normalized display address returned by the server.
    pub address: Option<String>,
    /// Normalized coordinates returned by the server.
    pub coordinates: Option<Coordinates>,
}

impl ResolutionResult {
    /// A rejection produced without (or by) the server: no zone, just a message.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            zone_id: ZoneId::NONE,
            minutes: None,
            min_order: None,
            min_order_met: false,
            time_text: None,
            time_utc: None,
            address: None,
            coordinates: None,
        }
    }

    /// True when the result carries an in-band rejection or no covering zone.
    ///
    /// Pickup and free shipping legitimately come back with `ZoneId::NONE`,
    /// so the zone check only applies to zone delivery.
    #[must_use]
    pub fn is_rejection(&self, method: ShippingMethod) -> bool {
        self.error.is_some()
            || (method == ShippingMethod::ZoneDelivery && self.zone_id.is_none())
    }
}

/// Checkout form fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutField {
    /// The address line itself.
    Address,
    /// Flat/apartment number.
    Flat,
    /// Entrance number.
    Entrance,
    /// Floor number.
    Floor,
}

/// Derived validity of the checkout form; recomputed on every relevant change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutValidity {
    /// Address captured, resolved, and every address field within bounds.
    pub address_valid: bool,
    /// Basket total meets the zone minimum.
    pub amount_valid: bool,
    /// Fields currently failing validation.
    pub field_errors: BTreeSet<CheckoutField>,
}

impl CheckoutValidity {
    /// The submit control is enabled only when everything else passes.
    #[must_use]
    pub fn submit_enabled(&self) -> bool {
        self.address_valid && self.amount_valid && self.field_errors.is_empty()
    }

    /// The error panel mirrors the submit gate.
    #[must_use]
    pub fn errors_shown(&self) -> bool {
        !self.submit_enabled()
    }
}
