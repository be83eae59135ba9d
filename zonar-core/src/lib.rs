//! Core types and service wiring for the zonar delivery-address resolver.

/// Checkout validity aggregation for the order form.
pub mod checkout;
/// Address capture state machine and its effects.
pub mod machine;
/// Placemark/balloon view model for the delivery map.
pub mod mapview;
/// Domain models shared by all providers.
pub mod model;
/// Registry and helpers for plugging geocoding providers into the service.
pub mod plugin;
/// Traits describing the provider and backend interfaces.
pub mod ports;
/// Shipping-method branching around the time/zone resolution call.
pub mod resolver;
/// High-level service facade used by clients.
pub mod service;
/// Delivery zone polygons and containment queries.
pub mod zones;

pub use checkout::*;
pub use machine::*;
pub use mapview::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use resolver::*;
pub use service::*;
pub use zones::*;
