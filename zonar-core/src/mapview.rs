//! Placemark and balloon view model for the delivery map.
//!
//! Purely a view on the capture machine: it never decides anything, it only
//! renders resolution outcomes and converts user gestures (click, drag-end)
//! back into capture events.

use rust_decimal::Decimal;

use crate::machine::CaptureEvent;
use crate::model::{Coordinates, ResolutionResult, ShippingMethod};
use crate::ports::ProviderMeta;
use crate::resolver::MSG_OUT_OF_ZONE;

/// Content of the placemark balloon.
#[derive(Debug, Clone, PartialEq)]
pub enum Balloon {
    /// Resolution in flight; spinner territory.
    Loading,
    /// Priced and timed summary for an in-zone address.
    Summary {
        /// Time line, e.g. "~ 35 мин.".
        minutes_text: String,
        /// Minimum order for the zone.
        min_order: Option<Decimal>,
    },
    /// Rejection or provider error message.
    Error(String),
}

/// The single placemark on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    /// Where the pin sits.
    pub coordinates: Coordinates,
    /// What the balloon shows.
    pub balloon: Balloon,
}

/// Map state owned by the view layer.
#[derive(Debug, Clone)]
pub struct MapBinding {
    center: Coordinates,
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    placemark: Option<Placemark>,
}

impl MapBinding {
    /// Default zoom the map opens at.
    pub const INITIAL_ZOOM: u8 = 12;

    /// Bind a map to the provider's center and zoom range.
    #[must_use]
    pub fn new(meta: &ProviderMeta) -> Self {
        Self {
            center: meta.center,
            zoom: Self::INITIAL_ZOOM.clamp(meta.min_zoom, meta.max_zoom),
            min_zoom: meta.min_zoom,
            max_zoom: meta.max_zoom,
            placemark: None,
        }
    }

    /// Current map center.
    #[must_use]
    pub fn center(&self) -> Coordinates {
        self.center
    }

    /// Current zoom level.
    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Current placemark, if one is shown.
    #[must_use]
    pub fn placemark(&self) -> Option<&Placemark> {
        self.placemark.as_ref()
    }

    /// Zoom in by one step, clamped to the provider range.
    pub fn zoom_in(&mut self) {
        self.zoom = self.zoom.saturating_add(1).min(self.max_zoom);
    }

    /// Zoom out by one step, clamped to the provider range.
    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(self.min_zoom);
    }

    /// Show (or move) the placemark in its loading state and center on it.
    pub fn set_loading(&mut self, coordinates: Coordinates) {
        self.center = coordinates;
        self.placemark = Some(Placemark {
            coordinates,
            balloon: Balloon::Loading,
        });
    }

    /// Render a resolution outcome into the balloon.
    ///
    /// Does nothing when no placemark is shown (pickup flows have no pin).
    pub fn apply_result(&mut self, result: &ResolutionResult, method: ShippingMethod) {
        let Some(placemark) = self.placemark.as_mut() else {
            return;
        };
        if let Some(coordinates) = result.coordinates {
            placemark.coordinates = coordinates;
        }
        placemark.balloon = if result.is_rejection(method) {
            Balloon::Error(
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| String::from(MSG_OUT_OF_ZONE)),
            )
        } else {
            Balloon::Summary {
                minutes_text: result
                    .minutes
                    .map_or_else(
                        || result.time_text.clone().unwrap_or_default(),
                        |minutes| format!("~ {minutes} мин."),
                    ),
                min_order: result.min_order,
            }
        };
    }

    /// Remove the placemark and re-center the map.
    pub fn remove_placemark(&mut self, home: Coordinates) {
        self.placemark = None;
        self.center = home;
        self.zoom = Self::INITIAL_ZOOM.clamp(self.min_zoom, self.max_zoom);
    }

    /// Convert a map click into the machine event it feeds.
    #[must_use]
    pub fn click(&self, coordinates: Coordinates) -> CaptureEvent {
        CaptureEvent::MapPoint(coordinates)
    }

    /// Convert a placemark drag-end into the machine event it feeds.
    #[must_use]
    pub fn drag_end(&self, coordinates: Coordinates) -> CaptureEvent {
        CaptureEvent::MapPoint(coordinates)
    }
}
