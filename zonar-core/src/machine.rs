//! Address capture state machine.
//!
//! Owns the single mutable [`AddressSlot`] and every transition between
//! `Empty → Editing → Suggested → Capturing → Resolved | Rejected`. Handlers
//! are reducers: an event mutates the machine and returns the side effects the
//! driver must perform (fetch suggestions, issue a resolution, move the
//! placemark, revalidate the checkout form).
//!
//! Every resolution request carries a monotonically increasing token; a
//! response is applied only when its token is still the latest one issued,
//! so a stale response can never overwrite a newer capture.

use crate::model::{
    AddressSlot, Candidate, CandidateLocation, Coordinates, Located, Precision, ResolutionResult,
    ShippingMethod, ZoneId,
};
use crate::ports::ResolveError;

/// Hint shown when a suggestion is street-level only.
pub const HINT_HOUSE_NUMBER: &str = "Уточните номер дома";
/// Hint shown when a suggestion is too ambiguous to geocode.
pub const HINT_CLARIFY_ADDRESS: &str = "Уточните адрес";
/// Hint shown when zone delivery is selected without a captured address.
pub const HINT_NEED_ADDRESS: &str = "Укажите адрес";
/// Hint shown when the resolution endpoint could not be reached.
pub const HINT_RESOLVE_FAILED: &str = "Не удалось получить время доставки";

/// Position of the capture flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing entered yet.
    Empty,
    /// Free typing; suggestions may be fetched.
    Editing,
    /// A non-empty suggestion list is on screen.
    Suggested,
    /// An address has been committed and its resolution is in flight.
    Capturing,
    /// Resolution succeeded; the slot is valid and priced.
    Resolved,
    /// Resolution rejected the address (or could not be completed).
    Rejected,
}

/// Sequence token attached to each resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolveToken(u64);

impl ResolveToken {
    #[cfg(test)]
    pub(crate) const fn test_token(value: u64) -> Self {
        Self(value)
    }
}

/// Everything the driver needs to issue one resolution call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveTicket {
    /// Token the eventual response must present.
    pub token: ResolveToken,
    /// Captured coordinates, when the address has been located.
    pub coordinates: Option<Coordinates>,
    /// Display address, when known.
    pub address: Option<String>,
    /// Shipping method at the time of issue.
    pub method: ShippingMethod,
}

/// Inputs the machine reacts to.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// The address field content changed (keystrokes, paste).
    TextChanged(String),
    /// A suggestion fetch completed.
    SuggestionsLoaded(Vec<Candidate>),
    /// The user picked a suggestion (keyboard or pointer).
    SuggestionChosen(Candidate),
    /// The geocoder resolved a chosen candidate into coordinates.
    CandidateLocated(Located),
    /// A geocoder call failed; the message is already user-readable.
    GeocodeFailed(String),
    /// Map click or placemark drag-end.
    MapPoint(Coordinates),
    /// Reverse geocoding of a pinned point completed.
    ReverseGeocoded(Located),
    /// Programmatic restore of a previously saved address.
    RestoreSaved {
        /// Saved display address.
        address: String,
        /// Saved coordinates.
        coordinates: Coordinates,
    },
    /// The shipping method changed.
    MethodChanged(ShippingMethod),
    /// Explicit "clear address" action.
    Clear,
}

/// Side effects the driver performs after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Drop the on-screen suggestion list.
    ClearSuggestions,
    /// Fetch suggestions for the query.
    FetchSuggestions {
        /// Current field content.
        query: String,
    },
    /// Geocode the chosen candidate (providers that return opaque handles).
    ResolveCandidate {
        /// The candidate to resolve.
        candidate: Candidate,
    },
    /// Issue a time/zone resolution call.
    Resolve(ResolveTicket),
    /// Reverse-geocode a pinned point into a display address.
    ReverseGeocode {
        /// The pinned coordinates.
        coordinates: Coordinates,
    },
    /// Show the placemark in its loading state at the point.
    PlacemarkLoading(Coordinates),
    /// Remove the placemark from the map.
    RemovePlacemark,
    /// Recompute checkout validity (`validate()` on the page).
    Revalidate,
    /// Refresh totals for the zone (`shippingCharge(zonaId)` on the page).
    ShippingCharge(Option<ZoneId>),
}

/// The state machine. One instance per checkout session.
#[derive(Debug)]
pub struct CaptureMachine {
    state: CaptureState,
    slot: AddressSlot,
    method: ShippingMethod,
    suggestions: Vec<Candidate>,
    hint: Option<String>,
    time_display: Option<String>,
    min_query_len: usize,
    next_token: u64,
    latest_token: Option<ResolveToken>,
}

impl CaptureMachine {
    /// Fresh machine with an empty slot.
    ///
    /// `min_query_len` is the provider's minimum query length before
    /// suggestions are fetched.
    #[must_use]
    pub fn new(method: ShippingMethod, min_query_len: usize) -> Self {
        Self {
            state: CaptureState::Empty,
            slot: AddressSlot::default(),
            method,
            suggestions: Vec::new(),
            hint: None,
            time_display: None,
            min_query_len,
            next_token: 0,
            latest_token: None,
        }
    }

    /// Current flow position.
    #[must_use]
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The address slot (read-only view; only events mutate it).
    #[must_use]
    pub fn slot(&self) -> &AddressSlot {
        &self.slot
    }

    /// Active shipping method.
    #[must_use]
    pub fn method(&self) -> ShippingMethod {
        self.method
    }

    /// Current suggestion list.
    #[must_use]
    pub fn suggestions(&self) -> &[Candidate] {
        &self.suggestions
    }

    /// Current hint line, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Current delivery/pickup time line; `None` means the display is inactive.
    #[must_use]
    pub fn time_display(&self) -> Option<&str> {
        self.time_display.as_deref()
    }

    /// Process one event and return the effects to perform.
    pub fn handle(&mut self, event: CaptureEvent) -> Vec<Effect> {
        let effects = match event {
            CaptureEvent::TextChanged(text) => self.on_text(text),
            CaptureEvent::SuggestionsLoaded(candidates) => self.on_suggestions(candidates),
            CaptureEvent::SuggestionChosen(candidate) => self.on_chosen(candidate),
            CaptureEvent::CandidateLocated(located) => self.on_located(located),
            CaptureEvent::GeocodeFailed(message) => self.on_geocode_failed(message),
            CaptureEvent::MapPoint(coordinates) => self.on_map_point(coordinates),
            CaptureEvent::ReverseGeocoded(located) => self.on_reverse(&located),
            CaptureEvent::RestoreSaved {
                address,
                coordinates,
            } => self.on_restore(address, coordinates),
            CaptureEvent::MethodChanged(method) => self.on_method(method),
            CaptureEvent::Clear => self.on_clear(),
        };
        debug_assert!(self.slot.invariant_holds(), "slot invariant violated");
        effects
    }

    /// Apply the outcome of a resolution call issued earlier.
    ///
    /// A token that is no longer the latest one means the response was
    /// superseded (or the address was cleared); it is discarded silently.
    pub fn apply_resolution(
        &mut self,
        token: ResolveToken,
        outcome: Result<ResolutionResult, ResolveError>,
    ) -> Vec<Effect> {
        if self.latest_token != Some(token) {
            tracing::debug!(?token, latest = ?self.latest_token, "discarding stale resolution");
            return Vec::new();
        }
        let effects = match outcome {
            Ok(result) => self.on_resolution(result),
            Err(error) => self.on_resolve_error(&error),
        };
        debug_assert!(self.slot.invariant_holds(), "slot invariant violated");
        effects
    }

    fn on_text(&mut self, text: String) -> Vec<Effect> {
        if self.slot.read_only {
            return Vec::new();
        }
        self.slot.raw_text.clone_from(&text);
        self.slot.captured = false;
        self.slot.valid = false;
        self.slot.coordinates = None;
        self.hint = None;
        self.time_display = None;

        if text.trim().is_empty() {
            self.state = CaptureState::Empty;
            self.suggestions.clear();
            return vec![Effect::ClearSuggestions, Effect::Revalidate];
        }

        self.state = CaptureState::Editing;
        if text.chars().count() >= self.min_query_len {
            vec![Effect::FetchSuggestions { query: text }, Effect::Revalidate]
        } else {
            self.suggestions.clear();
            vec![Effect::ClearSuggestions, Effect::Revalidate]
        }
    }

    fn on_suggestions(&mut self, candidates: Vec<Candidate>) -> Vec<Effect> {
        if !matches!(self.state, CaptureState::Editing | CaptureState::Suggested) {
            return Vec::new();
        }
        self.state = if candidates.is_empty() {
            CaptureState::Editing
        } else {
            CaptureState::Suggested
        };
        self.suggestions = candidates;
        Vec::new()
    }

    fn on_chosen(&mut self, candidate: Candidate) -> Vec<Effect> {
        if self.slot.read_only {
            return Vec::new();
        }
        match candidate.precision {
            Precision::Approximate => {
                self.hint = Some(String::from(HINT_HOUSE_NUMBER));
                self.state = CaptureState::Editing;
                Vec::new()
            }
            Precision::Ambiguous => {
                self.hint = Some(String::from(HINT_CLARIFY_ADDRESS));
                self.state = CaptureState::Editing;
                Vec::new()
            }
            Precision::Exact => {
                self.slot.raw_text.clone_from(&candidate.label);
                match candidate.location {
                    CandidateLocation::Point(coordinates) => self.capture(coordinates),
                    CandidateLocation::Handle(_) => {
                        // Optimistic lock while the second geocoding step runs.
                        self.slot.captured = true;
                        self.slot.read_only = true;
                        self.slot.valid = false;
                        self.state = CaptureState::Capturing;
                        self.suggestions.clear();
                        vec![Effect::ClearSuggestions, Effect::ResolveCandidate { candidate }]
                    }
                }
            }
        }
    }

    fn on_located(&mut self, located: Located) -> Vec<Effect> {
        if self.state != CaptureState::Capturing {
            return Vec::new();
        }
        if located.precision != Precision::Exact {
            self.slot.captured = false;
            self.slot.read_only = false;
            self.state = CaptureState::Editing;
            self.hint = Some(String::from(HINT_HOUSE_NUMBER));
            return vec![Effect::Revalidate];
        }
        self.slot.raw_text.clone_from(&located.address_line);
        self.capture(located.coordinates)
    }

    fn on_geocode_failed(&mut self, message: String) -> Vec<Effect> {
        self.hint = Some(message);
        if self.state == CaptureState::Capturing && !self.slot.valid {
            // Unlock so the user can retry; the capture never completed.
            self.slot.captured = false;
            self.slot.read_only = false;
            self.state = CaptureState::Editing;
            return vec![Effect::Revalidate];
        }
        Vec::new()
    }

    fn on_map_point(&mut self, coordinates: Coordinates) -> Vec<Effect> {
        if self.method == ShippingMethod::SelfPickup {
            return Vec::new();
        }
        // Whatever was typed does not describe the pinned point; the display
        // line comes from reverse geocoding (or the server's echo).
        self.slot.raw_text.clear();
        let mut effects = vec![Effect::ReverseGeocode { coordinates }];
        effects.extend(self.capture(coordinates));
        effects
    }

    fn on_reverse(&mut self, located: &Located) -> Vec<Effect> {
        if !self.slot.captured {
            return Vec::new();
        }
        self.slot.raw_text.clone_from(&located.address_line);
        vec![Effect::Revalidate]
    }

    fn on_restore(&mut self, address: String, coordinates: Coordinates) -> Vec<Effect> {
        self.slot.raw_text = address;
        self.capture(coordinates)
    }

    fn on_method(&mut self, method: ShippingMethod) -> Vec<Effect> {
        self.method = method;
        self.time_display = None;
        match method {
            ShippingMethod::SelfPickup => {
                self.hint = None;
                let ticket = self.issue(None, None);
                vec![
                    Effect::Resolve(ticket),
                    Effect::ShippingCharge(None),
                    Effect::Revalidate,
                ]
            }
            ShippingMethod::ZoneDelivery => {
                if let Some(coordinates) = self.slot.coordinates.filter(|_| self.slot.captured) {
                    let ticket = self.issue(Some(coordinates), self.captured_address());
                    vec![
                        Effect::Resolve(ticket),
                        Effect::ShippingCharge(None),
                        Effect::Revalidate,
                    ]
                } else {
                    self.hint = Some(String::from(HINT_NEED_ADDRESS));
                    vec![Effect::ShippingCharge(None), Effect::Revalidate]
                }
            }
            ShippingMethod::FreeShipping => {
                self.hint = None;
                let coordinates = self.slot.coordinates.filter(|_| self.slot.captured);
                let address = self.captured_address();
                let ticket = self.issue(coordinates, address);
                vec![
                    Effect::Resolve(ticket),
                    Effect::ShippingCharge(None),
                    Effect::Revalidate,
                ]
            }
        }
    }

    fn on_clear(&mut self) -> Vec<Effect> {
        // Any in-flight resolution for the cleared address becomes a no-op.
        self.latest_token = None;
        self.slot.reset();
        self.suggestions.clear();
        self.hint = None;
        self.time_display = None;
        self.state = CaptureState::Empty;
        vec![
            Effect::RemovePlacemark,
            Effect::ClearSuggestions,
            Effect::ShippingCharge(None),
            Effect::Revalidate,
        ]
    }

    fn on_resolution(&mut self, result: ResolutionResult) -> Vec<Effect> {
        if self.method == ShippingMethod::SelfPickup {
            // Pickup never touches the address slot, valid or rejected.
            self.time_display.clone_from(&result.time_text);
            self.hint = None;
            return vec![Effect::Revalidate];
        }

        if result.is_rejection(self.method) {
            let message = result
                .error
                .clone()
                .unwrap_or_else(|| String::from(crate::resolver::MSG_OUT_OF_ZONE));
            self.slot.valid = false;
            // A rejected address is re-editable without an explicit clear.
            self.slot.read_only = false;
            self.state = CaptureState::Rejected;
            self.time_display = None;
            self.hint = Some(message);
            return vec![Effect::Revalidate];
        }

        if self.slot.captured {
            if let Some(coordinates) = result.coordinates {
                self.slot.coordinates = Some(coordinates);
            }
            if let Some(address) = &result.address {
                self.slot.raw_text.clone_from(address);
            }
        }
        if self.slot.captured && self.slot.coordinates.is_some() {
            self.slot.valid = true;
            self.state = CaptureState::Resolved;
            self.hint = None;
            self.time_display.clone_from(&result.time_text);
            vec![Effect::ShippingCharge(Some(result.zone_id)), Effect::Revalidate]
        } else {
            // Display-only estimate (free shipping without a captured address).
            self.hint = None;
            self.time_display.clone_from(&result.time_text);
            vec![Effect::Revalidate]
        }
    }

    fn on_resolve_error(&mut self, error: &ResolveError) -> Vec<Effect> {
        tracing::warn!(error = %error, "time/zone resolution failed");
        self.time_display = None;
        self.hint = Some(String::from(HINT_RESOLVE_FAILED));
        if self.method == ShippingMethod::SelfPickup {
            return vec![Effect::Revalidate];
        }
        // `valid` keeps its prior value; an unresolved capture becomes
        // retriable by unlocking the field.
        if !self.slot.valid && self.slot.captured {
            self.slot.read_only = false;
            self.state = CaptureState::Rejected;
        }
        vec![Effect::Revalidate]
    }

    fn capture(&mut self, coordinates: Coordinates) -> Vec<Effect> {
        self.slot.captured = true;
        self.slot.read_only = true;
        self.slot.valid = false;
        self.slot.coordinates = Some(coordinates);
        self.suggestions.clear();
        self.hint = None;
        self.time_display = None;
        self.state = CaptureState::Capturing;
        let ticket = self.issue(Some(coordinates), self.captured_address());
        vec![
            Effect::ClearSuggestions,
            Effect::PlacemarkLoading(coordinates),
            Effect::Resolve(ticket),
            Effect::Revalidate,
        ]
    }

    fn captured_address(&self) -> Option<String> {
        let trimmed = self.slot.raw_text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }

    fn issue(&mut self, coordinates: Option<Coordinates>, address: Option<String>) -> ResolveTicket {
        self.next_token += 1;
        let token = ResolveToken(self.next_token);
        self.latest_token = Some(token);
        ResolveTicket {
            token,
            coordinates,
            address,
            method: self.method,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::resolver::MSG_OUT_OF_ZONE;

    fn machine() -> CaptureMachine {
        CaptureMachine::new(ShippingMethod::ZoneDelivery, 3)
    }

    fn exact(label: &str, lat: f64, lon: f64) -> Candidate {
        Candidate {
            label: String::from(label),
            precision: Precision::Exact,
            location: CandidateLocation::Point(Coordinates::new(lat, lon)),
        }
    }

    fn accepted(zone: u32, minutes: u32) -> ResolutionResult {
        ResolutionResult {
            error: None,
            zone_id: ZoneId(zone),
            minutes: Some(minutes),
            min_order: Some(Decimal::from(700)),
            min_order_met: true,
            time_text: Some(format!("Доставим через {minutes} мин.")),
            time_utc: None,
            address: Some(String::from("Ленина 112")),
            coordinates: Some(Coordinates::new(56.01, 92.88)),
        }
    }

    fn ticket_of(effects: &[Effect]) -> ResolveTicket {
        effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Resolve(ticket) => Some(ticket.clone()),
                _ => None,
            })
            .expect("resolve effect")
    }

    #[test]
    fn short_input_clears_suggestions_instead_of_fetching() {
        let mut capture = machine();
        let effects = capture.handle(CaptureEvent::TextChanged(String::from("Ле")));
        assert!(effects.contains(&Effect::ClearSuggestions));
        assert!(
            !effects
                .iter()
                .any(|effect| matches!(effect, Effect::FetchSuggestions { .. }))
        );
        assert_eq!(capture.state(), CaptureState::Editing);
    }

    #[test]
    fn threshold_input_fetches_suggestions() {
        let mut capture = machine();
        let effects = capture.handle(CaptureEvent::TextChanged(String::from("Лен")));
        assert!(effects.iter().any(
            |effect| matches!(effect, Effect::FetchSuggestions { query } if query == "Лен")
        ));
    }

    #[test]
    fn street_precision_never_triggers_resolution() {
        let mut capture = machine();
        capture.handle(CaptureEvent::TextChanged(String::from("Ленина")));
        let effects = capture.handle(CaptureEvent::SuggestionChosen(Candidate {
            label: String::from("улица Ленина"),
            precision: Precision::Approximate,
            location: CandidateLocation::Handle(String::from("street-1")),
        }));
        assert!(effects.is_empty());
        assert_eq!(capture.state(), CaptureState::Editing);
        assert_eq!(capture.hint(), Some(HINT_HOUSE_NUMBER));
        assert!(!capture.slot().captured);
    }

    #[test]
    fn exact_suggestion_captures_and_issues_resolution() {
        let mut capture = machine();
        capture.handle(CaptureEvent::TextChanged(String::from("Ленина 112")));
        let effects =
            capture.handle(CaptureEvent::SuggestionChosen(exact("Ленина 112", 56.01, 92.88)));
        let ticket = ticket_of(&effects);
        assert_eq!(ticket.method, ShippingMethod::ZoneDelivery);
        assert_eq!(ticket.coordinates, Some(Coordinates::new(56.01, 92.88)));
        assert_eq!(capture.state(), CaptureState::Capturing);
        assert!(capture.slot().captured);
        assert!(capture.slot().read_only);
        assert!(!capture.slot().valid);
    }

    #[test]
    fn resolution_success_marks_the_slot_valid() {
        let mut capture = machine();
        let effects =
            capture.handle(CaptureEvent::SuggestionChosen(exact("Ленина 112", 56.01, 92.88)));
        let ticket = ticket_of(&effects);
        let effects = capture.apply_resolution(ticket.token, Ok(accepted(2, 35)));
        assert!(effects.contains(&Effect::ShippingCharge(Some(ZoneId(2)))));
        assert_eq!(capture.state(), CaptureState::Resolved);
        assert!(capture.slot().valid);
        assert!(capture.slot().invariant_holds());
        assert_eq!(capture.time_display(), Some("Доставим через 35 мин."));
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let mut capture = machine();
        let first = ticket_of(&capture.handle(CaptureEvent::SuggestionChosen(exact(
            "Street X", 56.01, 92.88,
        ))));
        let second = ticket_of(&capture.handle(CaptureEvent::MapPoint(Coordinates::new(
            56.02, 92.90,
        ))));
        assert!(first.token < second.token);

        // Second request resolves first.
        capture.apply_resolution(second.token, Ok(accepted(2, 25)));
        // The older response arrives late and must be a no-op.
        let effects = capture.apply_resolution(first.token, Ok(accepted(1, 55)));
        assert!(effects.is_empty());
        assert_eq!(capture.time_display(), Some("Доставим через 25 мин."));
        assert!(capture.slot().valid);
    }

    #[test]
    fn rejection_clears_the_time_display_and_unlocks_the_field() {
        let mut capture = machine();
        let ticket =
            ticket_of(&capture.handle(CaptureEvent::MapPoint(Coordinates::new(55.0, 90.0))));
        let effects = capture.apply_resolution(
            ticket.token,
            Ok(ResolutionResult::rejected(MSG_OUT_OF_ZONE)),
        );
        assert!(effects.contains(&Effect::Revalidate));
        assert_eq!(capture.state(), CaptureState::Rejected);
        assert!(!capture.slot().valid);
        assert!(!capture.slot().read_only);
        assert_eq!(capture.hint(), Some(MSG_OUT_OF_ZONE));
        assert!(capture.time_display().is_none());
    }

    #[test]
    fn zone_unavailable_message_rejects_despite_a_zone_id() {
        let mut capture = machine();
        let ticket =
            ticket_of(&capture.handle(CaptureEvent::MapPoint(Coordinates::new(56.01, 92.88))));
        // The point sits in a known zone, but delivery there is suspended.
        let unavailable = ResolutionResult {
            error: Some(String::from("Временно не доставляем")),
            zone_id: ZoneId(5),
            minutes: None,
            min_order: Some(Decimal::from(700)),
            min_order_met: false,
            time_text: None,
            time_utc: None,
            address: None,
            coordinates: None,
        };
        let effects = capture.apply_resolution(ticket.token, Ok(unavailable));
        assert!(effects.contains(&Effect::Revalidate));
        assert_eq!(capture.state(), CaptureState::Rejected);
        assert!(!capture.slot().valid);
        assert!(!capture.slot().read_only);
        assert_eq!(capture.hint(), Some("Временно не доставляем"));

        let validity = crate::checkout::evaluate(
            capture.slot(),
            capture.method(),
            crate::checkout::CheckoutFields {
                flat: "12",
                entrance: "1",
                floor: "5",
            },
            true,
        );
        assert!(!validity.submit_enabled());
    }

    #[test]
    fn map_pin_drops_stale_text_and_requests_reverse_geocoding() {
        let mut capture = machine();
        capture.handle(CaptureEvent::TextChanged(String::from("Ленина")));
        let point = Coordinates::new(56.01, 92.88);
        let effects = capture.handle(CaptureEvent::MapPoint(point));
        assert!(effects.contains(&Effect::ReverseGeocode { coordinates: point }));
        let ticket = ticket_of(&effects);
        assert!(
            ticket.address.is_none(),
            "typed text must not ride along with the pin"
        );

        capture.handle(CaptureEvent::ReverseGeocoded(Located {
            address_line: String::from("Красноярск, Мира, 45"),
            coordinates: point,
            precision: Precision::Exact,
        }));
        assert_eq!(capture.slot().raw_text, "Красноярск, Мира, 45");
        assert_eq!(capture.state(), CaptureState::Capturing);
        assert!(capture.slot().invariant_holds());
    }

    #[test]
    fn transport_error_leaves_valid_untouched() {
        let mut capture = machine();
        let first = ticket_of(&capture.handle(CaptureEvent::MapPoint(Coordinates::new(
            56.01, 92.88,
        ))));
        capture.apply_resolution(first.token, Ok(accepted(1, 30)));
        assert!(capture.slot().valid);

        // A later refresh fails at the transport level.
        let second = ticket_of(&capture.handle(CaptureEvent::MethodChanged(
            ShippingMethod::ZoneDelivery,
        )));
        capture.apply_resolution(
            second.token,
            Err(ResolveError::Malformed(String::from("bad payload"))),
        );
        assert!(capture.slot().valid, "transport failure must not flip valid");
        assert!(capture.time_display().is_none());
        assert_eq!(capture.state(), CaptureState::Resolved);
    }

    #[test]
    fn clear_is_idempotent_and_removes_the_placemark() {
        let mut capture = machine();
        capture.handle(CaptureEvent::MapPoint(Coordinates::new(56.01, 92.88)));
        let first = capture.handle(CaptureEvent::Clear);
        let second = capture.handle(CaptureEvent::Clear);
        for effects in [first, second] {
            assert!(effects.contains(&Effect::RemovePlacemark));
        }
        assert_eq!(capture.state(), CaptureState::Empty);
        assert_eq!(capture.slot(), &AddressSlot::default());
        assert!(capture.hint().is_none());
    }

    #[test]
    fn clear_invalidates_in_flight_resolutions() {
        let mut capture = machine();
        let ticket =
            ticket_of(&capture.handle(CaptureEvent::MapPoint(Coordinates::new(56.01, 92.88))));
        capture.handle(CaptureEvent::Clear);
        let effects = capture.apply_resolution(ticket.token, Ok(accepted(1, 30)));
        assert!(effects.is_empty());
        assert_eq!(capture.state(), CaptureState::Empty);
        assert!(!capture.slot().valid);
    }

    #[test]
    fn pickup_never_carries_an_address_and_ignores_prior_rejection() {
        let mut capture = machine();
        // Reject a delivery address first.
        let ticket =
            ticket_of(&capture.handle(CaptureEvent::MapPoint(Coordinates::new(55.0, 90.0))));
        capture.apply_resolution(
            ticket.token,
            Ok(ResolutionResult::rejected(MSG_OUT_OF_ZONE)),
        );

        let ticket = ticket_of(&capture.handle(CaptureEvent::MethodChanged(
            ShippingMethod::SelfPickup,
        )));
        assert!(ticket.coordinates.is_none());
        assert!(ticket.address.is_none());

        let pickup = ResolutionResult {
            error: None,
            zone_id: ZoneId::NONE,
            minutes: Some(40),
            min_order: None,
            min_order_met: true,
            time_text: Some(String::from("Самовывоз через 40 мин.")),
            time_utc: None,
            address: None,
            coordinates: None,
        };
        capture.apply_resolution(ticket.token, Ok(pickup));
        assert_eq!(capture.time_display(), Some("Самовывоз через 40 мин."));
        // The rejected delivery slot is untouched.
        assert!(!capture.slot().valid);
        assert!(capture.slot().invariant_holds());
    }

    #[test]
    fn text_edits_are_ignored_while_locked() {
        let mut capture = machine();
        capture.handle(CaptureEvent::SuggestionChosen(exact("Ленина 112", 56.01, 92.88)));
        let effects = capture.handle(CaptureEvent::TextChanged(String::from("Мира 5")));
        assert!(effects.is_empty());
        assert_eq!(capture.slot().raw_text, "Ленина 112");
    }
}
