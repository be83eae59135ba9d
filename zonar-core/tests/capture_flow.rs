//! End-to-end capture flow tests with mock provider and backend ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time::sleep;

use zonar_core::{
    Candidate, CandidateLocation, CaptureEvent, CaptureMachine, CaptureState, CheckoutFields,
    Coordinates, DeliveryResolver, Effect, GeocodeError, GeocoderPlugin, GeocoderPort, Located,
    Precision, ProviderId, ProviderMeta, ProviderRegistry, ResolutionResult, ResolveError,
    ResolveRequest, ResolveTicket, ResolverPort, ShippingMethod, ZonarService, ZoneCollection,
    ZoneFeature, ZoneGeometry, ZoneId, ZoneProperties, ZoneStore, checkout,
};

fn test_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from("mock")),
        name: String::from("Mock maps"),
        min_query_len: 3,
        center: Coordinates::new(56.008331, 92.878786),
        min_zoom: 10,
        max_zoom: 18,
    }
}

struct MockGeocoder {
    meta: ProviderMeta,
    calls: AtomicUsize,
}

impl MockGeocoder {
    fn new() -> Self {
        Self {
            meta: test_meta(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GeocoderPort for MockGeocoder {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn suggest(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let candidates = vec![Candidate {
            label: format!("{text}, Красноярск"),
            precision: Precision::Exact,
            location: CandidateLocation::Point(Coordinates::new(56.05, 92.85)),
        }];
        Ok(candidates.into_iter().take(limit).collect())
    }

    async fn resolve_candidate(&self, candidate: &Candidate) -> Result<Located, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &candidate.location {
            CandidateLocation::Point(coordinates) => Ok(Located {
                address_line: candidate.label.clone(),
                coordinates: *coordinates,
                precision: candidate.precision,
            }),
            CandidateLocation::Handle(_) => Err(GeocodeError::NotFound),
        }
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Located, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Located {
            address_line: String::from("Ленина 112, Красноярск"),
            coordinates,
            precision: Precision::Exact,
        })
    }
}

/// Backend mock: accepts everything inside the zone hint, applies an optional
/// per-request delay keyed by the request address.
struct MockBackend {
    delays: Mutex<Vec<(String, Duration)>>,
    requests: Mutex<Vec<ResolveRequest>>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn delay(&self, address: &str, delay: Duration) {
        self.delays
            .lock()
            .expect("delays poisoned")
            .push((String::from(address), delay));
    }
}

#[async_trait]
impl ResolverPort for MockBackend {
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolutionResult, ResolveError> {
        self.requests
            .lock()
            .expect("requests poisoned")
            .push(request.clone());
        let delay = {
            let delays = self.delays.lock().expect("delays poisoned");
            request.address.as_ref().and_then(|address| {
                delays
                    .iter()
                    .find(|(key, _)| key == address)
                    .map(|(_, delay)| *delay)
            })
        };
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        if request.method == ShippingMethod::SelfPickup {
            return Ok(ResolutionResult {
                error: None,
                zone_id: ZoneId::NONE,
                minutes: Some(40),
                min_order: None,
                min_order_met: true,
                time_text: Some(String::from("Самовывоз через 40 мин.")),
                time_utc: None,
                address: None,
                coordinates: None,
            });
        }
        Ok(ResolutionResult {
            error: None,
            zone_id: request.zone_hint.unwrap_or(ZoneId(1)),
            minutes: Some(35),
            min_order: Some(Decimal::from(700)),
            min_order_met: false,
            time_text: Some(String::from("Доставим через 35 мин.")),
            time_utc: None,
            address: request.address.clone(),
            coordinates: request.coordinates,
        })
    }
}

fn city_zone() -> ZoneStore {
    ZoneStore::new(ZoneCollection {
        features: vec![ZoneFeature {
            properties: ZoneProperties {
                number: 1,
                available: true,
            },
            geometry: ZoneGeometry {
                kind: String::from("Polygon"),
                coordinates: vec![vec![
                    [55.9, 92.6],
                    [56.2, 92.6],
                    [56.2, 93.2],
                    [55.9, 93.2],
                    [55.9, 92.6],
                ]],
            },
        }],
    })
}

fn service(backend: Arc<MockBackend>, geocoder: Arc<MockGeocoder>) -> ZonarService {
    let registry = Arc::new(ProviderRegistry::new(vec![GeocoderPlugin {
        meta: test_meta(),
        geocoder,
    }]));
    let resolver = DeliveryResolver::new(Arc::new(city_zone()), backend);
    ZonarService::new(registry, resolver)
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

#[tokio::test]
async fn typed_address_flows_to_an_enabled_submit() {
    let backend = Arc::new(MockBackend::new());
    let geocoder = Arc::new(MockGeocoder::new());
    let service = service(Arc::clone(&backend), Arc::clone(&geocoder));
    let provider = ProviderId(String::from("mock"));
    let mut machine = CaptureMachine::new(ShippingMethod::ZoneDelivery, 3);

    let effects = machine.handle(CaptureEvent::TextChanged(String::from("Ленина 112")));
    let query = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchSuggestions { query } => Some(query.clone()),
            _ => None,
        })
        .expect("suggestion fetch");

    let candidates = service.suggest(&provider, &query, 10).await.expect("suggest");
    machine.handle(CaptureEvent::SuggestionsLoaded(candidates.clone()));
    assert_eq!(machine.state(), CaptureState::Suggested);

    let chosen = candidates.first().expect("candidate").clone();
    let effects = machine.handle(CaptureEvent::SuggestionChosen(chosen));
    let ticket = ticket_of(&effects);

    let outcome = service.resolve(&ticket, Decimal::from(1200)).await;
    machine.apply_resolution(ticket.token, outcome);

    assert_eq!(machine.state(), CaptureState::Resolved);
    assert!(machine.slot().valid);

    let validity = checkout::evaluate(
        machine.slot(),
        machine.method(),
        CheckoutFields {
            flat: "12",
            entrance: "1",
            floor: "5",
        },
        true,
    );
    assert!(validity.submit_enabled());
}

#[tokio::test(start_paused = true)]
async fn late_stale_response_keeps_the_newer_result() {
    let backend = Arc::new(MockBackend::new());
    backend.delay("Street X", Duration::from_millis(500));
    backend.delay("Street Y", Duration::from_millis(100));
    let geocoder = Arc::new(MockGeocoder::new());
    let service = Arc::new(service(Arc::clone(&backend), geocoder));
    let machine = Arc::new(Mutex::new(CaptureMachine::new(
        ShippingMethod::ZoneDelivery,
        3,
    )));

    let first = ticket_of(&machine.lock().expect("machine").handle(CaptureEvent::RestoreSaved {
        address: String::from("Street X"),
        coordinates: Coordinates::new(56.01, 92.80),
    }));
    let second = ticket_of(&machine.lock().expect("machine").handle(CaptureEvent::RestoreSaved {
        address: String::from("Street Y"),
        coordinates: Coordinates::new(56.05, 93.00),
    }));

    let slow = tokio::spawn({
        let service = Arc::clone(&service);
        let machine = Arc::clone(&machine);
        async move {
            let outcome = service.resolve(&first, Decimal::from(1000)).await;
            machine
                .lock()
                .expect("machine")
                .apply_resolution(first.token, outcome)
        }
    });
    let fast = tokio::spawn({
        let service = Arc::clone(&service);
        let machine = Arc::clone(&machine);
        async move {
            let outcome = service.resolve(&second, Decimal::from(1000)).await;
            machine
                .lock()
                .expect("machine")
                .apply_resolution(second.token, outcome)
        }
    });

    sleep(Duration::from_millis(600)).await;
    let stale_effects = slow.await.expect("slow task");
    fast.await.expect("fast task");

    assert!(stale_effects.is_empty(), "stale response must be a no-op");
    let machine = machine.lock().expect("machine");
    assert_eq!(machine.slot().raw_text, "Street Y");
    assert_eq!(
        machine.slot().coordinates,
        Some(Coordinates::new(56.05, 93.00))
    );
    assert!(machine.slot().valid);
}

#[tokio::test]
async fn out_of_zone_coordinate_keeps_submit_disabled() {
    let backend = Arc::new(MockBackend::new());
    let geocoder = Arc::new(MockGeocoder::new());
    let service = service(Arc::clone(&backend), geocoder);
    let mut machine = CaptureMachine::new(ShippingMethod::ZoneDelivery, 3);

    let effects = machine.handle(CaptureEvent::MapPoint(Coordinates::new(50.0, 80.0)));
    let ticket = ticket_of(&effects);
    let outcome = service.resolve(&ticket, Decimal::from(1000)).await;
    machine.apply_resolution(ticket.token, outcome);

    assert_eq!(machine.state(), CaptureState::Rejected);
    assert!(!machine.slot().valid);
    assert!(machine.hint().is_some_and(|hint| !hint.is_empty()));
    assert!(
        backend.requests.lock().expect("requests").is_empty(),
        "optimism pass short-circuits the server call"
    );

    let validity = checkout::evaluate(
        machine.slot(),
        machine.method(),
        CheckoutFields {
            flat: "12",
            entrance: "1",
            floor: "5",
        },
        true,
    );
    assert!(!validity.submit_enabled());
}

#[tokio::test]
async fn map_pin_reverse_geocodes_the_display_line() {
    let backend = Arc::new(MockBackend::new());
    let geocoder = Arc::new(MockGeocoder::new());
    let service = service(Arc::clone(&backend), Arc::clone(&geocoder));
    let provider = ProviderId(String::from("mock"));
    let mut machine = CaptureMachine::new(ShippingMethod::ZoneDelivery, 3);

    // Typed text is abandoned once the user pins a point instead.
    machine.handle(CaptureEvent::TextChanged(String::from("недопечатанный адрес")));
    let effects = machine.handle(CaptureEvent::MapPoint(Coordinates::new(56.05, 92.85)));
    let pin = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::ReverseGeocode { coordinates } => Some(*coordinates),
            _ => None,
        })
        .expect("reverse geocode effect");

    let located = service.reverse_geocode(&provider, pin).await.expect("reverse");
    machine.handle(CaptureEvent::ReverseGeocoded(located));
    assert_eq!(machine.slot().raw_text, "Ленина 112, Красноярск");

    let ticket = ticket_of(&effects);
    assert!(ticket.address.is_none());
    let outcome = service.resolve(&ticket, Decimal::from(1200)).await;
    machine.apply_resolution(ticket.token, outcome);
    assert_eq!(machine.state(), CaptureState::Resolved);
    assert!(machine.slot().valid);
    assert_eq!(machine.slot().raw_text, "Ленина 112, Красноярск");
}

#[tokio::test]
async fn pickup_bypasses_the_geocoder_and_validates_without_an_address() {
    let backend = Arc::new(MockBackend::new());
    let geocoder = Arc::new(MockGeocoder::new());
    let service = service(Arc::clone(&backend), Arc::clone(&geocoder));
    let mut machine = CaptureMachine::new(ShippingMethod::ZoneDelivery, 3);

    // Reject a delivery address first.
    let ticket = ticket_of(&machine.handle(CaptureEvent::MapPoint(Coordinates::new(50.0, 80.0))));
    let outcome = service.resolve(&ticket, Decimal::from(1000)).await;
    machine.apply_resolution(ticket.token, outcome);
    assert_eq!(machine.state(), CaptureState::Rejected);

    // Switch to pickup.
    let ticket = ticket_of(&machine.handle(CaptureEvent::MethodChanged(
        ShippingMethod::SelfPickup,
    )));
    let outcome = service.resolve(&ticket, Decimal::from(1000)).await;
    machine.apply_resolution(ticket.token, outcome);

    assert_eq!(machine.time_display(), Some("Самовывоз через 40 мин."));
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    let requests = backend.requests.lock().expect("requests");
    assert_eq!(requests.len(), 1);
    assert!(requests.first().is_some_and(|request| {
        request.address.is_none() && request.coordinates.is_none()
    }));

    let validity = checkout::evaluate(
        machine.slot(),
        machine.method(),
        CheckoutFields::default(),
        true,
    );
    assert!(validity.submit_enabled());
}
