use std::sync::Arc;

use rust_decimal::Decimal;

use zonar_core::{
    CaptureMachine, CheckoutFields, CheckoutValidity, Coordinates, MapBinding, ProviderId,
    ProviderMeta, ResolutionResult, ShippingMethod, ZonarService, ZoneId, checkout,
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Screen {
    MethodSelect,
    AddressEntry,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Address,
    Flat,
    Entrance,
    Floor,
}

impl Focus {
    pub(crate) fn next(self) -> Self {
        match self {
            Focus::Address => Focus::Flat,
            Focus::Flat => Focus::Entrance,
            Focus::Entrance => Focus::Floor,
            Focus::Floor => Focus::Address,
        }
    }
}

pub(crate) const METHODS: [ShippingMethod; 3] = [
    ShippingMethod::ZoneDelivery,
    ShippingMethod::SelfPickup,
    ShippingMethod::FreeShipping,
];

pub(crate) struct App {
    pub service: Arc<ZonarService>,

    pub screen: Screen,
    pub method_index: usize,

    pub providers: Vec<ProviderMeta>,
    pub provider_index: usize,
    pub provider: ProviderId,

    pub machine: CaptureMachine,
    pub map: MapBinding,
    pub home_center: Coordinates,

    pub address_input: String,
    pub suggestion_index: usize,
    pub focus: Focus,
    pub flat_input: String,
    pub entrance_input: String,
    pub floor_input: String,

    pub basket_total: Decimal,
    pub min_order_met: bool,
    pub current_zone: Option<ZoneId>,
    pub last_result: Option<ResolutionResult>,
    pub validity: CheckoutValidity,

    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<ZonarService>, basket_total: Decimal) -> Self {
        let providers = service.providers();
        let meta = providers.first().cloned().unwrap_or_else(fallback_meta);
        let machine = CaptureMachine::new(ShippingMethod::ZoneDelivery, meta.min_query_len);
        let map = MapBinding::new(&meta);
        let validity = checkout::evaluate(
            machine.slot(),
            machine.method(),
            CheckoutFields::default(),
            true,
        );

        Self {
            service,
            screen: Screen::MethodSelect,
            method_index: 0,
            provider: meta.id.clone(),
            home_center: meta.center,
            providers,
            provider_index: 0,
            machine,
            map,
            address_input: String::new(),
            suggestion_index: 0,
            focus: Focus::Address,
            flat_input: String::new(),
            entrance_input: String::new(),
            floor_input: String::new(),
            basket_total,
            min_order_met: true,
            current_zone: None,
            last_result: None,
            validity,
            is_loading: false,
            error_message: None,
        }
    }

    pub(crate) fn current_method(&self) -> ShippingMethod {
        METHODS
            .get(self.method_index)
            .copied()
            .unwrap_or(ShippingMethod::ZoneDelivery)
    }

    /// Recompute the checkout validity from the current slot and fields.
    pub(crate) fn revalidate(&mut self) {
        self.validity = checkout::evaluate(
            self.machine.slot(),
            self.machine.method(),
            CheckoutFields {
                flat: &self.flat_input,
                entrance: &self.entrance_input,
                floor: &self.floor_input,
            },
            self.min_order_met,
        );
    }

    /// Switch to the next registered provider; the capture starts over.
    pub(crate) fn cycle_provider(&mut self) {
        if self.providers.len() < 2 {
            return;
        }
        self.provider_index = (self.provider_index + 1) % self.providers.len();
        if let Some(meta) = self.providers.get(self.provider_index).cloned() {
            self.provider = meta.id.clone();
            self.home_center = meta.center;
            self.machine = CaptureMachine::new(self.machine.method(), meta.min_query_len);
            self.map = MapBinding::new(&meta);
            self.address_input.clear();
            self.suggestion_index = 0;
            self.last_result = None;
            self.current_zone = None;
            self.min_order_met = true;
            self.revalidate();
        }
    }

    /// Numeric-field errors are only highlighted once the user started typing.
    pub(crate) fn fields_touched(&self) -> bool {
        !self.flat_input.is_empty()
            || !self.entrance_input.is_empty()
            || !self.floor_input.is_empty()
    }

    pub(crate) fn focused_field(&mut self) -> &mut String {
        match self.focus {
            Focus::Address => &mut self.address_input,
            Focus::Flat => &mut self.flat_input,
            Focus::Entrance => &mut self.entrance_input,
            Focus::Floor => &mut self.floor_input,
        }
    }
}

fn fallback_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from("none")),
        name: String::from("No provider"),
        min_query_len: 3,
        center: Coordinates::new(56.008331, 92.878786),
        min_zoom: 10,
        max_zoom: 18,
    }
}
