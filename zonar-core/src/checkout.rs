//! Checkout validity aggregation.
//!
//! A pure function of the address slot, the shipping method, the numeric
//! address fields, and the minimum-order flag. The caller re-runs it on every
//! field blur, every resolution completion, and every shipping-method change;
//! the output gates the submit control and the error panel.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::model::{AddressSlot, CheckoutField, CheckoutValidity, ShippingMethod};

/// Inclusive bounds for the flat/apartment number.
pub const FLAT_RANGE: RangeInclusive<u32> = 1..=1000;
/// Inclusive bounds for the entrance number.
pub const ENTRANCE_RANGE: RangeInclusive<u32> = 1..=100;
/// Inclusive bounds for the floor number.
pub const FLOOR_RANGE: RangeInclusive<u32> = 1..=100;

/// Raw values of the numeric address fields as typed by the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutFields<'input> {
    /// Flat/apartment number field.
    pub flat: &'input str,
    /// Entrance number field.
    pub entrance: &'input str,
    /// Floor number field.
    pub floor: &'input str,
}

/// True when the raw field value parses to a number inside the bounds.
/// Empty or non-numeric input is out of bounds by definition.
#[must_use]
pub fn field_in_range(raw: &str, range: &RangeInclusive<u32>) -> bool {
    raw.trim()
        .parse::<u32>()
        .is_ok_and(|value| range.contains(&value))
}

/// Aggregate the checkout validity.
///
/// Address and field checks only apply to zone delivery: pickup hides the
/// address block and free shipping carries the address for display only.
/// The minimum-order check likewise binds zone delivery alone.
#[must_use]
pub fn evaluate(
    slot: &AddressSlot,
    method: ShippingMethod,
    fields: CheckoutFields<'_>,
    min_order_met: bool,
) -> CheckoutValidity {
    let mut field_errors = BTreeSet::new();
    let mut address_valid = true;
    let mut amount_valid = true;

    if method == ShippingMethod::ZoneDelivery {
        if slot.raw_text.trim().is_empty() || !slot.captured || !slot.valid {
            address_valid = false;
            field_errors.insert(CheckoutField::Address);
        }
        if !field_in_range(fields.flat, &FLAT_RANGE) {
            address_valid = false;
            field_errors.insert(CheckoutField::Flat);
        }
        if !field_in_range(fields.entrance, &ENTRANCE_RANGE) {
            address_valid = false;
            field_errors.insert(CheckoutField::Entrance);
        }
        if !field_in_range(fields.floor, &FLOOR_RANGE) {
            address_valid = false;
            field_errors.insert(CheckoutField::Floor);
        }
        amount_valid = min_order_met;
    }

    CheckoutValidity {
        address_valid,
        amount_valid,
        field_errors,
    }
}
