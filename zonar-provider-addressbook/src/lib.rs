//! Geocoder adapter over the user's saved addresses.
//!
//! Entries come from earlier sessions, already geocoded, so every hit is
//! exact and no network is involved.

use std::sync::Arc;

use async_trait::async_trait;

use zonar_core::{
    model::{Candidate, CandidateLocation, Coordinates, Located, Precision, ProviderId},
    plugin::GeocoderPlugin,
    ports::{GeocodeError, GeocoderPort, ProviderMeta},
};

/// Reverse lookups match a saved entry within roughly a city block.
const REVERSE_EPSILON: f64 = 0.002;

/// One previously captured delivery address.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedAddress {
    /// Display line as it was captured.
    pub label: String,
    /// Geocoded point of the entry.
    pub coordinates: Coordinates,
}

/// In-memory address book implementing the geocoder surface.
pub struct AddressBook {
    meta: ProviderMeta,
    entries: Vec<SavedAddress>,
}

impl AddressBook {
    /// Create an address book over the given saved entries.
    #[must_use]
    pub fn new(entries: Vec<SavedAddress>) -> Self {
        Self {
            meta: provider_meta(),
            entries,
        }
    }

    /// Number of saved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no addresses were saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl GeocoderPort for AddressBook {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn suggest(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, GeocodeError> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.label.to_lowercase().contains(&needle))
            .take(limit)
            .map(|entry| Candidate {
                label: entry.label.clone(),
                precision: Precision::Exact,
                location: CandidateLocation::Point(entry.coordinates),
            })
            .collect())
    }

    async fn resolve_candidate(&self, candidate: &Candidate) -> Result<Located, GeocodeError> {
        match &candidate.location {
            CandidateLocation::Point(coordinates) => Ok(Located {
                address_line: candidate.label.clone(),
                coordinates: *coordinates,
                precision: Precision::Exact,
            }),
            CandidateLocation::Handle(label) => self
                .entries
                .iter()
                .find(|entry| entry.label == *label)
                .map(|entry| Located {
                    address_line: entry.label.clone(),
                    coordinates: entry.coordinates,
                    precision: Precision::Exact,
                })
                .ok_or(GeocodeError::NotFound),
        }
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Located, GeocodeError> {
        self.entries
            .iter()
            .map(|entry| {
                let dlat = entry.coordinates.lat - coordinates.lat;
                let dlon = entry.coordinates.lon - coordinates.lon;
                (entry, dlat * dlat + dlon * dlon)
            })
            .filter(|(_, distance)| *distance <= REVERSE_EPSILON * REVERSE_EPSILON)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(entry, _)| Located {
                address_line: entry.label.clone(),
                coordinates: entry.coordinates,
                precision: Precision::Exact,
            })
            .ok_or(GeocodeError::NotFound)
    }
}

/// Build the plugin bundle for the address book.
#[must_use]
pub fn plugin(entries: Vec<SavedAddress>) -> GeocoderPlugin {
    let geocoder = Arc::new(AddressBook::new(entries));
    GeocoderPlugin {
        meta: provider_meta(),
        geocoder,
    }
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from("addressbook")),
        name: String::from("Мои адреса"),
        min_query_len: 2,
        center: Coordinates::new(56.008331, 92.878786),
        min_zoom: 10,
        max_zoom: 18,
    }
}
