//! Geocoder adapter for the 2GIS catalog API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use zonar_core::{
    model::{Candidate, CandidateLocation, Coordinates, Located, Precision, ProviderId},
    plugin::GeocoderPlugin,
    ports::{GeocodeError, GeocoderPort, ProviderMeta},
};

const BASE_URL: &str = "https://catalog.api.2gis.com/3.0";

/// Response wrapper from /3.0/suggests and /3.0/items/geocode.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    result: CatalogResult,
}

#[derive(Debug, Deserialize)]
struct CatalogResult {
    #[serde(default)]
    items: Vec<CatalogItem>,
}

/// Single suggestion or geocoding hit.
#[derive(Debug, Deserialize)]
struct CatalogItem {
    name: String,

    #[serde(default)]
    full_name: Option<String>,

    #[serde(rename = "type")]
    kind: String, // "building", "street", ...

    #[serde(default)]
    point: Option<CatalogPoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogPoint {
    lat: f64,
    lon: f64,
}

impl CatalogItem {
    fn label(&self) -> String {
        self.full_name.clone().unwrap_or_else(|| self.name.clone())
    }
}

/// Geocoder implementation over the 2GIS catalog endpoints.
pub struct DgisGeocoder {
    client: Client,
    meta: ProviderMeta,
    key: String,
}

impl DgisGeocoder {
    /// Create a new geocoder bound to the given HTTP client and API key.
    #[must_use]
    pub fn new(client: Client, key: String) -> Self {
        Self {
            client,
            meta: provider_meta(),
            key,
        }
    }

    fn sort_point(&self) -> String {
        // 2GIS wants "lon,lat" here, the opposite of the wire order elsewhere.
        format!("{},{}", self.meta.center.lon, self.meta.center.lat)
    }
}

#[async_trait]
impl GeocoderPort for DgisGeocoder {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn suggest(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, GeocodeError> {
        if limit == 0 || text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let req = self.client.get(format!("{BASE_URL}/suggests")).query(&[
            ("q", text),
            ("sort_point", &self.sort_point()),
            ("type", "building,street"),
            ("suggest_type", "address"),
            ("fields", "items.point"),
            ("key", &self.key),
        ]);

        let resp = fetch_json::<CatalogResponse>(req).await?;

        Ok(resp
            .result
            .items
            .into_iter()
            .take(limit)
            .map(|item| to_candidate(&item))
            .collect())
    }

    async fn resolve_candidate(&self, candidate: &Candidate) -> Result<Located, GeocodeError> {
        match &candidate.location {
            CandidateLocation::Point(coordinates) => Ok(Located {
                address_line: candidate.label.clone(),
                coordinates: *coordinates,
                precision: candidate.precision,
            }),
            CandidateLocation::Handle(query) => {
                let req = self.client.get(format!("{BASE_URL}/items/geocode")).query(&[
                    ("q", query.as_str()),
                    ("fields", "items.point"),
                    ("key", &self.key),
                ]);
                let resp = fetch_json::<CatalogResponse>(req).await?;
                let item = resp
                    .result
                    .items
                    .into_iter()
                    .find(|item| item.point.is_some())
                    .ok_or(GeocodeError::NotFound)?;
                to_located(&item)
            }
        }
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Located, GeocodeError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lon.to_string();
        let req = self.client.get(format!("{BASE_URL}/items/geocode")).query(&[
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("fields", "items.point"),
            ("key", &self.key),
        ]);
        let resp = fetch_json::<CatalogResponse>(req).await?;
        let item = resp
            .result
            .items
            .into_iter()
            .next()
            .ok_or(GeocodeError::NotFound)?;
        to_located(&item)
    }
}

/// Build the plugin bundle for the 2GIS provider.
#[must_use]
pub fn plugin(client: Client, key: String) -> GeocoderPlugin {
    let geocoder = Arc::new(DgisGeocoder::new(client, key));
    GeocoderPlugin {
        meta: provider_meta(),
        geocoder,
    }
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from("dgis")),
        name: String::from("2GIS"),
        min_query_len: 3,
        center: Coordinates::new(56.008331, 92.878786),
        min_zoom: 10,
        max_zoom: 18,
    }
}

/// Map 2GIS item types to the precision buckets.
fn map_kind(raw: &str) -> Precision {
    match raw {
        "building" => Precision::Exact,
        "street" => Precision::Approximate,
        _ => Precision::Ambiguous,
    }
}

fn to_candidate(item: &CatalogItem) -> Candidate {
    let location = match &item.point {
        Some(point) => CandidateLocation::Point(Coordinates::new(point.lat, point.lon)),
        // No point in the payload: geocode the display name in a second step.
        None => CandidateLocation::Handle(item.label()),
    };
    Candidate {
        label: item.label(),
        precision: map_kind(&item.kind),
        location,
    }
}

fn to_located(item: &CatalogItem) -> Result<Located, GeocodeError> {
    let point = item.point.as_ref().ok_or(GeocodeError::NotFound)?;
    Ok(Located {
        address_line: item.label(),
        coordinates: Coordinates::new(point.lat, point.lon),
        precision: map_kind(&item.kind),
    })
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GeocodeError> {
    let result = async {
        req.send()
            .await
            .map_err(GeocodeError::from)?
            .error_for_status()
            .map_err(GeocodeError::from)?
            .json()
            .await
            .map_err(GeocodeError::from)
    }
    .await;
    if let Err(error) = &result {
        tracing::warn!(error = %error, "2GIS request failed");
    }
    result
}
