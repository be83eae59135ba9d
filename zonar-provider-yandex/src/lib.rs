//! Geocoder adapter for the Yandex geocoding API.

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

const BASE_URL: &str = "https://geocode-maps.yandex.ru/1.x/";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Debug, Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Debug, Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Debug, Deserialize)]
struct GeoObject {
    #[serde(rename = "metaDataProperty")]
    meta: MetaDataProperty,

    #[serde(rename = "Point")]
    point: GeoPoint,
}

#[derive(Debug, Deserialize)]
struct MetaDataProperty {
    #[serde(rename = "GeocoderMetaData")]
    geocoder: GeocoderMetaData,
}

#[derive(Debug, Deserialize)]
struct GeocoderMetaData {
    /// Fully qualified address line.
    text: String,

    /// Geocoder confidence: "exact", "number", "near", "range", "street",
    /// or "other".
    precision: String,
}

#[derive(Debug, Deserialize)]
struct GeoPoint {
    /// Space-separated "lon lat" pair.
    pos: String,
}

impl GeoObject {
    fn coordinates(&self) -> Option<Coordinates> {
        let mut parts = self.point.pos.split_whitespace();
        let lon = parts.next()?.parse().ok()?;
        let lat = parts.next()?.parse().ok()?;
        Some(Coordinates::new(lat, lon))
    }
}

/// Geocoder implementation over the Yandex HTTP geocoder.
///
/// Yandex has no separate suggest endpoint in this API version; suggestions
/// are forward geocoding calls capped by the `results` parameter.
pub struct YandexGeocoder {
    client: Client,
    meta: ProviderMeta,
    api_key: String,
}

impl YandexGeocoder {
    /// Create a new geocoder bound to the given HTTP client and API key.
    #[must_use]
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            meta: provider_meta(),
            api_key,
        }
    }

    async fn geocode(&self, query: &str, results: usize) -> Result<Vec<GeoObject>, GeocodeError> {
        let results = results.to_string();
        let req = self.client.get(BASE_URL).query(&[
            ("apikey", self.api_key.as_str()),
            ("format", "json"),
            ("geocode", query),
            ("results", results.as_str()),
        ]);
        let resp = fetch_json::<GeocodeResponse>(req).await?;
        Ok(resp
            .response
            .collection
            .members
            .into_iter()
            .map(|member| member.geo_object)
            .collect())
    }
}

#[async_trait]
impl GeocoderPort for YandexGeocoder {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn suggest(&self, text: &str, limit: usize) -> Result<Vec<Candidate>, GeocodeError> {
        if limit == 0 || text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let objects = self.geocode(text, limit).await?;
        Ok(objects.iter().map(to_candidate).collect())
    }

    async fn resolve_candidate(&self, candidate: &Candidate) -> Result<Located, GeocodeError> {
        match &candidate.location {
            CandidateLocation::Point(coordinates) => Ok(Located {
                address_line: candidate.label.clone(),
                coordinates: *coordinates,
                precision: candidate.precision,
            }),
            CandidateLocation::Handle(query) => {
                let objects = self.geocode(query, 1).await?;
                let object = objects.first().ok_or(GeocodeError::NotFound)?;
                to_located(object)
            }
        }
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Located, GeocodeError> {
        // Reverse lookups take "lon,lat", unlike the wire format used elsewhere.
        let query = format!("{},{}", coordinates.lon, coordinates.lat);
        let objects = self.geocode(&query, 1).await?;
        let object = objects.first().ok_or(GeocodeError::NotFound)?;
        to_located(object)
    }
}

/// Build the plugin bundle for the Yandex provider.
#[must_use]
pub fn plugin(client: Client, api_key: String) -> GeocoderPlugin {
    let geocoder = Arc::new(YandexGeocoder::new(client, api_key));
    GeocoderPlugin {
        meta: provider_meta(),
        geocoder,
    }
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        id: ProviderId(String::from("yandex")),
        name: String::from("Яндекс Карты"),
        min_query_len: 3,
        center: Coordinates::new(56.008331, 92.878786),
        min_zoom: 10,
        max_zoom: 18,
    }
}

/// Bucket the Yandex precision codes.
///
/// "exact" means the building itself; "number", "near", "range", and
/// "street" are partial matches worth refining; anything else is a guess.
fn map_precision(raw: &str) -> Precision {
    match raw {
        "exact" => Precision::Exact,
        "number" | "near" | "range" | "street" => Precision::Approximate,
        _ => Precision::Ambiguous,
    }
}

fn to_candidate(object: &GeoObject) -> Candidate {
    let label = object.meta.geocoder.text.clone();
    let location = match object.coordinates() {
        Some(coordinates) => CandidateLocation::Point(coordinates),
        None => CandidateLocation::Handle(label.clone()),
    };
    Candidate {
        label,
        precision: map_precision(&object.meta.geocoder.precision),
        location,
    }
}

fn to_located(object: &GeoObject) -> Result<Located, GeocodeError> {
    let coordinates = object.coordinates().ok_or(GeocodeError::NotFound)?;
    Ok(Located {
        address_line: object.meta.geocoder.text.clone(),
        coordinates,
        precision: map_precision(&object.meta.geocoder.precision),
    })
}

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
        tracing::warn!(error = %error, "Yandex request failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_buckets_follow_the_geocoder_codes() {
        assert_eq!(map_precision("exact"), Precision::Exact);
        assert_eq!(map_precision("number"), Precision::Approximate);
        assert_eq!(map_precision("near"), Precision::Approximate);
        assert_eq!(map_precision("range"), Precision::Approximate);
        assert_eq!(map_precision("street"), Precision::Approximate);
        assert_eq!(map_precision("other"), Precision::Ambiguous);
        assert_eq!(map_precision(""), Precision::Ambiguous);
    }

    #[test]
    fn pos_parses_as_lon_then_lat() {
        let raw = r#"{
            "response": {
                "GeoObjectCollection": {
                    "featureMember": [
                        {
                            "GeoObject": {
                                "metaDataProperty": {
                                    "GeocoderMetaData": {
                                        "text": "Россия, Красноярск, улица Ленина, 112",
                                        "precision": "exact"
                                    }
                                },
                                "Point": {"pos": "92.878786 56.008331"}
                            }
                        }
                    ]
                }
            }
        }"#;
        let resp: GeocodeResponse = serde_json::from_str(raw).expect("payload");
        let object = &resp.response.collection.members[0].geo_object;
        assert_eq!(
            object.coordinates(),
            Some(Coordinates::new(56.008331, 92.878786))
        );

        let candidate = to_candidate(object);
        assert_eq!(candidate.precision, Precision::Exact);
        assert_eq!(candidate.label, "Россия, Красноярск, улица Ленина, 112");
    }

    #[test]
    fn empty_collection_parses_cleanly() {
        let raw = r#"{"response": {"GeoObjectCollection": {}}}"#;
        let resp: GeocodeResponse = serde_json::from_str(raw).expect("payload");
        assert!(resp.response.collection.members.is_empty());
    }
}
