//! Delivery zone polygons fetched once per session and queried read-only.

use geo::{Contains, LineString, Point, Polygon};
use serde::Deserialize;

use crate::model::{Coordinates, ZoneId};

/// Raw feature collection as served by the zones endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneCollection {
    /// One feature per delivery zone.
    pub features: Vec<ZoneFeature>,
}

/// One GeoJSON-like feature of the zones payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneFeature {
    /// Business properties attached to the polygon.
    pub properties: ZoneProperties,
    /// Polygon geometry, coordinates latitude-first per ring.
    pub geometry: ZoneGeometry,
}

/// Per-zone business properties.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneProperties {
    /// Zone number used as the wire `zonaId`.
    pub number: u32,
    /// Whether delivery into the zone is currently offered.
    #[serde(default)]
    pub available: bool,
}

/// Polygon geometry of one zone feature.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneGeometry {
    /// Geometry type tag; anything but `"Polygon"` is skipped.
    #[serde(rename = "type")]
    pub kind: String,
    /// Rings of `[lat, lon]` pairs; the first ring is the exterior.
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

/// One delivery zone: number, availability, and its polygon.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Zone number.
    pub id: ZoneId,
    /// Whether delivery into the zone is currently offered.
    pub available: bool,
    polygon: Polygon<f64>,
}

impl Zone {
    /// Point-in-polygon check for this zone.
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        self.polygon.contains(&Point::new(point.lat, point.lon))
    }

    /// Fill/stroke color derived from availability.
    #[must_use]
    pub const fn display_color(&self) -> &'static str {
        if self.available { "#59ff85" } else { "#ed4543" }
    }

    /// Fill opacity used when rendering the polygon.
    #[must_use]
    pub const fn fill_opacity(&self) -> f64 {
        0.1
    }
}

/// Read-only store of every delivery zone for the page lifetime.
#[derive(Debug, Clone, Default)]
pub struct ZoneStore {
    zones: Vec<Zone>,
}

impl ZoneStore {
    /// Build the store from the fetched feature collection.
    ///
    /// Non-polygon features and features without an exterior ring are skipped.
    #[must_use]
    pub fn new(collection: ZoneCollection) -> Self {
        let zones = collection
            .features
            .into_iter()
            .filter(|feature| feature.geometry.kind == "Polygon")
            .filter_map(|feature| {
                let mut rings = feature.geometry.coordinates.into_iter().map(|ring| {
                    LineString::from(
                        ring.into_iter()
                            .map(|[lat, lon]| (lat, lon))
                            .collect::<Vec<_>>(),
                    )
                });
                let exterior = rings.next()?;
                Some(Zone {
                    id: ZoneId(feature.properties.number),
                    available: feature.properties.available,
                    polygon: Polygon::new(exterior, rings.collect()),
                })
            })
            .collect();
        Self { zones }
    }

    /// First zone containing the point, if any.
    #[must_use]
    pub fn locate(&self, point: Coordinates) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    /// Zone lookup by number.
    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Iterator over all zones.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Number of zones in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True when no zones were fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(number: u32, available: bool, lat0: f64, lon0: f64, side: f64) -> ZoneFeature {
        ZoneFeature {
            properties: ZoneProperties { number, available },
            geometry: ZoneGeometry {
                kind: String::from("Polygon"),
                coordinates: vec![vec![
                    [lat0, lon0],
                    [lat0 + side, lon0],
                    [lat0 + side, lon0 + side],
                    [lat0, lon0 + side],
                    [lat0, lon0],
                ]],
            },
        }
    }

    fn store() -> ZoneStore {
        ZoneStore::new(ZoneCollection {
            features: vec![
                square(1, true, 56.0, 92.8, 0.1),
                square(2, false, 56.1, 92.8, 0.1),
            ],
        })
    }

    #[test]
    fn locates_the_containing_zone() {
        let zones = store();
        let zone = zones
            .locate(Coordinates::new(56.05, 92.85))
            .expect("inside zone 1");
        assert_eq!(zone.id, ZoneId(1));
        assert!(zone.available);
    }

    #[test]
    fn point_outside_every_polygon_finds_nothing() {
        let zones = store();
        assert!(zones.locate(Coordinates::new(55.0, 90.0)).is_none());
    }

    #[test]
    fn availability_drives_the_display_color() {
        let zones = store();
        assert_eq!(zones.zone(ZoneId(1)).expect("zone 1").display_color(), "#59ff85");
        assert_eq!(zones.zone(ZoneId(2)).expect("zone 2").display_color(), "#ed4543");
    }

    #[test]
    fn parses_the_wire_payload() {
        let raw = r##"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"number": 3, "available": true, "fill": "#59ff85"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[56.0, 92.8], [56.1, 92.8], [56.1, 92.9], [56.0, 92.8]]]
                }
            }]
        }"##;
        let collection: ZoneCollection = serde_json::from_str(raw).expect("geojson");
        let zones = ZoneStore::new(collection);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones.zone(ZoneId(3)).expect("zone 3").id, ZoneId(3));
    }
}
