//! Overpass `out geom;` answers to geometry.

use geo::{Coord, Geometry, Intersects, LineString, MultiPolygon, Point, Polygon};
use serde::Deserialize;
use serde_json::Value;

use crate::feature::{Crs, Feature, FeatureCollection, Properties};

#[derive(Debug, Deserialize)]
pub(super) struct Response {
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(super) enum Element {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: Properties,
    },
    Way {
        id: i64,
        #[serde(default)]
        geometry: Vec<Option<LatLon>>,
        #[serde(default)]
        tags: Properties,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: Properties,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(super) struct LatLon {
    lat: f64,
    lon: f64,
}

impl From<LatLon> for Coord<f64> {
    fn from(p: LatLon) -> Self {
        geo::coord! { x: p.lon, y: p.lat }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Member {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

/// Keys whose closed ways are still lines unless `area=yes`.
const LINEAR_KEYS: &[&str] = &["highway", "barrier", "railway", "waterway", "power"];

fn is_area(tags: &Properties) -> bool {
    match tags.get("area").and_then(Value::as_str) {
        Some("yes") => return true,
        Some("no") => return false,
        _ => {}
    }
    if tags.get("natural").and_then(Value::as_str) == Some("coastline") {
        return false;
    }
    !LINEAR_KEYS.iter().any(|k| tags.contains_key(*k))
}

fn coords(points: Vec<Option<LatLon>>) -> Vec<Coord<f64>> {
    points.into_iter().flatten().map(Coord::from).collect()
}

fn closed(ring: &[Coord<f64>]) -> bool {
    ring.len() >= 4 && ring.first() == ring.last()
}

fn way(coords: Vec<Coord<f64>>, tags: &Properties) -> Option<Geometry<f64>> {
    if coords.len() < 2 {
        return None;
    }
    if closed(&coords) && is_area(tags) {
        Some(Geometry::Polygon(Polygon::new(LineString::new(coords), vec![])))
    } else {
        Some(Geometry::LineString(LineString::new(coords)))
    }
}

/// Joins way fragments end to end into closed rings. Fragments that never
/// close are dropped.
pub(super) fn assemble_rings(mut parts: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
    let mut rings = vec![];
    parts.retain(|p| p.len() >= 2);

    while let Some(mut current) = parts.pop() {
        loop {
            if closed(&current) {
                rings.push(LineString::new(current));
                break;
            }
            let Some(&end) = current.last() else { break };
            let next = parts
                .iter()
                .position(|p| p.first() == Some(&end) || p.last() == Some(&end));
            match next {
                Some(i) => {
                    let mut part = parts.swap_remove(i);
                    if part.first() != Some(&end) {
                        part.reverse();
                    }
                    current.extend(part.into_iter().skip(1));
                }
                None => {
                    trace!(points = current.len(), "unclosed ring dropped");
                    break;
                }
            }
        }
    }
    rings
}

fn multipolygon(members: Vec<Member>) -> Option<Geometry<f64>> {
    let mut outer = vec![];
    let mut inner = vec![];
    for member in members.into_iter().filter(|m| m.kind == "way") {
        let part = coords(member.geometry);
        match member.role.as_str() {
            "inner" => inner.push(part),
            _ => outer.push(part),
        }
    }

    let mut polygons: Vec<Polygon<f64>> = assemble_rings(outer)
        .into_iter()
        .map(|ring| Polygon::new(ring, vec![]))
        .collect();
    for hole in assemble_rings(inner) {
        let Some(probe) = hole.0.first().copied() else { continue };
        match polygons.iter_mut().find(|p| p.intersects(&Point::from(probe))) {
            Some(polygon) => polygon.interiors_push(hole),
            None => trace!("inner ring outside every outer ring"),
        }
    }

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

fn with_id(mut tags: Properties, kind: &str, id: i64) -> Properties {
    tags.insert("element_type".into(), kind.into());
    tags.insert("osmid".into(), id.into());
    tags
}

pub(super) fn decode(response: Response) -> FeatureCollection {
    let mut features = Vec::with_capacity(response.elements.len());
    let mut skipped = 0usize;

    for element in response.elements {
        let feature = match element {
            Element::Node { id, lat, lon, tags } => Some(Feature::with_properties(
                Geometry::Point(geo::point! { x: lon, y: lat }),
                with_id(tags, "node", id),
            )),
            Element::Way { id, geometry, tags } => way(coords(geometry), &tags)
                .map(|g| Feature::with_properties(g, with_id(tags, "way", id))),
            Element::Relation { id, members, tags } => {
                let kind = tags.get("type").and_then(Value::as_str);
                if matches!(kind, Some("multipolygon") | Some("boundary")) {
                    multipolygon(members)
                        .map(|g| Feature::with_properties(g, with_id(tags, "relation", id)))
                } else {
                    None
                }
            }
        };
        match feature {
            Some(f) => features.push(f),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "elements without usable geometry");
    }
    FeatureCollection::new(Crs::Geographic, features)
}
