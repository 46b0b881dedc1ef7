use geo::{Geometry, LineString, Polygon};
use serde::{Deserialize, Serialize};

pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Coordinate reference system a collection currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:4326, degrees.
    Geographic,
    /// EPSG:3857, metres.
    Mercator,
    /// Drawing units of the output canvas.
    Poster,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature<G = Geometry<f64>> {
    pub geometry: G,
    pub properties: Properties,
}

impl<G> Feature<G> {
    pub fn new(geometry: G) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_properties(geometry: G, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    pub fn map_geometry<H>(self, f: impl FnOnce(G) -> H) -> Feature<H> {
        Feature {
            geometry: f(self.geometry),
            properties: self.properties,
        }
    }
}

/// Ordered features in a single CRS.
///
/// `G` is the geometry shape: raw `Geometry` straight from a source, then
/// `Polygon` for area layers or `LineString` for line layers once the
/// type filter ran.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection<G = Geometry<f64>> {
    crs: Crs,
    features: Vec<Feature<G>>,
}

pub type Areas = FeatureCollection<Polygon<f64>>;
pub type Lines = FeatureCollection<LineString<f64>>;

impl<G> FeatureCollection<G> {
    pub fn new(crs: Crs, features: Vec<Feature<G>>) -> Self {
        Self { crs, features }
    }

    pub fn empty(crs: Crs) -> Self {
        Self::new(crs, vec![])
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature<G>] {
        &self.features
    }

    pub fn into_features(self) -> Vec<Feature<G>> {
        self.features
    }

    pub fn geometries(&self) -> impl Iterator<Item = &G> + '_ {
        self.features.iter().map(|f| &f.geometry)
    }

    pub fn expect_crs(&self, expected: Crs) -> crate::Result<()> {
        if self.crs == expected {
            Ok(())
        } else {
            Err(crate::Error::CrsMismatch {
                expected,
                found: self.crs,
            })
        }
    }

    /// Appends `other`, both collections must share a CRS.
    pub fn concat(mut self, other: Self) -> crate::Result<Self> {
        other.expect_crs(self.crs)?;
        self.features.extend(other.features);
        Ok(self)
    }

    /// Rebuilds the collection feature by feature, dropping `None`s.
    pub fn filter_map<H>(
        self,
        crs: Crs,
        f: impl FnMut(Feature<G>) -> Option<Feature<H>>,
    ) -> FeatureCollection<H> {
        FeatureCollection {
            crs,
            features: self.features.into_iter().filter_map(f).collect(),
        }
    }

    pub fn flat_map<H, I>(
        self,
        crs: Crs,
        f: impl FnMut(Feature<G>) -> I,
    ) -> FeatureCollection<H>
    where
        I: IntoIterator<Item = Feature<H>>,
    {
        FeatureCollection {
            crs,
            features: self.features.into_iter().flat_map(f).collect(),
        }
    }
}

impl<G> IntoIterator for FeatureCollection<G> {
    type Item = Feature<G>;
    type IntoIter = std::vec::IntoIter<Feature<G>>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

/// Broad shape of a single-part geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Path,
    Area,
    Other,
}

impl GeometryKind {
    pub fn of(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => GeometryKind::Point,
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                GeometryKind::Path
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => GeometryKind::Area,
            Geometry::GeometryCollection(_) => GeometryKind::Other,
        }
    }
}
