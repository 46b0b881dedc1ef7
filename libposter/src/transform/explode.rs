use geo::{Geometry, LineString};

use crate::{
    feature::{Feature, FeatureCollection},
    pipe::Pipe,
};

/// Splits multi-part geometries so that every feature holds exactly one
/// point, line or polygon. Parts inherit the attributes of their parent.
#[derive(Debug, Default, Clone, Copy)]
pub struct Explode;

pub fn explode(geometry: Geometry<f64>) -> Vec<Geometry<f64>> {
    match geometry {
        Geometry::MultiPoint(points) => points.into_iter().map(Geometry::Point).collect(),
        Geometry::MultiLineString(lines) => lines.into_iter().map(Geometry::LineString).collect(),
        Geometry::MultiPolygon(polygons) => polygons.into_iter().map(Geometry::Polygon).collect(),
        Geometry::GeometryCollection(collection) => {
            collection.into_iter().flat_map(explode).collect()
        }
        Geometry::Line(line) => vec![Geometry::LineString(LineString::new(vec![
            line.start, line.end,
        ]))],
        Geometry::Rect(rect) => vec![Geometry::Polygon(rect.to_polygon())],
        Geometry::Triangle(triangle) => vec![Geometry::Polygon(triangle.to_polygon())],
        single => vec![single],
    }
}

impl Pipe for Explode {
    type Input = FeatureCollection;
    type Output = FeatureCollection;
    type Error = crate::Error;

    #[tracing::instrument("explode", skip_all, fields(features = input.len()))]
    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let crs = input.crs();
        let output = input.flat_map(crs, |Feature { geometry, properties }| {
            explode(geometry)
                .into_iter()
                .map(move |part| Feature::with_properties(part, properties.clone()))
        });
        trace!(parts = output.len());
        Ok(output)
    }
}
