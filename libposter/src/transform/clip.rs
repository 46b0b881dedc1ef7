use geo::{
    BooleanOps, BoundingRect, Coord, Geometry, GeometryCollection, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Polygon, Rect,
};

use crate::{feature::FeatureCollection, pipe::Pipe};

/// Cuts geometries at the edges of a rectangle; whatever ends up empty is
/// dropped.
#[derive(Debug, Clone)]
pub struct ClipToRect {
    rect: Rect<f64>,
    polygon: Polygon<f64>,
}

impl ClipToRect {
    pub fn new(rect: Rect<f64>) -> Self {
        Self {
            rect,
            polygon: rect.to_polygon(),
        }
    }

    fn covers(&self, c: Coord<f64>) -> bool {
        let (min, max) = (self.rect.min(), self.rect.max());
        min.x <= c.x && c.x <= max.x && min.y <= c.y && c.y <= max.y
    }

    fn covers_rect(&self, other: Rect<f64>) -> bool {
        self.covers(other.min()) && self.covers(other.max())
    }

    fn disjoint(&self, other: Rect<f64>) -> bool {
        let (min, max) = (self.rect.min(), self.rect.max());
        other.max().x < min.x || other.min().x > max.x || other.max().y < min.y || other.min().y > max.y
    }

    fn lines(&self, lines: MultiLineString<f64>) -> Option<Geometry<f64>> {
        let clipped = self.polygon.clip(&lines, false);
        let kept: Vec<_> = clipped.0.into_iter().filter(|l| l.0.len() > 1).collect();
        (!kept.is_empty()).then(|| Geometry::MultiLineString(MultiLineString::new(kept)))
    }

    fn areas(&self, areas: MultiPolygon<f64>) -> Option<Geometry<f64>> {
        let clipped = areas.intersection(&MultiPolygon::new(vec![self.polygon.clone()]));
        (!clipped.0.is_empty()).then(|| Geometry::MultiPolygon(clipped))
    }

    pub fn clip(&self, geometry: Geometry<f64>) -> Option<Geometry<f64>> {
        let bounds = geometry.bounding_rect()?;
        if self.disjoint(bounds) {
            return None;
        }
        if self.covers_rect(bounds) {
            return Some(geometry);
        }

        match geometry {
            Geometry::Point(p) => self.covers(p.0).then_some(Geometry::Point(p)),
            Geometry::MultiPoint(points) => {
                let kept: Vec<_> = points.into_iter().filter(|p| self.covers(p.0)).collect();
                (!kept.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(kept)))
            }
            Geometry::Line(line) => self.lines(MultiLineString::new(vec![LineString::new(vec![
                line.start, line.end,
            ])])),
            Geometry::LineString(line) => self.lines(MultiLineString::new(vec![line])),
            Geometry::MultiLineString(lines) => self.lines(lines),
            Geometry::Polygon(polygon) => self.areas(MultiPolygon::new(vec![polygon])),
            Geometry::MultiPolygon(polygons) => self.areas(polygons),
            Geometry::Rect(rect) => self.areas(MultiPolygon::new(vec![rect.to_polygon()])),
            Geometry::Triangle(triangle) => {
                self.areas(MultiPolygon::new(vec![triangle.to_polygon()]))
            }
            Geometry::GeometryCollection(collection) => {
                let kept: Vec<_> = collection.into_iter().filter_map(|g| self.clip(g)).collect();
                (!kept.is_empty())
                    .then(|| Geometry::GeometryCollection(GeometryCollection::new_from(kept)))
            }
        }
    }
}

impl Pipe for ClipToRect {
    type Input = FeatureCollection;
    type Output = FeatureCollection;
    type Error = crate::Error;

    #[tracing::instrument("clip", skip_all, fields(features = input.len()))]
    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let crs = input.crs();
        let output = input.filter_map(crs, |f| {
            let crate::Feature {
                geometry,
                properties,
            } = f;
            self.clip(geometry)
                .map(|geometry| crate::Feature::with_properties(geometry, properties))
        });
        trace!(kept = output.len());
        Ok(output)
    }
}
