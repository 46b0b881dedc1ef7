use geo::{Coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::Error;

/// What the user asked to map. Exactly one of `bbox`, `latlon` or `name`
/// must be set; `radius_m` only applies to `latlon`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaDescriptor {
    /// `[min_lon, min_lat, max_lon, max_lat]`
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    /// `[lat, lon]`
    #[serde(default)]
    pub latlon: Option<(f64, f64)>,
    #[serde(default, alias = "radius")]
    pub radius_m: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AreaDescriptor {
    pub fn bbox(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            bbox: Some([min_lon, min_lat, max_lon, max_lat]),
            ..Self::default()
        }
    }

    pub fn around(lat: f64, lon: f64, radius_m: Option<f64>) -> Self {
        Self {
            latlon: Some((lat, lon)),
            radius_m,
            ..Self::default()
        }
    }
}

/// The resolved poster area: the geographic box, its Web-Mercator box and
/// the Mercator centroid. All three come from one source rectangle and never
/// change afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    geographic: Rect<f64>,
    projected: Rect<f64>,
    centroid: Coord<f64>,
}

impl BoundingRegion {
    fn from_geographic(geographic: Rect<f64>) -> Self {
        let projected = mercator::project_rect(geographic);
        Self {
            geographic,
            projected,
            centroid: projected.center(),
        }
    }

    fn from_projected(projected: Rect<f64>) -> Self {
        Self {
            geographic: mercator::unproject_rect(projected),
            projected,
            centroid: projected.center(),
        }
    }

    pub fn geographic(&self) -> Rect<f64> {
        self.geographic
    }

    pub fn projected(&self) -> Rect<f64> {
        self.projected
    }

    pub fn centroid(&self) -> Coord<f64> {
        self.centroid
    }

    pub fn geographic_polygon(&self) -> Polygon<f64> {
        self.geographic.to_polygon()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AreaResolver {
    default_radius_m: f64,
}

impl Default for AreaResolver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RADIUS_M)
    }
}

impl AreaResolver {
    pub fn new(default_radius_m: f64) -> Self {
        Self { default_radius_m }
    }

    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, area: &AreaDescriptor) -> crate::Result<BoundingRegion> {
        let forms = [area.bbox.is_some(), area.latlon.is_some(), area.name.is_some()]
            .into_iter()
            .filter(|set| *set)
            .count();

        if forms > 1 {
            return Err(Error::InvalidAreaSpec(
                "give only one of `bbox`, `latlon` or `name`".into(),
            ));
        }

        let region = match (area.bbox, area.latlon, &area.name) {
            (Some(bbox), _, _) => Self::from_bbox(bbox)?,
            (_, Some((lat, lon)), _) => {
                let radius = area.radius_m.unwrap_or(self.default_radius_m);
                Self::from_point(lat, lon, radius)?
            }
            (_, _, Some(name)) => {
                return Err(Error::InvalidAreaSpec(format!(
                    "place names are not supported (`{name}`), use `bbox` or `latlon`"
                )))
            }
            (None, None, None) => {
                return Err(Error::InvalidAreaSpec(
                    "neither a bounding box nor a point and radius was given".into(),
                ))
            }
        };

        debug!(geographic = ?region.geographic, projected = ?region.projected, "resolved area");
        Ok(region)
    }

    fn from_bbox([min_lon, min_lat, max_lon, max_lat]: [f64; 4]) -> crate::Result<BoundingRegion> {
        check_lon(min_lon)?;
        check_lon(max_lon)?;
        check_lat(min_lat)?;
        check_lat(max_lat)?;
        if min_lon > max_lon || min_lat > max_lat {
            return Err(Error::InvalidAreaSpec(format!(
                "bbox corners are swapped: [{min_lon}, {min_lat}, {max_lon}, {max_lat}]"
            )));
        }

        Ok(BoundingRegion::from_geographic(Rect::new(
            geo::coord! { x: min_lon, y: min_lat },
            geo::coord! { x: max_lon, y: max_lat },
        )))
    }

    fn from_point(lat: f64, lon: f64, radius: f64) -> crate::Result<BoundingRegion> {
        check_lon(lon)?;
        check_lat(lat)?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidAreaSpec(format!(
                "radius must be positive, got {radius}"
            )));
        }

        let center = mercator::forward(geo::coord! { x: lon, y: lat });
        Ok(BoundingRegion::from_projected(mercator::square_around(
            center, radius,
        )))
    }
}

fn check_lon(lon: f64) -> crate::Result<()> {
    if lon.is_finite() && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(Error::InvalidAreaSpec(format!("longitude out of range: {lon}")))
    }
}

fn check_lat(lat: f64) -> crate::Result<()> {
    let max = mercator::MAX_LATITUDE;
    if lat.is_finite() && (-max..=max).contains(&lat) {
        Ok(())
    } else {
        Err(Error::InvalidAreaSpec(format!(
            "latitude out of the Mercator range: {lat}"
        )))
    }
}
