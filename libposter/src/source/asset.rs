use std::path::{Path, PathBuf};

use geo::{BoundingRect, Geometry, Intersects, Rect};

use crate::{
    feature::{Crs, Feature, FeatureCollection},
    Error,
};

/// Polygon file on disk, EPSG:4326 GeoJSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonAsset {
    path: PathBuf,
}

impl PolygonAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Error {
        Error::AssetRead {
            path: self.path.clone(),
            source: source.into(),
        }
    }

    fn read_all(&self) -> crate::Result<Vec<Feature>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        let geojson: geojson::GeoJson = text.parse().map_err(|e: geojson::Error| self.error(e))?;
        let collection = geojson::FeatureCollection::try_from(geojson).map_err(|e| self.error(e))?;

        collection
            .features
            .into_iter()
            .filter_map(|f| {
                let properties = f.properties.unwrap_or_default();
                f.geometry.map(|g| {
                    Geometry::<f64>::try_from(g)
                        .map(|g| Feature::with_properties(g, properties))
                        .map_err(|e| self.error(e))
                })
            })
            .collect()
    }

    /// Features whose bounding box touches `area`, in file order.
    #[tracing::instrument("asset", skip_all, fields(path = %self.path.display()))]
    pub fn read_within(&self, area: Rect<f64>) -> crate::Result<FeatureCollection> {
        let mut all = self.read_all()?;
        let total = all.len();

        all.retain(|f| {
            f.geometry
                .bounding_rect()
                .map_or(false, |bounds| bounds.intersects(&area))
        });
        debug!(total, hits = all.len());

        Ok(FeatureCollection::new(Crs::Geographic, all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn asset(json: &str) -> (tempfile::NamedTempFile, PolygonAsset) {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let asset = PolygonAsset::new(file.path());
        (file, asset)
    }

    const SEA: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"tile": 1},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
        {"type": "Feature", "properties": {"tile": 2},
         "geometry": {"type": "Polygon", "coordinates": [[[50,50],[51,50],[51,51],[50,51],[50,50]]]}},
        {"type": "Feature", "properties": {"tile": 3},
         "geometry": {"type": "Polygon", "coordinates": [[[0.5,0.5],[3,0.5],[3,3],[0.5,3],[0.5,0.5]]]}}
    ]}"#;

    #[test]
    fn only_touching_polygons_in_file_order() {
        let (_guard, asset) = asset(SEA);
        let fc = asset.read_within(Rect::new((0.8, 0.8), (2.0, 2.0))).unwrap();
        assert_eq!(fc.crs(), Crs::Geographic);
        let tiles: Vec<_> = fc.features().iter().map(|f| f.properties["tile"].clone()).collect();
        assert_eq!(tiles, vec![serde_json::json!(1), serde_json::json!(3)]);
    }

    #[test]
    fn missing_file() {
        let asset = PolygonAsset::new("/nonexistent/water.geojson");
        let err = asset.read_within(Rect::new((0.0, 0.0), (1.0, 1.0))).unwrap_err();
        assert!(matches!(err, Error::AssetRead { ref path, .. } if path == asset.path()));
    }

    #[test]
    fn unreadable_contents() {
        let (_guard, asset) = asset("this is not json");
        assert!(matches!(
            asset.read_within(Rect::new((0.0, 0.0), (1.0, 1.0))),
            Err(Error::AssetRead { .. })
        ));
    }
}
