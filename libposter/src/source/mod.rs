//! Raw geometry for one bounding region.
//!
//! Three origins with different failure rules: tag queries degrade to an
//! empty collection, the water asset and the custom endpoint propagate
//! their errors.

mod asset;
mod osm;
mod overpass;
mod query;

pub use asset::PolygonAsset;
pub use overpass::{overpass_ql, OverpassClient};
pub use query::HttpQueryEndpoint;

use geo::Rect;

use crate::{
    config::SourceConfig,
    feature::{Crs, FeatureCollection},
    layer::TagQuery,
    BoundingRegion,
};

/// Failure of a tag service. Never escapes [`GeometrySource::tagged`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("undecodable answer: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("service remark: {0}")]
    Remark(String),
}

/// Answers tag queries inside a geographic rectangle with EPSG:4326
/// geometry.
pub trait TagService {
    fn fetch(&self, bbox: Rect<f64>, tags: &TagQuery) -> Result<FeatureCollection, FetchError>;
}

impl<F> TagService for F
where
    F: Fn(Rect<f64>, &TagQuery) -> Result<FeatureCollection, FetchError>,
{
    fn fetch(&self, bbox: Rect<f64>, tags: &TagQuery) -> Result<FeatureCollection, FetchError> {
        self(bbox, tags)
    }
}

/// Takes a selector verbatim and answers with a GeoJSON document whose
/// coordinates are already EPSG:3857.
pub trait QueryEndpoint {
    fn submit(&self, selector: &str) -> crate::Result<String>;
}

impl<F> QueryEndpoint for F
where
    F: Fn(&str) -> crate::Result<String>,
{
    fn submit(&self, selector: &str) -> crate::Result<String> {
        self(selector)
    }
}

impl<Q: QueryEndpoint> QueryEndpoint for Option<Q> {
    fn submit(&self, selector: &str) -> crate::Result<String> {
        match self {
            Some(endpoint) => endpoint.submit(selector),
            None => Err(crate::Error::Config("no query endpoint".into())),
        }
    }
}

/// Placeholder endpoint for sources built without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEndpoint;

impl QueryEndpoint for NoEndpoint {
    fn submit(&self, _selector: &str) -> crate::Result<String> {
        Err(crate::Error::Config("no query endpoint".into()))
    }
}

pub type HttpGeometrySource = GeometrySource<OverpassClient, Option<HttpQueryEndpoint>>;

pub struct GeometrySource<S, Q = NoEndpoint> {
    tags: S,
    query: Q,
    water: Option<PolygonAsset>,
}

impl GeometrySource<OverpassClient, Option<HttpQueryEndpoint>> {
    pub fn from_config(config: &SourceConfig) -> crate::Result<HttpGeometrySource> {
        let client = config.http_client()?;
        Ok(GeometrySource {
            tags: OverpassClient::new(client.clone(), &config.overpass_url),
            query: config
                .query_url
                .as_ref()
                .map(|url| HttpQueryEndpoint::new(client, url)),
            water: config.water_polygons.clone().map(PolygonAsset::new),
        })
    }
}

impl<S: TagService> GeometrySource<S> {
    pub fn new(tags: S) -> Self {
        Self {
            tags,
            query: NoEndpoint,
            water: None,
        }
    }
}

impl<S: TagService, Q: QueryEndpoint> GeometrySource<S, Q> {
    pub fn with_query<R: QueryEndpoint>(self, query: R) -> GeometrySource<S, R> {
        GeometrySource {
            tags: self.tags,
            query,
            water: self.water,
        }
    }

    pub fn with_water(mut self, asset: PolygonAsset) -> Self {
        self.water = Some(asset);
        self
    }

    /// Features matching `tags`, or an empty collection if the service
    /// failed.
    #[tracing::instrument(skip_all)]
    pub fn tagged(&self, region: &BoundingRegion, tags: &TagQuery) -> FeatureCollection {
        if tags.is_empty() {
            return FeatureCollection::empty(Crs::Geographic);
        }
        match self.tags.fetch(region.geographic(), tags) {
            Ok(features) => {
                debug!(features = features.len(), "fetched");
                features
            }
            Err(err) => {
                warn!(%err, ?tags, "tag query failed, layer left empty");
                FeatureCollection::empty(Crs::Geographic)
            }
        }
    }

    /// Sea polygons touching the region, empty if no asset is configured.
    pub fn sea_water(&self, region: &BoundingRegion) -> crate::Result<FeatureCollection> {
        match &self.water {
            Some(asset) => asset.read_within(region.geographic()),
            None => {
                debug!("no water asset configured");
                Ok(FeatureCollection::empty(Crs::Geographic))
            }
        }
    }

    /// Lines returned by the custom endpoint, in EPSG:3857.
    #[tracing::instrument(skip(self))]
    pub fn custom(&self, selector: &str) -> crate::Result<FeatureCollection> {
        let body = self.query.submit(selector)?;
        query::decode_projected(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{feature::Feature, AreaDescriptor, AreaResolver};
    use geo::Geometry;
    use std::cell::Cell;

    fn stub<F>(f: F) -> GeometrySource<F>
    where
        F: Fn(Rect<f64>, &TagQuery) -> Result<FeatureCollection, FetchError>,
    {
        GeometrySource::new(f)
    }

    fn nothing(_: Rect<f64>, _: &TagQuery) -> Result<FeatureCollection, FetchError> {
        Ok(FeatureCollection::empty(Crs::Geographic))
    }

    fn region() -> BoundingRegion {
        AreaResolver::default()
            .resolve(&AreaDescriptor::bbox(4.4, 51.9, 4.5, 52.0))
            .unwrap()
    }

    #[test]
    fn failing_service_yields_empty() {
        let source = stub(|_, _| Err(FetchError::Remark("runtime error: timeout".into())));
        let out = source.tagged(&region(), &TagQuery::key("building"));
        assert!(out.is_empty());
        assert_eq!(out.crs(), Crs::Geographic);
    }

    #[test]
    fn service_sees_the_geographic_box() {
        let seen = Cell::new(None);
        let source = stub(|bbox, _| {
            seen.set(Some(bbox));
            Ok(FeatureCollection::new(
                Crs::Geographic,
                vec![Feature::new(Geometry::Point(geo::point! { x: 4.45, y: 51.95 }))],
            ))
        });
        let out = source.tagged(&region(), &TagQuery::key("amenity"));
        assert_eq!(out.len(), 1);
        assert_eq!(seen.get(), Some(region().geographic()));
    }

    #[test]
    fn disabled_query_skips_the_service() {
        let calls = Cell::new(0);
        let source = stub(|_, _| {
            calls.set(calls.get() + 1);
            Ok(FeatureCollection::empty(Crs::Geographic))
        });
        let tags: TagQuery = serde_json::from_str(r#"{"building": false}"#).unwrap();
        assert!(source.tagged(&region(), &tags).is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn no_water_asset_means_no_sea() {
        let source = stub(nothing);
        assert!(source.sea_water(&region()).unwrap().is_empty());
    }

    #[test]
    fn custom_query_without_endpoint() {
        let source = stub(nothing);
        assert!(matches!(source.custom("monza"), Err(crate::Error::Config(_))));
    }

    #[test]
    fn custom_query_errors_propagate() {
        let source = stub(nothing)
            .with_query(|_: &str| -> crate::Result<String> { Ok("<html>busy</html>".into()) });
        assert!(matches!(
            source.custom("monza"),
            Err(crate::Error::MalformedResponse(_))
        ));
    }
}
