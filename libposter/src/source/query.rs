use geo::Geometry;
use reqwest::blocking::Client;

use super::QueryEndpoint;
use crate::{
    feature::{Crs, Feature, FeatureCollection},
    Error,
};

/// Posts the selector as the request body and returns the answer verbatim.
#[derive(Debug, Clone)]
pub struct HttpQueryEndpoint {
    client: Client,
    url: String,
}

impl HttpQueryEndpoint {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl QueryEndpoint for HttpQueryEndpoint {
    #[tracing::instrument("query_endpoint", skip_all, fields(url = %self.url))]
    fn submit(&self, selector: &str) -> crate::Result<String> {
        let body = self
            .client
            .post(&self.url)
            .body(selector.to_owned())
            .send()?
            .error_for_status()?
            .text()?;
        trace!(bytes = body.len(), "answer");
        Ok(body)
    }
}

/// Reads a GeoJSON feature collection whose coordinates are EPSG:3857.
pub(super) fn decode_projected(body: &str) -> crate::Result<FeatureCollection> {
    let malformed = |what: String| Error::MalformedResponse(what);

    let geojson: geojson::GeoJson = body.parse().map_err(|e: geojson::Error| malformed(e.to_string()))?;
    let collection = geojson::FeatureCollection::try_from(geojson)
        .map_err(|e| malformed(format!("expected a feature collection: {e}")))?;

    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            trace!("feature without geometry");
            continue;
        };
        let geometry = Geometry::<f64>::try_from(geometry).map_err(|e| malformed(e.to_string()))?;
        features.push(Feature::with_properties(
            geometry,
            feature.properties.unwrap_or_default(),
        ));
    }
    Ok(FeatureCollection::new(Crs::Mercator, features))
}
