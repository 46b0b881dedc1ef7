use std::fmt::Write;

use geo::Rect;
use reqwest::blocking::Client;

use super::{osm, FetchError, TagService};
use crate::{
    feature::FeatureCollection,
    layer::{TagQuery, TagValue},
};

/// Server-side limit requested in the query header, seconds.
const QUERY_TIMEOUT: u32 = 180;

fn quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn regex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Overpass QL asking for every node, way and relation that matches any of
/// the filters inside `bbox`, with inline geometry.
pub fn overpass_ql(bbox: Rect<f64>, tags: &TagQuery) -> String {
    // (south, west, north, east)
    let area = format!(
        "({},{},{},{})",
        bbox.min().y,
        bbox.min().x,
        bbox.max().y,
        bbox.max().x
    );

    let mut ql = format!("[out:json][timeout:{QUERY_TIMEOUT}];\n(\n");
    for (key, value) in tags.filters() {
        let key = quote(key);
        let filter = match value {
            TagValue::Any(_) => format!("[\"{key}\"]"),
            TagValue::One(v) => format!("[\"{key}\"=\"{}\"]", quote(v)),
            TagValue::Many(values) => {
                let alternatives: Vec<_> = values.iter().map(|v| regex_escape(v)).collect();
                format!("[\"{key}\"~\"^({})$\"]", quote(&alternatives.join("|")))
            }
        };
        // writing to a String cannot fail
        let _ = writeln!(ql, "  nwr{filter}{area};");
    }
    ql.push_str(");\nout geom;");
    ql
}

/// Tag service backed by an Overpass API interpreter.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: Client,
    url: String,
}

impl OverpassClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl TagService for OverpassClient {
    #[tracing::instrument("overpass", skip_all, fields(url = %self.url))]
    fn fetch(&self, bbox: Rect<f64>, tags: &TagQuery) -> Result<FeatureCollection, FetchError> {
        let ql = overpass_ql(bbox, tags);
        trace!(%ql);

        let body = self
            .client
            .post(&self.url)
            .form(&[("data", ql.as_str())])
            .send()?
            .error_for_status()?
            .text()?;

        let response: osm::Response = serde_json::from_str(&body)?;
        if let Some(remark) = response.remark.as_ref().filter(|r| r.contains("error")) {
            return Err(FetchError::Remark(remark.clone()));
        }
        Ok(osm::decode(response))
    }
}
