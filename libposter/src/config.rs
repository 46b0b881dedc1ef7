use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_RADIUS_M: f64 = 5000.0;
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_WATER_POLYGONS: &str = "assets/water-polygons-split-4326/water_polygons.geojson";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Where geometry comes from. Passed into the resolver and the sources
/// instead of living in process-wide constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub overpass_url: String,
    /// Endpoint taking verbatim queries and answering with projected
    /// GeoJSON lines. Without it `circuit` layers cannot be drawn.
    pub query_url: Option<String>,
    /// GeoJSON polygons of the sea, EPSG:4326. `None` maps inland water only.
    pub water_polygons: Option<PathBuf>,
    pub default_radius_m: f64,
    pub user_agent: String,
    /// Per-request timeout in seconds, `None` leaves reqwest's default.
    pub timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            query_url: None,
            water_polygons: Some(PathBuf::from(DEFAULT_WATER_POLYGONS)),
            default_radius_m: DEFAULT_RADIUS_M,
            user_agent: USER_AGENT.to_string(),
            timeout_secs: Some(180),
        }
    }
}

impl SourceConfig {
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn http_client(&self) -> crate::Result<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}
