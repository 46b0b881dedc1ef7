#[macro_use]
extern crate tracing;

pub mod area;
pub mod config;
pub mod feature;
pub mod layer;
pub mod path;
pub mod pipe;
pub mod poster;
pub mod project;
pub mod scale;
pub mod ser;
pub mod source;
pub mod transform;

pub use area::{AreaDescriptor, AreaResolver, BoundingRegion};
pub use config::SourceConfig;
pub use feature::{Crs, Feature, FeatureCollection};
pub use layer::{LayerSpec, NamedLayer, TagQuery};
pub use path::{LayerPaths, PathCommand};
pub use poster::{Poster, PosterPipeline};
pub use project::PosterProjector;
pub use scale::{Canvas, ScaleFactor};
pub use source::GeometrySource;
pub use transform::GeometryTransformer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid area: {0}")]
    InvalidAreaSpec(String),
    #[error("projected area is degenerate ({width} x {height})")]
    DegenerateArea { width: f64, height: f64 },
    #[error("canvas must have a positive size, got {width} x {height}")]
    InvalidCanvas { width: f64, height: f64 },
    #[error("expected geometry in {expected:?}, found {found:?}")]
    CrsMismatch { expected: Crs, found: Crs },
    #[error("failed to read asset `{}`", path.display())]
    AssetRead {
        path: std::path::PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("not configured: {0}")]
    Config(String),
    #[error("request failed")]
    Fetch(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
