//! Normalisation of raw fetched geometry.
//!
//! Order matters: clip to the area, explode multi-part shapes, keep one
//! geometry type, union (areas) or de-duplicate (lines), reproject. Two
//! collections may only be merged together once both went through the
//! first three steps.

mod clip;
mod explode;
mod filter;
mod merge;
mod reproject;

pub use clip::ClipToRect;
pub use explode::{explode, Explode};
pub use filter::KeepKind;
pub use merge::{union_all, Dedup, Merge};
pub use reproject::Reproject;

use geo::{Geometry, LineString, MapCoords, Polygon};

use crate::{
    feature::{Areas, Crs, FeatureCollection, Lines},
    pipe::Pipe,
    BoundingRegion,
};

#[derive(Debug, Clone)]
pub struct GeometryTransformer {
    clip: ClipToRect,
    clip_projected: ClipToRect,
}

impl GeometryTransformer {
    pub fn new(region: &BoundingRegion) -> Self {
        Self {
            clip: ClipToRect::new(region.geographic()),
            clip_projected: ClipToRect::new(region.projected()),
        }
    }

    /// Clip, explode and keep only `G` geometries.
    pub fn prepare<G>(&self, raw: FeatureCollection) -> crate::Result<FeatureCollection<G>>
    where
        G: TryFrom<Geometry<f64>>,
    {
        raw.expect_crs(Crs::Geographic)?;
        (&self.clip)
            .pipe(Explode)
            .pipe(KeepKind::<G>::new())
            .process(raw)
    }

    pub fn merge(&self, areas: Areas) -> crate::Result<Areas> {
        Merge.process(areas)
    }

    pub fn reproject<G>(&self, collection: FeatureCollection<G>) -> crate::Result<FeatureCollection<G>>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        Reproject::new().process(collection)
    }

    /// Every step for an area layer.
    #[tracing::instrument(skip_all, fields(features = raw.len()))]
    pub fn areas(&self, raw: FeatureCollection) -> crate::Result<Areas> {
        let prepared = self.prepare::<Polygon<f64>>(raw)?;
        Merge.pipe(Reproject::new()).process(prepared)
    }

    /// Every step for a line layer. Lines repeating both the coordinates
    /// and the `label` attribute of an earlier one are dropped.
    #[tracing::instrument(skip_all, fields(features = raw.len()))]
    pub fn lines(&self, raw: FeatureCollection, label: &str) -> crate::Result<Lines> {
        let prepared = self.prepare::<LineString<f64>>(raw)?;
        Dedup::labelled(label).pipe(Reproject::new()).process(prepared)
    }

    /// Line layer whose source already answered in EPSG:3857.
    #[tracing::instrument(skip_all, fields(features = raw.len()))]
    pub fn projected_lines(&self, raw: FeatureCollection) -> crate::Result<Lines> {
        raw.expect_crs(Crs::Mercator)?;
        (&self.clip_projected)
            .pipe(Explode)
            .pipe(KeepKind::<LineString<f64>>::new())
            .pipe(Dedup::geometry())
            .process(raw)
    }
}
