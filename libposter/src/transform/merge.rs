use std::collections::HashSet;

use geo::{BooleanOps, LineString, MultiPolygon, Polygon};

use crate::{
    feature::{Areas, Feature, FeatureCollection, Lines},
    path::label,
    pipe::Pipe,
};

/// Unions every polygon of a collection and explodes the result again, so
/// overlapping or touching shapes come out as one polygon (with holes where
/// the union has them). Attributes do not survive the union.
#[derive(Debug, Default, Clone, Copy)]
pub struct Merge;

pub fn union_all(polygons: impl IntoIterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    let mut polygons = polygons.into_iter();
    let Some(first) = polygons.next() else {
        return MultiPolygon::new(vec![]);
    };

    polygons.fold(MultiPolygon::new(vec![first]), |acc, polygon| {
        acc.union(&MultiPolygon::new(vec![polygon]))
    })
}

impl Pipe for Merge {
    type Input = Areas;
    type Output = Areas;
    type Error = crate::Error;

    #[tracing::instrument("merge", skip_all, fields(features = input.len()))]
    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let crs = input.crs();
        let merged = union_all(input.into_iter().map(|f| f.geometry));
        trace!(merged = merged.0.len());
        Ok(FeatureCollection::new(
            crs,
            merged.into_iter().map(Feature::new).collect(),
        ))
    }
}

/// Drops repeated lines. Two lines are the same when their coordinates are
/// identical and, for a labelled dedup, the first value of the label
/// attribute matches. Other attributes (ids, element types) are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dedup<'k> {
    label: Option<&'k str>,
}

impl<'k> Dedup<'k> {
    pub fn geometry() -> Self {
        Self { label: None }
    }

    pub fn labelled(key: &'k str) -> Self {
        Self { label: Some(key) }
    }
}

fn line_key(line: &LineString<f64>) -> Vec<(u64, u64)> {
    line.coords().map(|c| (c.x.to_bits(), c.y.to_bits())).collect()
}

impl Pipe for Dedup<'_> {
    type Input = Lines;
    type Output = Lines;
    type Error = crate::Error;

    #[tracing::instrument("dedup", skip_all, fields(features = input.len()))]
    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let crs = input.crs();
        let mut seen = HashSet::with_capacity(input.len());
        let output = input.filter_map(crs, |f| {
            let label = self.label.and_then(|key| label(&f.properties, key));
            seen.insert((label, line_key(&f.geometry))).then_some(f)
        });
        trace!(kept = output.len());
        Ok(output)
    }
}
