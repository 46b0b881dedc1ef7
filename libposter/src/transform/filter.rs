use geo::Geometry;

use crate::{
    feature::{Feature, FeatureCollection, GeometryKind},
    pipe::Pipe,
};

/// Keeps the features whose geometry is a `G` and narrows the collection to
/// that type; everything else is discarded.
#[derive(Debug)]
pub struct KeepKind<G>(std::marker::PhantomData<G>);

impl<G> KeepKind<G> {
    pub fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<G> Default for KeepKind<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> Pipe for KeepKind<G>
where
    G: TryFrom<Geometry<f64>>,
{
    type Input = FeatureCollection;
    type Output = FeatureCollection<G>;
    type Error = crate::Error;

    #[tracing::instrument("keep_kind", skip_all, fields(features = input.len(), kind = std::any::type_name::<G>()))]
    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let crs = input.crs();
        let mut dropped = [0usize; 4];
        let output = input.filter_map(crs, |Feature { geometry, properties }| {
            let kind = GeometryKind::of(&geometry);
            match G::try_from(geometry) {
                Ok(geometry) => Some(Feature::with_properties(geometry, properties)),
                Err(_) => {
                    dropped[kind as usize] += 1;
                    None
                }
            }
        });
        let [points, paths, areas, other] = dropped;
        trace!(kept = output.len(), points, paths, areas, other);
        Ok(output)
    }
}
