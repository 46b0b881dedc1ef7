use geo::MapCoords;

use crate::{
    feature::{Crs, FeatureCollection},
    pipe::Pipe,
};

/// Moves a geographic collection into Web-Mercator metres.
#[derive(Debug)]
pub struct Reproject<G>(std::marker::PhantomData<G>);

impl<G> Reproject<G> {
    pub fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<G> Default for Reproject<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> Pipe for Reproject<G>
where
    G: MapCoords<f64, f64, Output = G>,
{
    type Input = FeatureCollection<G>;
    type Output = FeatureCollection<G>;
    type Error = crate::Error;

    #[tracing::instrument("reproject", skip_all, fields(features = input.len()))]
    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        input.expect_crs(Crs::Geographic)?;
        Ok(input.filter_map(Crs::Mercator, |f| {
            Some(f.map_geometry(|g| mercator::project::<f64, G>(&g)))
        }))
    }
}
