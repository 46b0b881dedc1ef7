use geo::{Coord, MapCoords};

use crate::{
    feature::{Crs, FeatureCollection},
    pipe::Pipe,
    scale::{Canvas, ScaleFactor},
    BoundingRegion,
};

/// Affine map from Mercator metres to poster units:
/// recenter on the area centroid, flip Y, scale by `s`, move to the canvas
/// center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosterProjector {
    centroid: Coord<f64>,
    scale: f64,
    target: Coord<f64>,
}

impl PosterProjector {
    pub fn new(centroid: Coord<f64>, scale: ScaleFactor, canvas: &Canvas) -> Self {
        Self {
            centroid,
            scale: scale.get(),
            target: canvas.center(),
        }
    }

    pub fn for_region(region: &BoundingRegion, canvas: &Canvas) -> crate::Result<Self> {
        let scale = ScaleFactor::fit(region.projected(), canvas)?;
        Ok(Self::new(region.centroid(), scale, canvas))
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn forward(&self, c: Coord<f64>) -> Coord<f64> {
        let x = c.x - self.centroid.x;
        let y = -(c.y - self.centroid.y);
        geo::coord! {
            x: x * self.scale + self.target.x,
            y: y * self.scale + self.target.y,
        }
    }

    pub fn inverse(&self, c: Coord<f64>) -> Coord<f64> {
        let x = (c.x - self.target.x) / self.scale;
        let y = (c.y - self.target.y) / self.scale;
        geo::coord! {
            x: x + self.centroid.x,
            y: -y + self.centroid.y,
        }
    }

    pub fn project<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geometry.map_coords(|c| self.forward(c))
    }
}

/// [`PosterProjector`] as a pipeline stage over collections of `G`.
#[derive(Debug)]
pub struct ToPoster<'a, G> {
    projector: &'a PosterProjector,
    _g: std::marker::PhantomData<G>,
}

impl PosterProjector {
    pub fn stage<G>(&self) -> ToPoster<'_, G> {
        ToPoster {
            projector: self,
            _g: std::marker::PhantomData,
        }
    }

    pub fn project_collection<G>(
        &self,
        collection: FeatureCollection<G>,
    ) -> crate::Result<FeatureCollection<G>>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        self.stage().process(collection)
    }
}

impl<G> Pipe for ToPoster<'_, G>
where
    G: MapCoords<f64, f64, Output = G>,
{
    type Input = FeatureCollection<G>;
    type Output = FeatureCollection<G>;
    type Error = crate::Error;

    #[tracing::instrument("poster_projection", skip_all, fields(features = input.len()))]
    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        input.expect_crs(Crs::Mercator)?;
        if input.is_empty() {
            return Ok(FeatureCollection::empty(Crs::Poster));
        }
        Ok(input.filter_map(Crs::Poster, |f| {
            Some(f.map_geometry(|g| self.projector.project(&g)))
        }))
    }
}
