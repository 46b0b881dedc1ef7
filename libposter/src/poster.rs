//! Poster description and the per-poster pipeline.

use std::path::{Path as FsPath, PathBuf};

use geo::Polygon;
use serde::{Deserialize, Serialize};

use crate::{
    area::{AreaDescriptor, AreaResolver, BoundingRegion},
    feature::{Areas, FeatureCollection},
    layer::{deserialize_layers, LayerSpec, NamedLayer, TagQuery},
    path::{area_paths, group_ways, line_paths, LayerPaths},
    project::PosterProjector,
    scale::Canvas,
    source::{GeometrySource, QueryEndpoint, TagService},
    transform::GeometryTransformer,
};

/// Tags of inland water merged into the `water` layer.
const INLAND_WATER: [&str; 2] = ["water", "bay"];

/// Attribute holding the street class of a way.
const STREET_LABEL: &str = "highway";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub width: f64,
    pub height: f64,
    pub background_fill: String,
    pub map_offset: f64,
    pub bottom_area_height: f64,
    #[serde(default)]
    pub text_boxes: Vec<TextBox>,
}

impl Template {
    pub fn page(&self) -> crate::Result<Canvas> {
        Canvas::new(0.0, 0.0, self.width, self.height)
    }

    /// Part of the page the map is drawn in: inset by `map_offset` on every
    /// side, with the bottom text area cut off.
    pub fn map_space(&self) -> crate::Result<Canvas> {
        let offset = self.map_offset;
        Canvas::new(
            offset,
            offset,
            self.width - 2.0 * offset,
            self.height - 2.0 * offset - self.bottom_area_height,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Poster {
    pub dir_name: String,
    pub poster_name: String,
    pub area: AreaDescriptor,
    pub template: Template,
    #[serde(deserialize_with = "deserialize_layers")]
    pub map_layers: Vec<NamedLayer>,
}

impl Poster {
    pub fn load(path: impl AsRef<FsPath>) -> crate::Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// `<root>/<dir_name>/<poster_name>.<extension>`
    pub fn output_path(&self, root: impl AsRef<FsPath>, extension: &str) -> PathBuf {
        root.as_ref()
            .join(&self.dir_name)
            .join(format!("{}.{extension}", self.poster_name))
    }
}

/// A poster reduced to drawable paths, ready for a writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosterPaths {
    pub page: Canvas,
    pub map_space: Canvas,
    pub template: Template,
    pub layers: Vec<LayerPaths>,
}

/// Everything derived from the area and the canvas, computed once per
/// poster before any layer is fetched.
struct Frame {
    region: BoundingRegion,
    projector: PosterProjector,
    transformer: GeometryTransformer,
}

pub struct PosterPipeline<'a, S, Q> {
    source: &'a GeometrySource<S, Q>,
    resolver: AreaResolver,
    dump_dir: Option<PathBuf>,
}

impl<'a, S, Q> PosterPipeline<'a, S, Q>
where
    S: TagService,
    Q: QueryEndpoint,
{
    pub fn new(source: &'a GeometrySource<S, Q>, resolver: AreaResolver) -> Self {
        Self {
            source,
            resolver,
            dump_dir: None,
        }
    }

    /// Also write every layer's poster-space features to
    /// `<dir>/<layer>.geojson`.
    pub fn with_geojson_dump(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    fn dump<G>(&self, layer: &str, collection: &FeatureCollection<G>) -> crate::Result<()>
    where
        G: Clone,
        for<'g> geojson::Value: From<&'g G>,
    {
        let Some(dir) = &self.dump_dir else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;
        let file = std::fs::File::create(dir.join(format!("{layer}.geojson")))?;
        crate::ser::write_geojson(std::io::BufWriter::new(file), collection.clone())
    }

    #[tracing::instrument(skip_all, fields(poster = %poster.poster_name))]
    pub fn render(&self, poster: &Poster) -> crate::Result<PosterPaths> {
        let page = poster.template.page()?;
        let map_space = poster.template.map_space()?;

        let region = self.resolver.resolve(&poster.area)?;
        let projector = PosterProjector::for_region(&region, &map_space)?;
        info!(scale = projector.scale(), layers = poster.map_layers.len(), "creating map");

        let frame = Frame {
            region,
            projector,
            transformer: GeometryTransformer::new(&region),
        };

        let layers = poster
            .map_layers
            .iter()
            .map(|layer| self.layer(&frame, layer))
            .collect::<crate::Result<Vec<_>>>()?;

        info!("map created");
        Ok(PosterPaths {
            page,
            map_space,
            template: poster.template.clone(),
            layers,
        })
    }

    #[tracing::instrument(skip_all, fields(layer = %layer.name))]
    fn layer(&self, frame: &Frame, layer: &NamedLayer) -> crate::Result<LayerPaths> {
        let id = layer.name.clone();
        let paths = match &layer.spec {
            LayerSpec::Land(land) => LayerPaths::Background {
                id,
                fill: land.fill.clone(),
            },
            LayerSpec::Water(water) => {
                let areas = self.water(frame)?;
                self.dump(&id, &areas)?;
                LayerPaths::Areas {
                    id,
                    fill: water.fill.clone(),
                    paths: area_paths(&areas),
                }
            }
            LayerSpec::Streets(streets) => {
                let raw = self.source.tagged(&frame.region, &streets.query());
                let lines = frame.transformer.lines(raw, STREET_LABEL)?;
                let lines = frame.projector.project_collection(lines)?;
                self.dump(&id, &lines)?;
                LayerPaths::Ways {
                    id,
                    groups: group_ways(&lines, STREET_LABEL, &streets.types, streets.base_width),
                }
            }
            LayerSpec::Circuit(circuit) => {
                let raw = self.source.custom(&circuit.selector)?;
                let lines = frame.transformer.projected_lines(raw)?;
                let lines = frame.projector.project_collection(lines)?;
                self.dump(&id, &lines)?;
                LayerPaths::Lines {
                    id,
                    style: circuit.style.clone(),
                    paths: line_paths(&lines),
                }
            }
            LayerSpec::Generic(generic) => {
                let raw = self.source.tagged(&frame.region, &generic.tags);
                let areas = frame.projector.project_collection(frame.transformer.areas(raw)?)?;
                self.dump(&id, &areas)?;
                LayerPaths::Areas {
                    id,
                    fill: generic.fill.clone(),
                    paths: area_paths(&areas),
                }
            }
        };
        debug!(paths = paths.path_count(), "layer done");
        Ok(paths)
    }

    /// Sea polygons and inland water, each clipped and filtered on its own,
    /// then merged into one area collection.
    fn water(&self, frame: &Frame) -> crate::Result<Areas> {
        let t = &frame.transformer;
        let sea = t.prepare::<Polygon<f64>>(self.source.sea_water(&frame.region)?)?;
        let inland = t.prepare::<Polygon<f64>>(
            self.source
                .tagged(&frame.region, &TagQuery::one_of("natural", INLAND_WATER)),
        )?;
        let merged = t.merge(sea.concat(inland)?)?;
        frame.projector.project_collection(t.reproject(merged)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSTER: &str = r##"{
        "dir_name": "cities",
        "poster_name": "rotterdam",
        "area": {"latlon": [51.9225, 4.47917], "radius": 3000},
        "template": {
            "width": 3508, "height": 4961, "background_fill": "#fff",
            "map_offset": 200, "bottom_area_height": 900,
            "text_boxes": [{"x": 1754, "y": 4100, "text": "ROTTERDAM",
                            "font_size": 300, "font_family": "Lato", "fill": "#000"}]
        },
        "map_layers": {"land": {"fill": "#eee"}, "water": {"fill": "#9cf"}}
    }"##;

    #[test]
    fn reads_poster_file() {
        let poster: Poster = serde_json::from_str(POSTER).unwrap();
        assert_eq!(poster.area.radius_m, Some(3000.0));
        assert_eq!(poster.template.text_boxes.len(), 1);
        assert_eq!(poster.map_layers[1].name, "water");
        assert_eq!(
            poster.output_path("renders", "svg"),
            PathBuf::from("renders/cities/rotterdam.svg")
        );
    }

    #[test]
    fn map_space_leaves_room_for_text() {
        let poster: Poster = serde_json::from_str(POSTER).unwrap();
        let space = poster.template.map_space().unwrap();
        assert_eq!(space, Canvas::new(200.0, 200.0, 3108.0, 3661.0).unwrap());
    }

    #[test]
    fn text_area_larger_than_page() {
        let mut poster: Poster = serde_json::from_str(POSTER).unwrap();
        poster.template.bottom_area_height = 5000.0;
        assert!(matches!(
            poster.template.map_space(),
            Err(crate::Error::InvalidCanvas { .. })
        ));
    }
}
