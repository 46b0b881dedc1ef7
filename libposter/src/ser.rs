use std::io::Write;
use std::path::Path as FsPath;

use indexmap::IndexMap;
use serde_json::Value;
use svg::{
    node::{self, element},
    Document,
};

use crate::{
    feature::FeatureCollection,
    path::{LayerPaths, Path},
    pipe::Pipe,
    poster::{PosterPaths, TextBox},
    scale::Canvas,
    Error,
};

const MASK_ID: &str = "map-space-mask";
const CLIP_ID: &str = "map-space-clip";

fn rect(canvas: &Canvas) -> element::Rectangle {
    element::Rectangle::new()
        .set("x", canvas.x)
        .set("y", canvas.y)
        .set("width", canvas.width)
        .set("height", canvas.height)
}

fn path(path: &Path) -> element::Path {
    element::Path::new().set("d", path.to_string())
}

fn attribute(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn stroked(id: &str) -> element::Group {
    element::Group::new()
        .set("id", id)
        .set("fill", "none")
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round")
}

fn layer(layer: &LayerPaths, page: &Canvas) -> element::Group {
    match layer {
        LayerPaths::Background { id, fill } => {
            element::Group::new().add(rect(page).set("id", id.as_str()).set("fill", fill.as_str()))
        }
        LayerPaths::Areas { id, fill, paths } => paths.iter().fold(
            element::Group::new()
                .set("id", id.as_str())
                .set("fill", fill.as_str())
                .set("fill-rule", "evenodd"),
            |group, p| group.add(path(p)),
        ),
        LayerPaths::Ways { id, groups } => groups.iter().fold(stroked(id), |outer, ways| {
            outer.add(ways.paths.iter().fold(
                element::Group::new()
                    .set("id", ways.label.as_str())
                    .set("stroke", ways.stroke.as_str())
                    .set("stroke-width", ways.stroke_width),
                |group, p| group.add(path(p)),
            ))
        }),
        LayerPaths::Lines { id, style, paths } => {
            let group = styled(stroked(id), style);
            paths.iter().fold(group, |group, p| group.add(path(p)))
        }
    }
}

/// `stroke_width` style keys become `stroke-width` attributes.
fn styled(group: element::Group, style: &IndexMap<String, Value>) -> element::Group {
    style.iter().fold(group, |group, (key, value)| {
        group.set(key.replace('_', "-"), attribute(value))
    })
}

fn text(tb: &TextBox) -> element::Text {
    element::Text::new()
        .set("x", tb.x)
        .set("y", tb.y)
        .set("font-size", tb.font_size)
        .set("font-family", tb.font_family.as_str())
        .set("fill", tb.fill.as_str())
        .set("dominant-baseline", "hanging")
        .set("text-anchor", "middle")
        .add(node::Text::new(tb.text.as_str()))
}

/// Full poster: the map clipped to the map space, the page background with
/// a hole over the map, then the text boxes.
pub fn document(poster: &PosterPaths) -> Document {
    let page = &poster.page;

    let defs = element::Definitions::new()
        .add(
            element::Mask::new()
                .set("id", MASK_ID)
                .add(rect(page).set("fill", "white"))
                .add(rect(&poster.map_space).set("fill", "black")),
        )
        .add(
            element::ClipPath::new()
                .set("id", CLIP_ID)
                .add(rect(&poster.map_space)),
        );

    let map = poster.layers.iter().fold(
        element::Group::new()
            .set("id", "map")
            .set("clip-path", format!("url(#{CLIP_ID})")),
        |map, l| map.add(layer(l, page)),
    );

    let template = element::Group::new()
        .set("id", "template")
        .set("mask", format!("url(#{MASK_ID})"))
        .add(
            rect(page)
                .set("id", "bg")
                .set("fill", poster.template.background_fill.as_str()),
        );

    let text_area = poster
        .template
        .text_boxes
        .iter()
        .fold(element::Group::new().set("id", "text_area"), |g, tb| {
            g.add(text(tb))
        });

    Document::new()
        .set("width", page.width)
        .set("height", page.height)
        .set("viewBox", format!("{} {} {} {}", page.x, page.y, page.width, page.height))
        .add(defs)
        .add(map)
        .add(template)
        .add(text_area)
}

fn create_parent(path: &FsPath) -> crate::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(std::fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

pub fn save_svg(path: impl AsRef<FsPath>, poster: &PosterPaths) -> crate::Result<()> {
    let path = path.as_ref();
    create_parent(path)?;
    info!(path = %path.display(), layers = poster.layers.len(), "writing svg");
    Ok(svg::save(path, &document(poster))?)
}

pub fn save_json(path: impl AsRef<FsPath>, poster: &PosterPaths) -> crate::Result<()> {
    let path = path.as_ref();
    create_parent(path)?;
    info!(path = %path.display(), "writing path payload");
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    Ok(serde_json::to_writer(file, poster)?)
}

/// Converts a collection to a GeoJSON feature collection.
#[derive(Debug)]
pub struct ToGeojson<G> {
    _g: std::marker::PhantomData<G>,
}

impl<G> ToGeojson<G> {
    pub fn new() -> Self {
        Self {
            _g: std::marker::PhantomData,
        }
    }
}

impl<G> Default for ToGeojson<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> Pipe for ToGeojson<G>
where
    for<'g> geojson::Value: From<&'g G>,
{
    type Input = FeatureCollection<G>;
    type Output = geojson::FeatureCollection;
    type Error = Error;

    fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let features = input
            .into_iter()
            .map(|f| geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
                id: None,
                properties: Some(f.properties),
                foreign_members: None,
            })
            .collect();
        Ok(geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}

pub fn write_geojson<W, G>(writer: W, collection: FeatureCollection<G>) -> crate::Result<()>
where
    W: Write,
    for<'g> geojson::Value: From<&'g G>,
{
    let collection = ToGeojson::new().process(collection)?;
    info!("Writing {} features to geojson", collection.features.len());
    Ok(serde_json::to_writer(writer, &collection)?)
}
