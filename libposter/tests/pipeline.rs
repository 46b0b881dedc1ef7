use std::cell::Cell;
use std::io::Write;

use geo::{Geometry, LineString, Rect};
use libposter::{
    feature::{Crs, Feature, FeatureCollection, Properties},
    path::LayerPaths,
    poster::{Poster, PosterPipeline},
    source::{FetchError, GeometrySource, PolygonAsset},
    AreaResolver, Error, TagQuery,
};
use serde_json::json;

fn source<F>(f: F) -> GeometrySource<F>
where
    F: Fn(Rect<f64>, &TagQuery) -> Result<FeatureCollection, FetchError>,
{
    GeometrySource::new(f)
}

fn poster(area: serde_json::Value, layers: serde_json::Value) -> Poster {
    serde_json::from_value(json!({
        "dir_name": "test",
        "poster_name": "delft",
        "area": area,
        "template": {
            "width": 400, "height": 600, "background_fill": "#fff",
            "map_offset": 20, "bottom_area_height": 100
        },
        "map_layers": layers
    }))
    .unwrap()
}

fn area() -> serde_json::Value {
    json!({"bbox": [4.0, 52.0, 4.1, 52.05]})
}

fn tagged(geometry: Geometry<f64>, key: &str, value: &str) -> Feature {
    let mut properties = Properties::new();
    properties.insert(key.into(), value.into());
    Feature::with_properties(geometry, properties)
}

fn street(id: u64, highway: serde_json::Value, lat: f64) -> Feature {
    let mut properties = Properties::new();
    properties.insert("highway".into(), highway);
    properties.insert("element_type".into(), "way".into());
    properties.insert("osmid".into(), id.into());
    Feature::with_properties(
        Geometry::LineString(LineString::from(vec![(4.01, lat), (4.09, lat)])),
        properties,
    )
}

fn layer<'p>(paths: &'p [LayerPaths], id: &str) -> &'p LayerPaths {
    paths.iter().find(|l| l.id() == id).unwrap()
}

#[test]
fn degenerate_area_fails_before_fetching() {
    let calls = Cell::new(0);
    let source = source(|_, _| {
        calls.set(calls.get() + 1);
        Ok(FeatureCollection::empty(Crs::Geographic))
    });
    let poster = poster(
        json!({"bbox": [1.0, 0.0, 1.0, 1.0]}),
        json!({"buildings": {"tags": "building", "fill": "#ccc"}}),
    );

    let result = PosterPipeline::new(&source, AreaResolver::default()).render(&poster);

    assert!(matches!(result, Err(Error::DegenerateArea { width, .. }) if width == 0.0));
    assert_eq!(calls.get(), 0);
}

#[test]
fn failing_upstream_gives_empty_layers() {
    let source = source(|_, _| Err(FetchError::Remark("runtime error: out of memory".into())));
    let poster = poster(
        area(),
        json!({
            "land": {"fill": "#eee"},
            "buildings": {"tags": "building", "fill": "#ccc"},
            "streets": {"base_width": 1, "types": {"primary": {"stroke": "#000"}}}
        }),
    );

    let paths = PosterPipeline::new(&source, AreaResolver::default())
        .render(&poster)
        .unwrap();

    assert_eq!(paths.layers.len(), 3);
    assert_eq!(layer(&paths.layers, "buildings").path_count(), 0);
    assert_eq!(layer(&paths.layers, "streets").path_count(), 0);
}

#[test]
fn streets_grouped_by_style_table() {
    let source = source(|_, tags| {
        assert!(tags.0.get("highway").is_some());
        Ok(FeatureCollection::new(
            Crs::Geographic,
            vec![
                street(1, json!("residential"), 52.01),
                street(2, json!("residential"), 52.02),
                street(3, json!("primary"), 52.03),
                // same road again under other ids, dropped
                street(4, json!(["primary", "trunk"]), 52.03),
                street(5, json!("primary"), 52.03),
            ],
        ))
    });
    let poster = poster(
        area(),
        json!({"streets": {
            "base_width": 2,
            "types": {
                "primary": {"stroke": "#000", "relative_width": 2},
                "residential": {"stroke": "#666"}
            }
        }}),
    );

    let paths = PosterPipeline::new(&source, AreaResolver::default())
        .render(&poster)
        .unwrap();

    let LayerPaths::Ways { groups, .. } = layer(&paths.layers, "streets") else {
        panic!("streets are ways");
    };
    let shape: Vec<_> = groups
        .iter()
        .map(|g| (g.label.as_str(), g.paths.len(), g.stroke_width))
        .collect();
    assert_eq!(shape, [("primary", 1, 4.0), ("residential", 2, 2.0)]);
}

#[test]
fn sea_and_inland_water_merge() {
    let mut sea = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
    write!(
        sea,
        r#"{{"type": "FeatureCollection", "features": [
            {{"type": "Feature", "properties": {{}},
              "geometry": {{"type": "Polygon", "coordinates": [[[3.9,51.9],[4.05,51.9],[4.05,52.1],[3.9,52.1],[3.9,51.9]]]}}}}
        ]}}"#
    )
    .unwrap();

    let source = source(|_, tags| {
        let features = if tags.0.get("natural").is_some() {
            vec![tagged(
                Geometry::Polygon(Rect::new((4.04, 52.01), (4.06, 52.02)).to_polygon()),
                "natural",
                "water",
            )]
        } else {
            vec![]
        };
        Ok(FeatureCollection::new(Crs::Geographic, features))
    })
    .with_water(PolygonAsset::new(sea.path()));

    let poster = poster(area(), json!({"water": {"fill": "#9cf"}}));
    let paths = PosterPipeline::new(&source, AreaResolver::default())
        .render(&poster)
        .unwrap();

    // the lake overlaps the sea, both become one shape
    assert_eq!(layer(&paths.layers, "water").path_count(), 1);
}

#[test]
fn missing_water_asset_is_fatal() {
    let source = source(|_, _| Ok(FeatureCollection::empty(Crs::Geographic)))
        .with_water(PolygonAsset::new("/does/not/exist.geojson"));
    let poster = poster(area(), json!({"water": {"fill": "#9cf"}}));

    assert!(matches!(
        PosterPipeline::new(&source, AreaResolver::default()).render(&poster),
        Err(Error::AssetRead { .. })
    ));
}

#[test]
fn circuit_from_custom_endpoint() {
    let x0 = mercator::lon_to_x(4.02);
    let x1 = mercator::lon_to_x(4.08);
    let y = mercator::lat_to_y(52.02);
    let answer = json!({"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {},
         "geometry": {"type": "MultiLineString", "coordinates": [[[x0, y], [x1, y]], [[x0, y], [x0, y + 100.0]]]}}
    ]})
    .to_string();

    let source = source(|_, _| Ok(FeatureCollection::empty(Crs::Geographic)))
        .with_query(move |selector: &str| -> libposter::Result<String> {
            assert_eq!(selector, "zandvoort");
            Ok(answer.clone())
        });
    let poster = poster(
        area(),
        json!({"circut": {"selector": "zandvoort", "style": {"stroke": "red"}}}),
    );

    let paths = PosterPipeline::new(&source, AreaResolver::default())
        .render(&poster)
        .unwrap();
    assert_eq!(layer(&paths.layers, "circut").path_count(), 2);
}

#[test]
fn malformed_custom_answer_is_fatal() {
    let source = source(|_, _| Ok(FeatureCollection::empty(Crs::Geographic)))
        .with_query(|_: &str| -> libposter::Result<String> { Ok("Too Many Requests".into()) });
    let poster = poster(area(), json!({"circuit": {"selector": "monza"}}));

    assert!(matches!(
        PosterPipeline::new(&source, AreaResolver::default()).render(&poster),
        Err(Error::MalformedResponse(_))
    ));
}

#[test]
fn layer_order_is_file_order() {
    let source = source(|_, _| Ok(FeatureCollection::empty(Crs::Geographic)));
    let poster = poster(
        area(),
        json!({
            "land": {"fill": "#eee"},
            "parks": {"tags": {"leisure": "park"}, "fill": "#0f0"},
            "buildings": {"tags": "building", "fill": "#ccc"}
        }),
    );

    let paths = PosterPipeline::new(&source, AreaResolver::default())
        .render(&poster)
        .unwrap();
    let ids: Vec<_> = paths.layers.iter().map(LayerPaths::id).collect();
    assert_eq!(ids, ["land", "parks", "buildings"]);
}

#[test]
fn geojson_dump_per_layer() {
    let dir = tempfile::tempdir().unwrap();
    let source = source(|_, _| {
        Ok(FeatureCollection::new(
            Crs::Geographic,
            vec![tagged(
                Geometry::Polygon(Rect::new((4.02, 52.01), (4.03, 52.02)).to_polygon()),
                "building",
                "yes",
            )],
        ))
    });
    let poster = poster(area(), json!({"buildings": {"tags": "building", "fill": "#ccc"}}));

    PosterPipeline::new(&source, AreaResolver::default())
        .with_geojson_dump(dir.path())
        .render(&poster)
        .unwrap();

    let dumped: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("buildings.geojson")).unwrap(),
    )
    .unwrap();
    assert_eq!(dumped["features"].as_array().unwrap().len(), 1);
}
