//! Poster-space geometry to drawable path commands.

use std::fmt;

use geo::{LineString, Polygon};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
    feature::{Areas, Lines, Properties},
    layer::WayStyle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathOp {
    Move,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathCommand {
    pub op: PathOp,
    pub x: f64,
    pub y: f64,
}

/// Vertices in their original order, one move per sub-path.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Path(Vec<PathCommand>);

impl Path {
    fn push_ring(&mut self, ring: &LineString<f64>) {
        for (i, c) in ring.coords().enumerate() {
            let op = if i == 0 { PathOp::Move } else { PathOp::Line };
            self.0.push(PathCommand { op, x: c.x, y: c.y });
        }
    }

    /// Exterior ring followed by every hole.
    pub fn area(polygon: &Polygon<f64>) -> Self {
        let mut path = Path::default();
        path.push_ring(polygon.exterior());
        for hole in polygon.interiors() {
            path.push_ring(hole);
        }
        path
    }

    pub fn line(line: &LineString<f64>) -> Self {
        let mut path = Path::default();
        path.push_ring(line);
        path
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn subpaths(&self) -> usize {
        self.0.iter().filter(|c| c.op == PathOp::Move).count()
    }
}

/// SVG path data, `M x y L x y ...`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let op = match c.op {
                PathOp::Move => 'M',
                PathOp::Line => 'L',
            };
            write!(f, "{op}{} {}", c.x, c.y)?;
        }
        Ok(())
    }
}

pub fn area_paths(areas: &Areas) -> Vec<Path> {
    areas.geometries().map(Path::area).collect()
}

pub fn line_paths(lines: &Lines) -> Vec<Path> {
    lines
        .geometries()
        .map(Path::line)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Sub-type label of a feature. For list values only the first entry
/// counts.
pub fn label(properties: &Properties, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(values) => values.first().and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayGroup {
    pub label: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub paths: Vec<Path>,
}

/// One group per entry of `table`, in table order. Lines whose label is
/// missing from the table are not drawn.
pub fn group_ways(
    lines: &Lines,
    key: &str,
    table: &IndexMap<String, WayStyle>,
    base_width: f64,
) -> Vec<WayGroup> {
    let labels: Vec<Option<String>> = lines
        .features()
        .iter()
        .map(|f| label(&f.properties, key))
        .collect();

    let groups: Vec<WayGroup> = table
        .iter()
        .map(|(name, style)| WayGroup {
            label: name.to_owned(),
            stroke: style.stroke.clone(),
            stroke_width: base_width * style.relative_width,
            paths: lines
                .geometries()
                .zip(&labels)
                .filter(|(_, l)| l.as_deref() == Some(name.as_str()))
                .map(|(g, _)| Path::line(g))
                .collect(),
        })
        .collect();

    let drawn: usize = groups.iter().map(|g| g.paths.len()).sum();
    if drawn < lines.len() {
        debug!(unstyled = lines.len() - drawn, "lines without a style");
    }
    groups
}

/// Everything needed to draw one layer, in poster coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerPaths {
    Background {
        id: String,
        fill: String,
    },
    Areas {
        id: String,
        fill: String,
        paths: Vec<Path>,
    },
    Ways {
        id: String,
        groups: Vec<WayGroup>,
    },
    Lines {
        id: String,
        style: IndexMap<String, Value>,
        paths: Vec<Path>,
    },
}

impl LayerPaths {
    pub fn id(&self) -> &str {
        match self {
            LayerPaths::Background { id, .. }
            | LayerPaths::Areas { id, .. }
            | LayerPaths::Ways { id, .. }
            | LayerPaths::Lines { id, .. } => id,
        }
    }

    pub fn path_count(&self) -> usize {
        match self {
            LayerPaths::Background { .. } => 0,
            LayerPaths::Areas { paths, .. } | LayerPaths::Lines { paths, .. } => paths.len(),
            LayerPaths::Ways { groups, .. } => groups.iter().map(|g| g.paths.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Crs, Feature, FeatureCollection};
    use serde_json::json;

    fn street(kind: Value, x: f64) -> Feature<LineString<f64>> {
        let mut properties = Properties::new();
        properties.insert("highway".into(), kind);
        Feature::with_properties(vec![(x, 0.0), (x, 10.0)].into(), properties)
    }

    fn table() -> IndexMap<String, WayStyle> {
        serde_json::from_value(json!({
            "primary": {"stroke": "#111", "relative_width": 3.0},
            "residential": {"stroke": "#999"}
        }))
        .unwrap()
    }

    #[test]
    fn polygon_with_hole() {
        let outer = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        let path = Path::area(&Polygon::new(outer, vec![hole]));

        assert_eq!(path.subpaths(), 2);
        let ops: Vec<_> = path.commands().iter().map(|c| c.op).collect();
        assert_eq!(ops[0], PathOp::Move);
        assert_eq!(ops[4], PathOp::Move);
        assert!(ops[1..4].iter().chain(&ops[5..]).all(|op| *op == PathOp::Line));
        assert_eq!((path.commands()[4].x, path.commands()[4].y), (1.0, 1.0));
    }

    #[test]
    fn vertex_order_is_kept() {
        let line = LineString::from(vec![(3.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        assert_eq!(Path::line(&line).to_string(), "M3 1 L1 2 L2 3");
    }

    #[test]
    fn streets_grouped_in_table_order() {
        let lines = FeatureCollection::new(
            Crs::Poster,
            vec![
                street(json!("residential"), 0.0),
                street(json!("residential"), 1.0),
                street(json!("primary"), 2.0),
            ],
        );
        let groups = group_ways(&lines, "highway", &table(), 2.0);

        let shape: Vec<_> = groups.iter().map(|g| (g.label.as_str(), g.paths.len())).collect();
        assert_eq!(shape, [("primary", 1), ("residential", 2)]);
        assert_eq!(groups[0].stroke_width, 6.0);
        assert_eq!(groups[1].stroke_width, 2.0);
    }

    #[test]
    fn list_labels_use_the_first_entry() {
        let lines = FeatureCollection::new(
            Crs::Poster,
            vec![
                street(json!(["residential", "primary"]), 0.0),
                street(json!("footway"), 1.0),
                street(json!(null), 2.0),
            ],
        );
        let groups = group_ways(&lines, "highway", &table(), 1.0);
        assert_eq!(groups[0].paths.len(), 0);
        assert_eq!(groups[1].paths.len(), 1);
    }

    #[test]
    fn payload_shape() {
        let layer = LayerPaths::Areas {
            id: "buildings".into(),
            fill: "#ccc".into(),
            paths: vec![Path::line(&LineString::from(vec![(0.0, 0.0), (1.0, 0.5)]))],
        };
        assert_eq!(
            serde_json::to_value(&layer).unwrap(),
            json!({
                "kind": "areas",
                "id": "buildings",
                "fill": "#ccc",
                "paths": [[
                    {"op": "move", "x": 0.0, "y": 0.0},
                    {"op": "line", "x": 1.0, "y": 0.5}
                ]]
            })
        );
        assert_eq!(layer.path_count(), 1);
    }
}
