//! Map layer descriptions as they appear in a poster file.
//!
//! `map_layers` is a JSON object whose key order is the draw order, so it is
//! read into an [`IndexMap`] instead of a hash map. A handful of names are
//! reserved for layers that need their own data path; every other name is a
//! generic tag query drawn as filled areas.

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Accepted values for one tag key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// `true` matches any value, `false` disables the key.
    Any(bool),
    One(String),
    Many(Vec<String>),
}

/// Union of `key=value` filters: a feature matches if any key matches.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TagQuery(pub IndexMap<String, TagValue>);

impl TagQuery {
    pub fn key(key: impl Into<String>) -> Self {
        Self(IndexMap::from([(key.into(), TagValue::Any(true))]))
    }

    pub fn one_of<S: Into<String>>(
        key: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self(IndexMap::from([(
            key.into(),
            TagValue::Many(values.into_iter().map(Into::into).collect()),
        )]))
    }

    pub fn is_empty(&self) -> bool {
        self.filters().next().is_none()
    }

    /// Enabled `(key, value)` pairs.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &TagValue)> + '_ {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .filter(|(_, value)| !matches!(value, TagValue::Any(false)))
    }
}

impl<'de> Deserialize<'de> for TagQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Key(String),
            Map(IndexMap<String, TagValue>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Key(key) => TagQuery::key(key),
            Raw::Map(map) => TagQuery(map),
        })
    }
}

/// Stroke of one street class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WayStyle {
    pub stroke: String,
    #[serde(default = "one")]
    pub relative_width: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetsLayer {
    pub base_width: f64,
    /// Street class to style. The order is the draw order of the groups.
    pub types: IndexMap<String, WayStyle>,
}

impl StreetsLayer {
    pub fn query(&self) -> TagQuery {
        TagQuery::one_of("highway", self.types.keys())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitLayer {
    /// Sent verbatim to the query endpoint.
    pub selector: String,
    /// SVG presentation attributes of the group.
    #[serde(default)]
    pub style: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillLayer {
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericLayer {
    pub tags: TagQuery,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    /// Background rectangle.
    Land(FillLayer),
    /// Sea polygons merged with inland water.
    Water(FillLayer),
    Streets(StreetsLayer),
    Circuit(CircuitLayer),
    Generic(GenericLayer),
}

impl LayerSpec {
    /// Picks the layer kind from its name and reads `value` accordingly.
    pub fn from_entry(name: &str, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match name {
            "land" => LayerSpec::Land(serde_json::from_value(value)?),
            "water" => LayerSpec::Water(serde_json::from_value(value)?),
            "streets" => LayerSpec::Streets(serde_json::from_value(value)?),
            "circuit" | "circut" => LayerSpec::Circuit(serde_json::from_value(value)?),
            _ => LayerSpec::Generic(serde_json::from_value(value)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedLayer {
    pub name: String,
    pub spec: LayerSpec,
}

/// Reads the `map_layers` object of a poster file, keeping its order.
pub fn deserialize_layers<'de, D>(deserializer: D) -> Result<Vec<NamedLayer>, D::Error>
where
    D: Deserializer<'de>,
{
    IndexMap::<String, serde_json::Value>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, value)| {
            LayerSpec::from_entry(&name, value)
                .map(|spec| NamedLayer { name: name.clone(), spec })
                .map_err(|err| de::Error::custom(format!("layer `{name}`: {err}")))
        })
        .collect()
}
