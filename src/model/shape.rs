use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Default safety classification for shapes that do not carry one.
pub const DEFAULT_FIELDTYPE: &str = "ProtectiveSafeBlanking";

/// Fallback sub-classification when neither the shape nor its geometry says.
pub const DEFAULT_KIND: &str = "Field";

/// Geometry class of a shape, mirroring the element names in the vendor
/// format's shared shape library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ShapeType {
    #[default]
    Polygon,
    Rectangle,
    Circle,
}

impl ShapeType {
    /// Parse the library's `Type` attribute; anything unrecognized (including
    /// absence) falls back to `Polygon`.
    #[must_use]
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("Rectangle") => ShapeType::Rectangle,
            Some("Circle") => ShapeType::Circle,
            _ => ShapeType::Polygon,
        }
    }

    /// The element tag used for this geometry class.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            ShapeType::Polygon => "Polygon",
            ShapeType::Rectangle => "Rectangle",
            ShapeType::Circle => "Circle",
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One polygon vertex. Coordinates stay as source strings so values
/// round-trip exactly as written (`"0"` never becomes `"0.0"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Point {
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Y")]
    pub y: String,
}

impl Point {
    #[must_use]
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Geometry payload of a shape. Polygons carry an ordered vertex list (order
/// defines the boundary); rectangles and circles are flat attribute maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "geometry", rename_all = "snake_case")]
#[ts(export)]
pub enum Geometry {
    Polygon {
        #[serde(rename = "Type")]
        polygon_type: String,
        points: Vec<Point>,
    },
    Rectangle {
        #[ts(type = "Record<string, string>")]
        attributes: IndexMap<String, String>,
    },
    Circle {
        #[ts(type = "Record<string, string>")]
        attributes: IndexMap<String, String>,
    },
}

impl Geometry {
    /// The geometry class this payload belongs to.
    #[must_use]
    pub const fn shape_type(&self) -> ShapeType {
        match self {
            Geometry::Polygon { .. } => ShapeType::Polygon,
            Geometry::Rectangle { .. } => ShapeType::Rectangle,
            Geometry::Circle { .. } => ShapeType::Circle,
        }
    }
}

/// A reusable geometric definition from the shared shape library.
///
/// Shapes are owned by the document-level registry; fields reference them by
/// id. `id` is unique within one document, taken from the source `ID`
/// attribute or synthesized at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shape {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub shape_type: ShapeType,
    pub fieldtype: String,
    pub kind: String,
    pub geometry: Geometry,
}
