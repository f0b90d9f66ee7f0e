//! Shared shape library parsing and structural de-duplication.
//!
//! The editor extension section (`TriOrb_SICK_SLS_Editor/Shapes`) holds the
//! document's reusable shapes. Legacy-dialect documents instead embed
//! geometry directly inside fields; [`ShapeRegistry::ensure_shape`] promotes
//! those into the shared library without ever creating structural duplicates,
//! which is what lets both dialects share one reference-based model.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::ids::{unique_shape_id, IdGen};
use crate::model::shape::{Geometry, Point, Shape, ShapeType, DEFAULT_FIELDTYPE, DEFAULT_KIND};
use crate::xml::XmlNode;

/// Root tag of the editor extension section.
pub const EDITOR_SECTION_TAG: &str = "TriOrb_SICK_SLS_Editor";

/// Structural identity key of a geometry.
///
/// `type | sorted "key=value" attribute join | (Polygon only) "X:Y" point join`.
/// Two geometries with equal keys are the same shape and collapse to one
/// registry entry. Callers pass type-specific attributes: for polygons only
/// the geometry `Type` participates (a polygon's identity is its outline),
/// while rectangles and circles are keyed on their full attribute set.
#[must_use]
pub fn structural_key(
    shape_type: ShapeType,
    attrs: &IndexMap<String, String>,
    points: &[Point],
) -> String {
    let mut entries: Vec<String> = attrs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    entries.sort();
    let mut key = format!("{shape_type}|{}", entries.join("|"));
    if shape_type == ShapeType::Polygon {
        let point_entries: Vec<String> =
            points.iter().map(|p| format!("{}:{}", p.x, p.y)).collect();
        key.push('|');
        key.push_str(&point_entries.join(";"));
    }
    key
}

/// The document's shape set plus the structural index used for promotion.
///
/// Built once per load from the shared library section; the fieldset loader
/// then funnels every legacy inline geometry through [`ensure_shape`], so the
/// shape list only ever grows by genuinely new geometry.
///
/// [`ensure_shape`]: ShapeRegistry::ensure_shape
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    shapes: Vec<Shape>,
    index: HashMap<String, String>,
    source: String,
}

impl ShapeRegistry {
    /// Parse the shared shape library from the document root.
    ///
    /// Missing section yields an empty registry with an empty source string;
    /// that is the documented fallback, not an error.
    #[must_use]
    pub fn load(root: Option<&XmlNode>, ids: &mut dyn IdGen) -> Self {
        let mut registry = Self::default();
        let Some(section) = root.and_then(|r| r.find(EDITOR_SECTION_TAG)) else {
            return registry;
        };
        registry.source = section.attr("Source").unwrap_or_default().to_string();

        let Some(shapes_parent) = section.find("Shapes") else {
            return registry;
        };
        for (index, node) in shapes_parent.find_all("Shape").enumerate() {
            let shape = registry.parse_library_shape(node, index, ids);
            let key = registry.key_for(&shape);
            registry
                .index
                .entry(key)
                .or_insert_with(|| shape.id.clone());
            registry.shapes.push(shape);
        }
        registry
    }

    fn parse_library_shape(&self, node: &XmlNode, index: usize, ids: &mut dyn IdGen) -> Shape {
        let shape_type = ShapeType::from_attr(node.attr("Type"));
        let geometry_node = node.find(shape_type.tag());

        let geometry = match shape_type {
            ShapeType::Polygon => Geometry::Polygon {
                polygon_type: geometry_node
                    .and_then(|g| g.attr("Type"))
                    .unwrap_or("CutOut")
                    .to_string(),
                points: geometry_node.map(polygon_points).unwrap_or_default(),
            },
            ShapeType::Rectangle => Geometry::Rectangle {
                attributes: geometry_node
                    .map(|g| g.attributes.clone())
                    .unwrap_or_default(),
            },
            ShapeType::Circle => Geometry::Circle {
                attributes: geometry_node
                    .map(|g| g.attributes.clone())
                    .unwrap_or_default(),
            },
        };

        // Kind resolution order: explicit attribute, the geometry's own Type,
        // then the literal fallback.
        let kind = node
            .attr("Kind")
            .or_else(|| geometry_node.and_then(|g| g.attr("Type")))
            .unwrap_or(DEFAULT_KIND)
            .to_string();

        let id = match node.attr("ID") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => unique_shape_id(ids, |candidate| {
                self.shapes.iter().any(|s| s.id == candidate)
            }),
        };

        Shape {
            id,
            name: node
                .attr("Name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("Shape {}", index + 1)),
            shape_type,
            fieldtype: node.attr("Fieldtype").unwrap_or(DEFAULT_FIELDTYPE).to_string(),
            kind,
            geometry,
        }
    }

    fn key_for(&self, shape: &Shape) -> String {
        match &shape.geometry {
            Geometry::Polygon {
                polygon_type,
                points,
            } => {
                let mut attrs = IndexMap::new();
                attrs.insert("Type".to_string(), polygon_type.clone());
                structural_key(ShapeType::Polygon, &attrs, points)
            }
            Geometry::Rectangle { attributes } => {
                structural_key(ShapeType::Rectangle, attributes, &[])
            }
            Geometry::Circle { attributes } => structural_key(ShapeType::Circle, attributes, &[]),
        }
    }

    /// Return the id of the registry shape structurally equal to the given
    /// geometry, promoting it into the registry first if it is new.
    ///
    /// Idempotent with respect to structural equality: calling this twice
    /// with equal geometry yields the same id and at most one new entry.
    pub fn ensure_shape(
        &mut self,
        shape_type: ShapeType,
        attrs: &IndexMap<String, String>,
        points: &[Point],
        name_hint: Option<&str>,
        fieldtype: Option<&str>,
        ids: &mut dyn IdGen,
    ) -> String {
        // Polygon identity is its outline: only the geometry Type attribute
        // participates in the key.
        let key_attrs = if shape_type == ShapeType::Polygon {
            let mut filtered = IndexMap::new();
            if let Some(polygon_type) = attrs.get("Type") {
                filtered.insert("Type".to_string(), polygon_type.clone());
            }
            filtered
        } else {
            attrs.clone()
        };
        let key = structural_key(shape_type, &key_attrs, points);

        if let Some(existing) = self.index.get(&key) {
            return existing.clone();
        }

        let id = match attrs.get("ID") {
            Some(id) if !id.is_empty() && !self.shapes.iter().any(|s| &s.id == id) => id.clone(),
            _ => unique_shape_id(ids, |candidate| {
                self.shapes.iter().any(|s| s.id == candidate)
            }),
        };

        let kind = attrs
            .get("Type")
            .cloned()
            .unwrap_or_else(|| DEFAULT_KIND.to_string());

        let geometry = match shape_type {
            ShapeType::Polygon => Geometry::Polygon {
                polygon_type: attrs
                    .get("Type")
                    .cloned()
                    .unwrap_or_else(|| "CutOut".to_string()),
                points: points.to_vec(),
            },
            ShapeType::Rectangle => Geometry::Rectangle {
                attributes: attrs.clone(),
            },
            ShapeType::Circle => Geometry::Circle {
                attributes: attrs.clone(),
            },
        };

        debug!(shape_id = %id, %shape_type, "promoted inline geometry into shape library");

        self.shapes.push(Shape {
            id: id.clone(),
            name: name_hint
                .map(str::to_string)
                .unwrap_or_else(|| format!("Shape {}", self.shapes.len() + 1)),
            shape_type,
            fieldtype: fieldtype.unwrap_or(DEFAULT_FIELDTYPE).to_string(),
            kind,
            geometry,
        });
        self.index.insert(key, id.clone());
        id
    }

    /// Shapes in document/promotion order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Verbatim `Source` attribute of the editor section (passthrough).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Consume the registry into `(shapes, source)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Shape>, String) {
        (self.shapes, self.source)
    }
}

/// Ordered vertex list of a `Polygon` element's `Point` children.
#[must_use]
pub fn polygon_points(polygon: &XmlNode) -> Vec<Point> {
    polygon
        .find_all("Point")
        .map(|p| Point::new(p.attr("X").unwrap_or("0"), p.attr("Y").unwrap_or("0")))
        .collect()
}
