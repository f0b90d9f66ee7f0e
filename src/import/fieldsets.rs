//! `Export_FieldsetsAndFields` loader.
//!
//! Resolves every field's shapes into id references. New-dialect documents
//! already reference the shared library (`Shapes/Shape ID="..."`); legacy
//! documents embed geometry inline per field, and each inline geometry is
//! promoted through the shape registry so both dialects end up in the same
//! reference-based model. Promotion rather than field-local storage is what
//! lets multiple fields reuse one geometry without duplication.

use tracing::warn;

use crate::ids::IdGen;
use crate::model::fields::{Field, Fieldset, FieldsetsPayload, ShapeRef};
use crate::model::shape::{Shape, ShapeType};
use crate::registry::{polygon_points, ShapeRegistry};
use crate::xml::XmlNode;

use super::{load_devices, SgDocument, FIELDSETS_TAG};

/// Load the fieldset hierarchy together with the document's shape set.
///
/// The registry is seeded from the shared library first, then grows as
/// legacy inline geometry is promoted; returns the payload, the final shape
/// list (library order, promotions appended), and the editor section's
/// verbatim `Source` attribute. A missing section or ScanPlane yields empty
/// defaults alongside whatever shapes the library already held.
#[must_use]
pub fn load_fieldsets_and_shapes(
    doc: &SgDocument,
    ids: &mut dyn IdGen,
) -> (FieldsetsPayload, Vec<Shape>, String) {
    let mut registry = ShapeRegistry::load(doc.root(), ids);

    let scan_plane = doc
        .root()
        .and_then(|r| r.find(FIELDSETS_TAG))
        .and_then(|export| export.find("ScanPlane"));
    let Some(scan_plane) = scan_plane else {
        let (shapes, source) = registry.into_parts();
        return (FieldsetsPayload::default(), shapes, source);
    };

    let mut payload = FieldsetsPayload {
        scan_plane_attributes: scan_plane.attributes.clone(),
        devices: load_devices(scan_plane),
        global_geometry: scan_plane
            .find("GlobalGeometry")
            .map(|g| g.attributes.clone())
            .unwrap_or_default(),
        fieldsets: Vec::new(),
    };

    if let Some(fieldsets_parent) = scan_plane.find("Fieldsets") {
        for fieldset_node in fieldsets_parent.find_all("Fieldset") {
            let fieldset_name = fieldset_node.attr("Name").unwrap_or_default();
            let fields = fieldset_node
                .find_all("Field")
                .map(|field_node| load_field(field_node, fieldset_name, &mut registry, ids))
                .collect();
            payload.fieldsets.push(Fieldset {
                attributes: fieldset_node.attributes.clone(),
                fields,
            });
        }
    }

    let (shapes, source) = registry.into_parts();
    (payload, shapes, source)
}

fn load_field(
    field_node: &XmlNode,
    fieldset_name: &str,
    registry: &mut ShapeRegistry,
    ids: &mut dyn IdGen,
) -> Field {
    let mut field = Field {
        attributes: field_node.attributes.clone(),
        shape_refs: Vec::new(),
    };

    if let Some(shapes_parent) = field_node.find("Shapes") {
        // New dialect: references into the shared library.
        for shape_node in shapes_parent.find_all("Shape") {
            match shape_node.attr("ID") {
                Some(id) if !id.is_empty() => field.shape_refs.push(ShapeRef {
                    shape_id: id.to_string(),
                }),
                _ => {
                    warn!(
                        fieldset = fieldset_name,
                        field = field.attributes.get("Name").map_or("", String::as_str),
                        "dropping shape reference without ID"
                    );
                }
            }
        }
        return field;
    }

    // Legacy dialect: geometry embedded directly in the field. Promote each
    // into the registry and keep only the reference.
    let field_name = field_node.attr("Name").unwrap_or_default();
    let fieldtype = field_node.attr("Fieldtype");
    for child in &field_node.children {
        let shape_type = match child.tag.as_str() {
            "Polygon" => ShapeType::Polygon,
            "Rectangle" => ShapeType::Rectangle,
            "Circle" => ShapeType::Circle,
            _ => continue,
        };
        let points = if shape_type == ShapeType::Polygon {
            polygon_points(child)
        } else {
            Vec::new()
        };
        let name_hint = format!("{fieldset_name} {field_name} {}", child.tag);
        let shape_id = registry.ensure_shape(
            shape_type,
            &child.attributes,
            &points,
            Some(&name_hint),
            fieldtype,
            ids,
        );
        field.shape_refs.push(ShapeRef { shape_id });
    }
    field
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGen;
    use crate::model::shape::Geometry;

    #[test]
    fn missing_section_yields_empty_defaults() {
        let doc = SgDocument::from_source("<SdImportExport><FileInfo/></SdImportExport>");
        let mut ids = SequentialIdGen::default();
        let (payload, shapes, source) = load_fieldsets_and_shapes(&doc, &mut ids);

        assert!(payload.devices.is_empty());
        assert!(payload.global_geometry.is_empty());
        assert!(payload.fieldsets.is_empty());
        assert!(shapes.is_empty());
        assert_eq!(source, "");
    }

    #[test]
    fn new_dialect_fields_keep_id_references() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport>
                <Export_FieldsetsAndFields>
                    <ScanPlane Index="0" Name="Plane A">
                        <Devices><Device Index="0" Typekey="NANS3"/></Devices>
                        <GlobalGeometry Rotation="0"/>
                        <Fieldsets>
                            <Fieldset Name="Min10">
                                <Field Name="Protective" Fieldtype="ProtectiveSafeBlanking">
                                    <Shapes>
                                        <Shape ID="shape-aaaa0001"/>
                                        <Shape/>
                                        <Shape ID="shape-bbbb0002"/>
                                    </Shapes>
                                </Field>
                            </Fieldset>
                        </Fieldsets>
                    </ScanPlane>
                </Export_FieldsetsAndFields>
                <TriOrb_SICK_SLS_Editor Source="editor">
                    <Shapes>
                        <Shape ID="shape-aaaa0001" Name="Zone A" Type="Polygon">
                            <Polygon Type="CutOut"><Point X="0" Y="0"/></Polygon>
                        </Shape>
                    </Shapes>
                </TriOrb_SICK_SLS_Editor>
            </SdImportExport>"#,
        );

        let mut ids = SequentialIdGen::default();
        let (payload, shapes, source) = load_fieldsets_and_shapes(&doc, &mut ids);

        assert_eq!(source, "editor");
        assert_eq!(shapes.len(), 1);
        let field = &payload.fieldsets[0].fields[0];
        // The referenceless <Shape/> is skipped.
        assert_eq!(field.shape_refs.len(), 2);
        assert_eq!(field.shape_refs[0].shape_id, "shape-aaaa0001");
        assert_eq!(field.shape_refs[1].shape_id, "shape-bbbb0002");
    }

    #[test]
    fn legacy_geometry_is_promoted_into_the_registry() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport>
                <Export_FieldsetsAndFields>
                    <ScanPlane Index="0" Name="Plane A">
                        <Fieldsets>
                            <Fieldset Name="Min10">
                                <Field Name="Protective" Fieldtype="ProtectiveSafeBlanking">
                                    <Polygon Type="CutOut">
                                        <Point X="0" Y="0"/>
                                        <Point X="100" Y="0"/>
                                        <Point X="0" Y="50"/>
                                    </Polygon>
                                </Field>
                                <Field Name="Warning" Fieldtype="Warning">
                                    <Polygon Type="CutOut">
                                        <Point X="0" Y="0"/>
                                        <Point X="100" Y="0"/>
                                        <Point X="0" Y="50"/>
                                    </Polygon>
                                </Field>
                            </Fieldset>
                        </Fieldsets>
                    </ScanPlane>
                </Export_FieldsetsAndFields>
            </SdImportExport>"#,
        );

        let mut ids = SequentialIdGen::default();
        let (payload, shapes, _) = load_fieldsets_and_shapes(&doc, &mut ids);

        // Identical outlines collapse to a single registry entry shared by
        // both fields.
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "Min10 Protective Polygon");
        assert_eq!(shapes[0].fieldtype, "ProtectiveSafeBlanking");
        let Geometry::Polygon { points, .. } = &shapes[0].geometry else {
            unreachable!("expected polygon geometry");
        };
        assert_eq!(points[2], crate::model::Point::new("0", "50"));

        let first = &payload.fieldsets[0].fields[0];
        let second = &payload.fieldsets[0].fields[1];
        assert_eq!(first.shape_refs[0].shape_id, shapes[0].id);
        assert_eq!(second.shape_refs[0].shape_id, shapes[0].id);
    }

    #[test]
    fn legacy_rectangles_and_circles_promote_with_full_attributes() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport>
                <Export_FieldsetsAndFields>
                    <ScanPlane Index="0">
                        <Fieldsets>
                            <Fieldset Name="Dock">
                                <Field Name="Near">
                                    <Rectangle Type="Field" OriginX="0" OriginY="0" Width="100" Height="50"/>
                                    <Circle Type="Field" CenterX="10" CenterY="10" Radius="30"/>
                                </Field>
                            </Fieldset>
                        </Fieldsets>
                    </ScanPlane>
                </Export_FieldsetsAndFields>
            </SdImportExport>"#,
        );

        let mut ids = SequentialIdGen::default();
        let (payload, shapes, _) = load_fieldsets_and_shapes(&doc, &mut ids);

        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].shape_type, ShapeType::Rectangle);
        assert_eq!(shapes[0].name, "Dock Near Rectangle");
        assert_eq!(shapes[1].shape_type, ShapeType::Circle);
        assert_eq!(payload.fieldsets[0].fields[0].shape_refs.len(), 2);
    }
}
