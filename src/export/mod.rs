//! Serializer: in-memory model → vendor XML.
//!
//! The exact inverse of the loaders. Output is always the new dialect:
//! fields reference shapes by id and the shared library is written once, so
//! a legacy-dialect input is normalized on its first save and every save
//! after that is byte-identical (modulo the volatile `Timestamp`). Device
//! `Index` attributes are renumbered 0..n-1 in list order on every save.
//! Only the known top-level sections are emitted: an unrecognized root
//! child has no model counterpart and does not survive a save.

use crate::model::casetable::{Case, CaseSegment, CasetablePayload, Eval, TableSegment};
use crate::model::fields::{Device, FieldsetsPayload};
use crate::model::shape::{Geometry, Shape, DEFAULT_KIND};
use crate::model::DocumentModel;
use crate::registry::EDITOR_SECTION_TAG;
use crate::xml::XmlNode;

use crate::import::{CASETABLES_TAG, FIELDSETS_TAG, FILEINFO_TAG, SCANPLANES_TAG};

/// Serialize the full model back to the vendor dialect.
#[must_use]
pub fn serialize_document(model: &DocumentModel) -> String {
    build_document_tree(model).to_xml_string()
}

/// Build the output element tree. Split from [`serialize_document`] so tests
/// can inspect structure without re-parsing text.
#[must_use]
pub fn build_document_tree(model: &DocumentModel) -> XmlNode {
    let mut root = XmlNode::new("SdImportExport");
    root.attributes = model.root_attributes.clone();

    if !model.fileinfo_attributes.is_empty() || !model.fileinfo_fields.is_empty() {
        let mut file_info = XmlNode::new(FILEINFO_TAG);
        file_info.attributes = model.fileinfo_attributes.clone();
        for field in &model.fileinfo_fields {
            let mut child = XmlNode::new(field.tag.clone());
            child.text = field.value.clone();
            file_info.children.push(child);
        }
        root.children.push(file_info);
    }

    if !model.scan_planes_attributes.is_empty() || !model.scan_planes.is_empty() {
        let mut export = XmlNode::new(SCANPLANES_TAG);
        export.attributes = model.scan_planes_attributes.clone();
        for plane in &model.scan_planes {
            let mut plane_node = XmlNode::new("ScanPlane");
            plane_node.attributes = plane.attributes.clone();
            plane_node.children.push(build_devices(&plane.devices));
            export.children.push(plane_node);
        }
        root.children.push(export);
    }

    if !model.fieldsets_attributes.is_empty() || !is_empty_fieldsets(&model.fieldsets) {
        let mut export = XmlNode::new(FIELDSETS_TAG);
        export.attributes = model.fieldsets_attributes.clone();
        if !is_empty_fieldsets(&model.fieldsets) {
            export.children.push(build_fieldsets_plane(&model.fieldsets));
        }
        root.children.push(export);
    }

    if !model.casetables_attributes.is_empty()
        || model.casetable != CasetablePayload::fallback()
    {
        let mut export = XmlNode::new(CASETABLES_TAG);
        export.attributes = model.casetables_attributes.clone();
        export.children.push(build_casetable(&model.casetable));
        root.children.push(export);
    }

    if !model.triorb_source.is_empty() || !model.shapes.is_empty() {
        root.children
            .push(build_editor_section(&model.triorb_source, &model.shapes));
    }

    root
}

fn is_empty_fieldsets(payload: &FieldsetsPayload) -> bool {
    payload.scan_plane_attributes.is_empty()
        && payload.devices.is_empty()
        && payload.global_geometry.is_empty()
        && payload.fieldsets.is_empty()
}

/// Devices container with `Index` renumbered 0..n-1 in list order. An
/// existing `Index` keeps its attribute position; a missing one is appended.
fn build_devices(devices: &[Device]) -> XmlNode {
    let mut parent = XmlNode::new("Devices");
    for (index, device) in devices.iter().enumerate() {
        let mut node = XmlNode::new("Device");
        node.attributes = device.attributes.clone();
        node.attributes
            .insert("Index".to_string(), index.to_string());
        parent.children.push(node);
    }
    parent
}

fn build_fieldsets_plane(payload: &FieldsetsPayload) -> XmlNode {
    let mut plane = XmlNode::new("ScanPlane");
    plane.attributes = payload.scan_plane_attributes.clone();
    plane.children.push(build_devices(&payload.devices));

    if !payload.global_geometry.is_empty() {
        let mut global = XmlNode::new("GlobalGeometry");
        global.attributes = payload.global_geometry.clone();
        plane.children.push(global);
    }

    if !payload.fieldsets.is_empty() {
        let mut parent = XmlNode::new("Fieldsets");
        for fieldset in &payload.fieldsets {
            let mut fieldset_node = XmlNode::new("Fieldset");
            fieldset_node.attributes = fieldset.attributes.clone();
            for field in &fieldset.fields {
                let mut field_node = XmlNode::new("Field");
                field_node.attributes = field.attributes.clone();
                let mut shapes_node = XmlNode::new("Shapes");
                for shape_ref in &field.shape_refs {
                    let mut ref_node = XmlNode::new("Shape");
                    ref_node
                        .attributes
                        .insert("ID".to_string(), shape_ref.shape_id.clone());
                    shapes_node.children.push(ref_node);
                }
                field_node.children.push(shapes_node);
                fieldset_node.children.push(field_node);
            }
            parent.children.push(fieldset_node);
        }
        plane.children.push(parent);
    }

    plane
}

// ── Casetable ───────────────────────────────────────────────────────

fn build_casetable(payload: &CasetablePayload) -> XmlNode {
    let mut table = XmlNode::new("Casetable");
    table.attributes = payload.casetable_attributes.clone();

    // Children follow the recorded layout; segments that hold no data (the
    // empty kinds appended at load time) produce no output.
    for segment in &payload.layout {
        match segment {
            TableSegment::Configuration => {
                if let Some(node) = &payload.configuration {
                    table.children.push(node.clone());
                }
            }
            TableSegment::Cases => {
                if !payload.cases.is_empty() {
                    let mut cases_node = XmlNode::new("Cases");
                    cases_node.children = payload.cases.iter().map(build_case).collect();
                    table.children.push(cases_node);
                }
            }
            TableSegment::Evals => {
                if !payload.evals.attributes.is_empty() || !payload.evals.evals.is_empty() {
                    let mut evals_node = XmlNode::new("Evals");
                    evals_node.attributes = payload.evals.attributes.clone();
                    evals_node.children = payload.evals.evals.iter().map(build_eval).collect();
                    table.children.push(evals_node);
                }
            }
            TableSegment::FieldsConfiguration => {
                if let Some(node) = &payload.fields_configuration {
                    table.children.push(node.clone());
                }
            }
            TableSegment::Node { node } => table.children.push(node.clone()),
        }
    }

    table
}

fn build_case(case: &Case) -> XmlNode {
    let mut node = XmlNode::new("Case");
    node.attributes = case.attributes.clone();

    for segment in &case.layout {
        match segment {
            CaseSegment::StaticInputs => {
                let mut inputs_node = XmlNode::new("StaticInputs");
                for input in &case.static_inputs {
                    let mut input_node = XmlNode::new("StaticInput");
                    input_node.attributes = input.attributes.clone();
                    inputs_node.children.push(input_node);
                }
                node.children.push(inputs_node);
            }
            CaseSegment::SpeedActivation => {
                if let Some(activation) = &case.speed_activation {
                    let mut activation_node = XmlNode::new("SpeedActivation");
                    activation_node.attributes = activation.attributes.clone();
                    node.children.push(activation_node);
                }
            }
            CaseSegment::Node { node: generic } => node.children.push(generic.clone()),
        }
    }

    node
}

fn text_child(tag: &str, text: &str) -> XmlNode {
    let mut node = XmlNode::new(tag);
    node.text = text.to_string();
    node
}

fn build_eval(eval: &Eval) -> XmlNode {
    let mut node = XmlNode::new("Eval");
    node.attributes = eval.attributes.clone();

    for (tag, value) in [
        ("Name", &eval.name),
        ("NameLatin9Key", &eval.name_latin9_key),
        ("Q", &eval.q),
    ] {
        if !value.is_empty() {
            node.children.push(text_child(tag, value));
        }
    }

    let reset = &eval.reset;
    if !reset.reset_type.is_empty()
        || !reset.auto_reset_time.is_empty()
        || !reset.eval_reset_source.is_empty()
    {
        let mut reset_node = XmlNode::new("Reset");
        for (tag, value) in [
            ("ResetType", &reset.reset_type),
            ("AutoResetTime", &reset.auto_reset_time),
            ("EvalResetSource", &reset.eval_reset_source),
        ] {
            if !value.is_empty() {
                reset_node.children.push(text_child(tag, value));
            }
        }
        node.children.push(reset_node);
    }

    let preset = &eval.permanent_preset;
    if !preset.attributes.is_empty() || !preset.field_mode.is_empty() {
        let mut plane = XmlNode::new("ScanPlane");
        plane.attributes = preset.attributes.clone();
        if !preset.field_mode.is_empty() {
            plane.children.push(text_child("FieldMode", &preset.field_mode));
        }
        let mut planes = XmlNode::new("ScanPlanes");
        planes.children.push(plane);
        let mut preset_node = XmlNode::new("PermanentPreset");
        preset_node.children.push(planes);
        node.children.push(preset_node);
    }

    if !eval.cases.is_empty() {
        let mut cases_node = XmlNode::new("Cases");
        for case in &eval.cases {
            let mut case_node = XmlNode::new("Case");
            case_node.attributes = case.attributes.clone();
            let mut plane = XmlNode::new("ScanPlane");
            plane.attributes = case.scan_plane.attributes.clone();
            if !case.scan_plane.user_field_id.is_empty() {
                plane
                    .children
                    .push(text_child("UserFieldId", &case.scan_plane.user_field_id));
            }
            if !case.scan_plane.is_splitted.is_empty() {
                plane
                    .children
                    .push(text_child("IsSplitted", &case.scan_plane.is_splitted));
            }
            let mut planes = XmlNode::new("ScanPlanes");
            planes.children.push(plane);
            case_node.children.push(planes);
            cases_node.children.push(case_node);
        }
        node.children.push(cases_node);
    }

    node
}

// ── Shared shape library ────────────────────────────────────────────

fn build_editor_section(source: &str, shapes: &[Shape]) -> XmlNode {
    let mut section = XmlNode::new(EDITOR_SECTION_TAG);
    if !source.is_empty() {
        section
            .attributes
            .insert("Source".to_string(), source.to_string());
    }

    let mut shapes_node = XmlNode::new("Shapes");
    for shape in shapes {
        shapes_node.children.push(build_library_shape(shape));
    }
    section.children.push(shapes_node);
    section
}

fn build_library_shape(shape: &Shape) -> XmlNode {
    let mut node = XmlNode::new("Shape");
    node.attributes.insert("ID".to_string(), shape.id.clone());
    node.attributes
        .insert("Name".to_string(), shape.name.clone());
    node.attributes
        .insert("Type".to_string(), shape.shape_type.to_string());
    node.attributes
        .insert("Fieldtype".to_string(), shape.fieldtype.clone());

    // Kind normally rides on the geometry's own Type attribute; an explicit
    // Kind attribute is only needed when the two disagree.
    let derived_kind = match &shape.geometry {
        Geometry::Polygon { polygon_type, .. } => polygon_type.as_str(),
        Geometry::Rectangle { attributes } | Geometry::Circle { attributes } => attributes
            .get("Type")
            .map_or(DEFAULT_KIND, String::as_str),
    };
    if shape.kind != derived_kind {
        node.attributes
            .insert("Kind".to_string(), shape.kind.clone());
    }

    let geometry_node = match &shape.geometry {
        Geometry::Polygon {
            polygon_type,
            points,
        } => {
            let mut polygon = XmlNode::new("Polygon");
            polygon
                .attributes
                .insert("Type".to_string(), polygon_type.clone());
            for point in points {
                let mut point_node = XmlNode::new("Point");
                point_node.attributes.insert("X".to_string(), point.x.clone());
                point_node.attributes.insert("Y".to_string(), point.y.clone());
                polygon.children.push(point_node);
            }
            polygon
        }
        Geometry::Rectangle { attributes } => {
            let mut rectangle = XmlNode::new("Rectangle");
            rectangle.attributes = attributes.clone();
            rectangle
        }
        Geometry::Circle { attributes } => {
            let mut circle = XmlNode::new("Circle");
            circle.attributes = attributes.clone();
            circle
        }
    };
    node.children.push(geometry_node);
    node
}
