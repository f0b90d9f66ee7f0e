use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One device row under a ScanPlane's `Devices` container.
///
/// The `Index` attribute is renumbered sequentially (0..n-1, list order) on
/// every save; all other attributes pass through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Device {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
}

/// A scan plane from `Export_ScanPlanes`: plane attributes plus its devices.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanPlane {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub devices: Vec<Device>,
}

/// Reference from a field to a shared shape. A back-reference, not
/// ownership: the shape lives in the document-level registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShapeRef {
    #[serde(rename = "shapeId")]
    pub shape_id: String,
}

/// One protective/warning zone definition inside a fieldset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Field {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    #[serde(rename = "shapeRefs")]
    pub shape_refs: Vec<ShapeRef>,
}

/// A named group of fields evaluated together under one scan plane.
/// Field order is display and processing order and is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Fieldset {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub fields: Vec<Field>,
}

/// Structured payload of the `Export_FieldsetsAndFields` section.
///
/// All three members default to empty when the section (or its ScanPlane) is
/// missing; partial documents are not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldsetsPayload {
    #[ts(type = "Record<string, string>")]
    pub scan_plane_attributes: IndexMap<String, String>,
    pub devices: Vec<Device>,
    #[ts(type = "Record<string, string>")]
    pub global_geometry: IndexMap<String, String>,
    pub fieldsets: Vec<Fieldset>,
}
