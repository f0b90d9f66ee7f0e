use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::casetable::CasetablePayload;
use super::fields::{FieldsetsPayload, ScanPlane};
use super::shape::Shape;

/// One side-menu entry: a root child's tag plus a short attribute summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItem {
    pub tag: String,
    pub summary: String,
}

/// One editable FileInfo row: child tag plus its trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FileInfoField {
    pub tag: String,
    pub value: String,
}

/// The combined in-memory model of one loaded document.
///
/// This is what a page-render endpoint serves as the initial client-side
/// model, and what the serializer turns back into the vendor dialect. The
/// loaders populate it; everything here is plain data with no behavior of
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentModel {
    #[ts(type = "Record<string, string>")]
    pub root_attributes: IndexMap<String, String>,
    pub menu_items: Vec<MenuItem>,
    #[ts(type = "Record<string, string>")]
    pub fileinfo_attributes: IndexMap<String, String>,
    pub fileinfo_fields: Vec<FileInfoField>,
    #[ts(type = "Record<string, string>")]
    pub scan_planes_attributes: IndexMap<String, String>,
    pub scan_planes: Vec<ScanPlane>,
    #[ts(type = "Record<string, string>")]
    pub fieldsets_attributes: IndexMap<String, String>,
    pub fieldsets: FieldsetsPayload,
    #[ts(type = "Record<string, string>")]
    pub casetables_attributes: IndexMap<String, String>,
    pub casetable: CasetablePayload,
    pub shapes: Vec<Shape>,
    /// Verbatim `Source` attribute of the editor extension section.
    pub triorb_source: String,
}
