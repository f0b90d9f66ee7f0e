//! Loaders: vendor XML → in-memory model.
//!
//! Every public loader is total. Missing files, malformed markup, and absent
//! sections all short-circuit to the loader's documented fallback value; no
//! parse condition surfaces to the caller. The editor must stay usable even
//! when pointed at a broken or partial export.

pub mod casetable;
pub mod fieldsets;

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::ids::IdGen;
use crate::model::{DocumentModel, FileInfoField, MenuItem, ScanPlane};
use crate::model::fields::Device;
use crate::xml::XmlNode;

pub use casetable::load_casetable_payload;
pub use fieldsets::load_fieldsets_and_shapes;

// ── Section tags of the vendor dialect ──────────────────────────────

pub const FILEINFO_TAG: &str = "FileInfo";
pub const SCANPLANES_TAG: &str = "Export_ScanPlanes";
pub const FIELDSETS_TAG: &str = "Export_FieldsetsAndFields";
pub const CASETABLES_TAG: &str = "Export_CasetablesAndCases";

/// One parsed (or unparsable) source document.
///
/// Construction never fails: an unreadable file or malformed markup yields a
/// document with no root, and every query on it returns its fallback. The
/// path to load comes in explicitly; there is no process-wide configuration.
#[derive(Debug, Default)]
pub struct SgDocument {
    root: Option<XmlNode>,
}

impl SgDocument {
    /// Read and parse a document from disk. Total: IO and parse failures
    /// yield an empty document.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_source(&source),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "source document unreadable, using fallbacks");
                Self::default()
            }
        }
    }

    /// Parse a document from a string. Total: malformed markup yields an
    /// empty document.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        match XmlNode::parse(source) {
            Ok(root) => Self { root: Some(root) },
            Err(e) => {
                debug!(error = %e, "source document unparsable, using fallbacks");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn root(&self) -> Option<&XmlNode> {
        self.root.as_ref()
    }

    /// Attributes of the `SdImportExport` root, verbatim.
    #[must_use]
    pub fn root_attributes(&self) -> IndexMap<String, String> {
        self.root
            .as_ref()
            .map(|r| r.attributes.clone())
            .unwrap_or_default()
    }

    /// Attributes of one top-level section (e.g. the `Timestamp` each export
    /// section carries).
    #[must_use]
    pub fn section_attributes(&self, tag: &str) -> IndexMap<String, String> {
        self.root
            .as_ref()
            .and_then(|r| r.find(tag))
            .map(|s| s.attributes.clone())
            .unwrap_or_default()
    }

    /// Side-menu entries: one per root child, summarizing the first two
    /// attributes in document order.
    #[must_use]
    pub fn menu_items(&self) -> Vec<MenuItem> {
        let Some(root) = self.root.as_ref() else {
            return fallback_menu_items();
        };

        let items: Vec<MenuItem> = root
            .children
            .iter()
            .map(|child| {
                let summary_parts: Vec<String> = child
                    .attributes
                    .iter()
                    .take(2)
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                let summary = if summary_parts.is_empty() {
                    "No additional attributes".to_string()
                } else {
                    summary_parts.join(" / ")
                };
                MenuItem {
                    tag: child.tag.clone(),
                    summary,
                }
            })
            .collect();

        if items.is_empty() {
            fallback_menu_items()
        } else {
            items
        }
    }

    /// FileInfo children as editable tag/value rows.
    #[must_use]
    pub fn fileinfo_fields(&self) -> Vec<FileInfoField> {
        let Some(file_info) = self.root.as_ref().and_then(|r| r.find(FILEINFO_TAG)) else {
            return Vec::new();
        };
        file_info
            .children
            .iter()
            .map(|child| FileInfoField {
                tag: child.tag.clone(),
                value: child.text.clone(),
            })
            .collect()
    }

    /// Structured data for `Export_ScanPlanes`.
    #[must_use]
    pub fn scan_planes(&self) -> Vec<ScanPlane> {
        let Some(export) = self.root.as_ref().and_then(|r| r.find(SCANPLANES_TAG)) else {
            return Vec::new();
        };
        export
            .find_all("ScanPlane")
            .map(|plane| ScanPlane {
                attributes: plane.attributes.clone(),
                devices: load_devices(plane),
            })
            .collect()
    }
}

/// `Devices/Device` attribute maps of a ScanPlane, in document order.
pub(crate) fn load_devices(plane: &XmlNode) -> Vec<Device> {
    plane
        .find("Devices")
        .map(|devices| {
            devices
                .find_all("Device")
                .map(|device| Device {
                    attributes: device.attributes.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The fixed menu shown when no document is loadable at all.
#[must_use]
pub fn fallback_menu_items() -> Vec<MenuItem> {
    [
        (FILEINFO_TAG, "Metadata"),
        (SCANPLANES_TAG, "Scan plane definitions"),
        (FIELDSETS_TAG, "Fieldsets (placeholder)"),
        (CASETABLES_TAG, "Case tables (placeholder)"),
    ]
    .into_iter()
    .map(|(tag, summary)| MenuItem {
        tag: tag.to_string(),
        summary: summary.to_string(),
    })
    .collect()
}

/// First candidate present in the attribute map, in priority order.
///
/// This is the "which attribute drives the edited value" lookup used for
/// static inputs and speed-activation blocks.
#[must_use]
pub fn resolve_key<'a>(
    attrs: &IndexMap<String, String>,
    candidates: &[&'a str],
) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|candidate| attrs.contains_key(*candidate))
}

/// Assemble the combined payload a render endpoint serves as the initial
/// client-side model.
#[must_use]
pub fn load_document_model(doc: &SgDocument, ids: &mut dyn IdGen) -> DocumentModel {
    let (fieldsets, shapes, triorb_source) = load_fieldsets_and_shapes(doc, ids);
    DocumentModel {
        root_attributes: doc.root_attributes(),
        menu_items: doc.menu_items(),
        fileinfo_attributes: doc.section_attributes(FILEINFO_TAG),
        fileinfo_fields: doc.fileinfo_fields(),
        scan_planes_attributes: doc.section_attributes(SCANPLANES_TAG),
        scan_planes: doc.scan_planes(),
        fieldsets_attributes: doc.section_attributes(FIELDSETS_TAG),
        fieldsets,
        casetables_attributes: doc.section_attributes(CASETABLES_TAG),
        casetable: load_casetable_payload(doc),
        shapes,
        triorb_source,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<SdImportExport>{body}</SdImportExport>"
        )
    }

    #[test]
    fn menu_items_fall_back_when_source_is_missing() {
        let doc = SgDocument::from_path(Path::new("no/such/file.sgexml"));
        let items = doc.menu_items();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].tag, "FileInfo");
        assert_eq!(items[0].summary, "Metadata");
    }

    #[test]
    fn menu_items_fall_back_on_malformed_markup() {
        let doc = SgDocument::from_source("<SdImportExport><FileInfo></SdImportExport");
        assert_eq!(doc.menu_items(), fallback_menu_items());
    }

    #[test]
    fn menu_items_summarize_first_two_attributes() {
        let doc = SgDocument::from_source(&wrap(
            r#"<FileInfo Creator="Tool" Version="1.0" Extra="ignored" />
               <Export_ScanPlanes Timestamp="2025-01-01T00:00:00Z" />
               <Export_FieldsetsAndFields />"#,
        ));

        let items = doc.menu_items();
        assert_eq!(items[0].summary, "Creator=Tool / Version=1.0");
        assert_eq!(items[1].summary, "Timestamp=2025-01-01T00:00:00Z");
        assert_eq!(items[2].summary, "No additional attributes");
    }

    #[test]
    fn fileinfo_fields_return_trimmed_tag_value_pairs() {
        let doc = SgDocument::from_source(&wrap(
            "<FileInfo>
                <ContentId>
                    Scanner Complete Export
                </ContentId>
                <Company>Example Corp</Company>
                <CreationToolVersion></CreationToolVersion>
            </FileInfo>
            <Export_ScanPlanes />",
        ));

        let fields = doc.fileinfo_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].tag, "ContentId");
        assert_eq!(fields[0].value, "Scanner Complete Export");
        assert_eq!(fields[2].value, "");
    }

    #[test]
    fn scan_planes_return_devices() {
        let doc = SgDocument::from_source(&wrap(
            r#"<Export_ScanPlanes>
                <ScanPlane Index="0" Name="Plane A" MultipleSampling="2">
                    <Devices>
                        <Device Index="1" Typekey="NANS3-TEST" />
                    </Devices>
                </ScanPlane>
            </Export_ScanPlanes>"#,
        ));

        let planes = doc.scan_planes();
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].attributes.get("Name").map(String::as_str), Some("Plane A"));
        assert_eq!(
            planes[0].devices[0].attributes.get("Typekey").map(String::as_str),
            Some("NANS3-TEST")
        );
    }

    #[test]
    fn resolve_key_honors_priority_order() {
        let mut attrs = IndexMap::new();
        attrs.insert("Level".to_string(), "3".to_string());
        attrs.insert("State".to_string(), "High".to_string());

        assert_eq!(resolve_key(&attrs, &["Value", "State", "Level", "Mode"]), Some("State"));
        assert_eq!(resolve_key(&attrs, &["Mode", "Type"]), None);
        assert_eq!(resolve_key(&IndexMap::new(), &["Value"]), None);
    }

    #[test]
    fn root_attributes_pass_through() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport Version="2.1" Tool="SafetyDesigner"><FileInfo/></SdImportExport>"#,
        );
        let attrs = doc.root_attributes();
        assert_eq!(attrs.get("Version").map(String::as_str), Some("2.1"));
        assert!(SgDocument::from_source("not xml").root_attributes().is_empty());
    }
}
