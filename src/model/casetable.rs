use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::xml::XmlNode;

/// One static input condition of a case.
///
/// `value_key` names the attribute that drives the displayed/edited value:
/// the tag of the first text-bearing child folded into `attributes`, else the
/// first present of `Value`, `State`, `Level`, `Mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaticInput {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub value_key: String,
}

/// Speed-activation block of a case. `mode_key` is resolved from the
/// candidates `Mode`, `Type`, `State`, `Value`, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SpeedActivation {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub mode_key: String,
}

/// Child ordering record of one case: recognized blocks interleaved with
/// passthrough nodes, in document order, so saves reproduce the original
/// layout exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum CaseSegment {
    StaticInputs,
    SpeedActivation,
    Node { node: XmlNode },
}

/// One row of a casetable: static input conditions plus activation mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Case {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub static_inputs: Vec<StaticInput>,
    pub speed_activation: Option<SpeedActivation>,
    pub layout: Vec<CaseSegment>,
}

/// Reset block of an eval. All three members default to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Reset {
    pub reset_type: String,
    pub auto_reset_time: String,
    pub eval_reset_source: String,
}

/// Permanent preset of an eval: the nested scan-plane attributes plus its
/// `FieldMode` text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PermanentPreset {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub field_mode: String,
}

/// Scan plane nested under an eval case: attributes plus the two scalar
/// children that matter to field switching.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EvalScanPlane {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub user_field_id: String,
    pub is_splitted: String,
}

/// One sub-case of an eval, tied to a scan-plane preset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EvalCase {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub scan_plane: EvalScanPlane,
}

/// An evaluation unit: reset behavior plus a set of sub-cases.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Eval {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub name: String,
    pub name_latin9_key: String,
    pub q: String,
    pub reset: Reset,
    pub permanent_preset: PermanentPreset,
    pub cases: Vec<EvalCase>,
}

/// The `Evals` container: its own attributes plus the eval list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EvalsSection {
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub evals: Vec<Eval>,
}

/// Child ordering record of the selected casetable. One segment per child in
/// document order; unrecognized children ride along as `Node` segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum TableSegment {
    Configuration,
    Cases,
    Evals,
    FieldsConfiguration,
    Node { node: XmlNode },
}

impl TableSegment {
    /// The four well-known kinds, in their canonical default order.
    pub const WELL_KNOWN: [TableSegment; 4] = [
        TableSegment::Configuration,
        TableSegment::Cases,
        TableSegment::Evals,
        TableSegment::FieldsConfiguration,
    ];
}

/// Structured payload of the selected casetable (the one with `Index="0"`,
/// else the first present).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CasetablePayload {
    #[ts(type = "Record<string, string>")]
    pub casetable_attributes: IndexMap<String, String>,
    pub configuration: Option<XmlNode>,
    pub cases: Vec<Case>,
    pub evals: EvalsSection,
    pub fields_configuration: Option<XmlNode>,
    pub layout: Vec<TableSegment>,
}

impl CasetablePayload {
    /// The documented fallback: `Index="0"`, nothing else, and the canonical
    /// four-segment layout. Returned whenever the casetable export section or
    /// every `Casetable` is absent or unparsable.
    #[must_use]
    pub fn fallback() -> Self {
        let mut casetable_attributes = IndexMap::new();
        casetable_attributes.insert("Index".to_string(), "0".to_string());
        Self {
            casetable_attributes,
            configuration: None,
            cases: Vec::new(),
            evals: EvalsSection::default(),
            fields_configuration: None,
            layout: TableSegment::WELL_KNOWN.to_vec(),
        }
    }
}
