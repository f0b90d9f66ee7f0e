//! `Export_CasetablesAndCases` loader.
//!
//! One table per document: the `Casetable` with `Index="0"`, else the first
//! present. Recognized children get structured extraction; everything else
//! passes through as generic nodes. The `layout` sequence records the child
//! ordering (recognized and unrecognized alike) so a save reproduces the
//! original document order exactly.

use crate::model::casetable::{
    Case, CaseSegment, CasetablePayload, Eval, EvalCase, EvalScanPlane, EvalsSection,
    PermanentPreset, Reset, SpeedActivation, StaticInput, TableSegment,
};
use crate::xml::XmlNode;

use super::{resolve_key, SgDocument, CASETABLES_TAG};

/// Attribute candidates deciding which value a static input edits.
pub const VALUE_KEY_CANDIDATES: [&str; 4] = ["Value", "State", "Level", "Mode"];

/// Attribute candidates deciding a speed-activation block's mode.
pub const MODE_KEY_CANDIDATES: [&str; 4] = ["Mode", "Type", "State", "Value"];

/// Load the selected casetable, or [`CasetablePayload::fallback`] when the
/// section or every table is absent.
#[must_use]
pub fn load_casetable_payload(doc: &SgDocument) -> CasetablePayload {
    let Some(export) = doc.root().and_then(|r| r.find(CASETABLES_TAG)) else {
        return CasetablePayload::fallback();
    };

    let tables: Vec<&XmlNode> = export.find_all("Casetable").collect();
    let Some(table) = tables
        .iter()
        .find(|t| t.attr("Index") == Some("0"))
        .or_else(|| tables.first())
    else {
        return CasetablePayload::fallback();
    };

    let mut payload = CasetablePayload {
        casetable_attributes: table.attributes.clone(),
        configuration: None,
        cases: Vec::new(),
        evals: EvalsSection::default(),
        fields_configuration: None,
        layout: Vec::new(),
    };
    // The editor always addresses the selected table as table 0.
    payload
        .casetable_attributes
        .entry("Index".to_string())
        .or_insert_with(|| "0".to_string());

    for child in &table.children {
        match child.tag.as_str() {
            "Configuration" => {
                payload.configuration = Some(child.clone());
                payload.layout.push(TableSegment::Configuration);
            }
            "Cases" => {
                payload.cases = child.find_all("Case").map(load_case).collect();
                payload.layout.push(TableSegment::Cases);
            }
            "Evals" => {
                payload.evals = EvalsSection {
                    attributes: child.attributes.clone(),
                    evals: child.find_all("Eval").map(load_eval).collect(),
                };
                payload.layout.push(TableSegment::Evals);
            }
            "FieldsConfiguration" => {
                payload.fields_configuration = Some(child.clone());
                payload.layout.push(TableSegment::FieldsConfiguration);
            }
            _ => payload.layout.push(TableSegment::Node {
                node: child.clone(),
            }),
        }
    }

    // Any well-known kind the source lacked is appended empty so the UI can
    // still render an addable section; relative order of present kinds is
    // untouched.
    for kind in TableSegment::WELL_KNOWN {
        if !payload
            .layout
            .iter()
            .any(|seg| std::mem::discriminant(seg) == std::mem::discriminant(&kind))
        {
            payload.layout.push(kind);
        }
    }

    payload
}

fn load_case(node: &XmlNode) -> Case {
    let mut case = Case {
        attributes: node.attributes.clone(),
        static_inputs: Vec::new(),
        speed_activation: None,
        layout: Vec::new(),
    };

    for child in &node.children {
        match child.tag.as_str() {
            "StaticInputs" => {
                case.static_inputs = child
                    .find_all("StaticInput")
                    .map(load_static_input)
                    .collect();
                case.layout.push(CaseSegment::StaticInputs);
            }
            "SpeedActivation" => {
                case.speed_activation = Some(SpeedActivation {
                    mode_key: resolve_key(&child.attributes, &MODE_KEY_CANDIDATES)
                        .unwrap_or("Mode")
                        .to_string(),
                    attributes: child.attributes.clone(),
                });
                case.layout.push(CaseSegment::SpeedActivation);
            }
            _ => case.layout.push(CaseSegment::Node {
                node: child.clone(),
            }),
        }
    }

    case
}

fn load_static_input(node: &XmlNode) -> StaticInput {
    let mut attributes = node.attributes.clone();

    // Text-bearing children fold into the attribute map under their own tag;
    // the first one folded is the value key.
    let mut folded_key: Option<String> = None;
    for child in &node.children {
        if child.text.is_empty() {
            continue;
        }
        if folded_key.is_none() {
            folded_key = Some(child.tag.clone());
        }
        attributes.insert(child.tag.clone(), child.text.clone());
    }

    let value_key = match folded_key {
        Some(key) => key,
        None => {
            let key = resolve_key(&attributes, &VALUE_KEY_CANDIDATES)
                .unwrap_or("Value")
                .to_string();
            // Bare text content falls back under the resolved key.
            if !attributes.contains_key(&key) && !node.text.is_empty() {
                attributes.insert(key.clone(), node.text.clone());
            }
            key
        }
    };

    StaticInput {
        attributes,
        value_key,
    }
}

fn load_eval(node: &XmlNode) -> Eval {
    let reset = node.find("Reset").map(|r| Reset {
        reset_type: r.child_text("ResetType"),
        auto_reset_time: r.child_text("AutoResetTime"),
        eval_reset_source: r.child_text("EvalResetSource"),
    });

    let permanent_preset = node
        .find("PermanentPreset")
        .and_then(|p| p.find("ScanPlanes"))
        .and_then(|sp| sp.find("ScanPlane"))
        .map(|plane| PermanentPreset {
            attributes: plane.attributes.clone(),
            field_mode: plane.child_text("FieldMode"),
        });

    let cases = node
        .find("Cases")
        .map(|cases| cases.find_all("Case").map(load_eval_case).collect())
        .unwrap_or_default();

    Eval {
        attributes: node.attributes.clone(),
        name: node.child_text("Name"),
        name_latin9_key: node.child_text("NameLatin9Key"),
        q: node.child_text("Q"),
        reset: reset.unwrap_or_default(),
        permanent_preset: permanent_preset.unwrap_or_default(),
        cases,
    }
}

fn load_eval_case(node: &XmlNode) -> EvalCase {
    let scan_plane = node
        .find("ScanPlanes")
        .and_then(|sp| sp.find("ScanPlane"))
        .map(|plane| EvalScanPlane {
            attributes: plane.attributes.clone(),
            user_field_id: plane.child_text("UserFieldId"),
            is_splitted: plane.child_text("IsSplitted"),
        });

    EvalCase {
        attributes: node.attributes.clone(),
        scan_plane: scan_plane.unwrap_or_default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::path::Path;

    const CASETABLE_SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <SdImportExport>
            <Export_CasetablesAndCases>
                <Casetable Index="0" Name="Main">
                    <Configuration>
                        <ConfigItem Key="Foo" Value="Bar" />
                    </Configuration>
                    <Cases>
                        <Case Name="CaseA" Index="1">
                            <StaticInputs>
                                <StaticInput>
                                    <Match>High</Match>
                                </StaticInput>
                            </StaticInputs>
                            <SpeedActivation Mode="Auto" />
                            <ExtraNode Flag="1" />
                        </Case>
                    </Cases>
                    <Evals>
                        <Eval Index="10">
                            <Name>Eval One</Name>
                            <NameLatin9Key>KEY</NameLatin9Key>
                            <Q>42</Q>
                            <Reset>
                                <ResetType>Auto</ResetType>
                            </Reset>
                            <PermanentPreset>
                                <ScanPlanes>
                                    <ScanPlane Orientation="Horizontal">
                                        <FieldMode>Protective</FieldMode>
                                    </ScanPlane>
                                </ScanPlanes>
                            </PermanentPreset>
                            <Cases>
                                <Case Index="5">
                                    <ScanPlanes>
                                        <ScanPlane Axis="X">
                                            <UserFieldId>UF1</UserFieldId>
                                            <IsSplitted>true</IsSplitted>
                                        </ScanPlane>
                                    </ScanPlanes>
                                </Case>
                            </Cases>
                        </Eval>
                    </Evals>
                    <FieldsConfiguration Enabled="true" />
                </Casetable>
            </Export_CasetablesAndCases>
        </SdImportExport>"#;

    #[test]
    fn fallback_when_sample_is_missing() {
        let doc = SgDocument::from_path(Path::new("missing.sgexml"));
        let payload = load_casetable_payload(&doc);

        assert_eq!(
            payload.casetable_attributes.get("Index").map(String::as_str),
            Some("0")
        );
        assert!(payload.cases.is_empty());
        assert_eq!(payload.layout, TableSegment::WELL_KNOWN.to_vec());
    }

    #[test]
    fn fallback_on_invalid_markup() {
        let doc =
            SgDocument::from_source("<SdImportExport><Export_CasetablesAndCases></SdImportExport");
        let payload = load_casetable_payload(&doc);
        assert_eq!(
            payload.casetable_attributes.get("Index").map(String::as_str),
            Some("0")
        );
    }

    #[test]
    fn structured_extraction_of_cases_and_evals() {
        let doc = SgDocument::from_source(CASETABLE_SAMPLE);
        let payload = load_casetable_payload(&doc);

        assert_eq!(
            payload.casetable_attributes.get("Name").map(String::as_str),
            Some("Main")
        );
        assert_eq!(
            payload.configuration.as_ref().map(|c| c.tag.as_str()),
            Some("Configuration")
        );
        assert_eq!(
            payload
                .fields_configuration
                .as_ref()
                .map(|c| c.tag.as_str()),
            Some("FieldsConfiguration")
        );
        assert_eq!(payload.layout, TableSegment::WELL_KNOWN.to_vec());

        let case = &payload.cases[0];
        assert_eq!(case.attributes.get("Name").map(String::as_str), Some("CaseA"));
        assert_eq!(case.static_inputs[0].value_key, "Match");
        assert_eq!(
            case.static_inputs[0].attributes.get("Match").map(String::as_str),
            Some("High")
        );
        let activation = case.speed_activation.as_ref().unwrap();
        assert_eq!(activation.mode_key, "Mode");
        assert!(case
            .layout
            .iter()
            .any(|seg| matches!(seg, CaseSegment::Node { .. })));

        let eval = &payload.evals.evals[0];
        assert_eq!(eval.name, "Eval One");
        assert_eq!(eval.name_latin9_key, "KEY");
        assert_eq!(eval.q, "42");
        assert_eq!(eval.reset.reset_type, "Auto");
        assert_eq!(eval.permanent_preset.field_mode, "Protective");
        assert_eq!(eval.cases[0].scan_plane.user_field_id, "UF1");
        assert_eq!(eval.cases[0].scan_plane.is_splitted, "true");
    }

    #[test]
    fn value_key_resolves_from_attributes_and_bare_text() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport>
                <Export_CasetablesAndCases>
                    <Casetable Index="0">
                        <Cases>
                            <Case Name="A">
                                <StaticInputs>
                                    <StaticInput State="On"/>
                                    <StaticInput Channel="2">High</StaticInput>
                                </StaticInputs>
                            </Case>
                        </Cases>
                    </Casetable>
                </Export_CasetablesAndCases>
            </SdImportExport>"#,
        );
        let payload = load_casetable_payload(&doc);
        let inputs = &payload.cases[0].static_inputs;

        // No text-bearing child: the priority list runs over the attributes
        // and State is the first candidate present.
        assert_eq!(inputs[0].value_key, "State");
        assert_eq!(
            inputs[0].attributes.get("State").map(String::as_str),
            Some("On")
        );

        // No candidate attribute at all: bare element text folds in under
        // the default key.
        assert_eq!(inputs[1].value_key, "Value");
        assert_eq!(
            inputs[1].attributes.get("Value").map(String::as_str),
            Some("High")
        );
        assert_eq!(
            inputs[1].attributes.get("Channel").map(String::as_str),
            Some("2")
        );
    }

    #[test]
    fn selects_table_index_zero_over_document_order() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport>
                <Export_CasetablesAndCases>
                    <Casetable Index="1" Name="Secondary"/>
                    <Casetable Index="0" Name="Primary"/>
                </Export_CasetablesAndCases>
            </SdImportExport>"#,
        );
        let payload = load_casetable_payload(&doc);
        assert_eq!(
            payload.casetable_attributes.get("Name").map(String::as_str),
            Some("Primary")
        );
    }

    #[test]
    fn missing_index_attribute_is_forced_to_zero() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport>
                <Export_CasetablesAndCases>
                    <Casetable Name="Unindexed"/>
                </Export_CasetablesAndCases>
            </SdImportExport>"#,
        );
        let payload = load_casetable_payload(&doc);
        assert_eq!(
            payload.casetable_attributes.get("Index").map(String::as_str),
            Some("0")
        );
        assert_eq!(
            payload.casetable_attributes.get("Name").map(String::as_str),
            Some("Unindexed")
        );
    }

    #[test]
    fn unknown_children_ride_along_in_layout_order() {
        let doc = SgDocument::from_source(
            r#"<SdImportExport>
                <Export_CasetablesAndCases>
                    <Casetable Index="0">
                        <VendorBlob Opaque="yes"/>
                        <Cases/>
                    </Casetable>
                </Export_CasetablesAndCases>
            </SdImportExport>"#,
        );
        let payload = load_casetable_payload(&doc);

        assert!(matches!(
            payload.layout.first(),
            Some(TableSegment::Node { node }) if node.tag == "VendorBlob"
        ));
        assert!(matches!(payload.layout.get(1), Some(TableSegment::Cases)));
        // Missing well-known kinds are appended after what was present.
        assert_eq!(payload.layout.len(), 5);
        assert!(matches!(
            payload.layout.last(),
            Some(TableSegment::FieldsConfiguration)
        ));
    }
}
