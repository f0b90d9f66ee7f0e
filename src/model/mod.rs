pub mod casetable;
pub mod document;
pub mod fields;
pub mod shape;

// Re-export commonly used types at the model level.
pub use casetable::{
    Case, CaseSegment, CasetablePayload, Eval, EvalCase, EvalScanPlane, EvalsSection,
    PermanentPreset, Reset, SpeedActivation, StaticInput, TableSegment,
};
pub use document::{DocumentModel, FileInfoField, MenuItem};
pub use fields::{Device, Field, Fieldset, FieldsetsPayload, ScanPlane, ShapeRef};
pub use shape::{Geometry, Point, Shape, ShapeType};
