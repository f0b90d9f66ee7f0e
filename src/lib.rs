//! Core of the `.sgexml` safety-field editor: bidirectional conversion
//! between the vendor scanner-export XML dialect and the editable in-memory
//! model, including the shape registry that de-duplicates geometry across
//! the legacy (inline) and new (referenced) dialect variants.
//!
//! The HTTP layer, templating, and plotting live elsewhere; they only
//! consume and produce the [`model::DocumentModel`] payload defined here.

pub mod export;
pub mod ids;
pub mod import;
pub mod model;
pub mod registry;
pub mod xml;

pub use export::serialize_document;
pub use import::{load_casetable_payload, load_document_model, load_fieldsets_and_shapes, SgDocument};
