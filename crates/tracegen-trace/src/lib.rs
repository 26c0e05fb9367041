//! Traceability model for model-to-text generation.
//!
//! A [`TraceabilityModel`] is populated during one generation run and queried
//! afterwards. It records, for every span of generated text, which module element
//! produced it and which input model elements contributed to it.
//!
//! # Modules
//!
//! - [`model`]: Resources, module elements, input elements and generated text spans
//! - [`query`]: Read-side queries (position lookup, reverse index, per-resource spans)
//! - [`error`]: Validation errors raised while recording spans

pub mod error;
pub mod model;
pub mod query;

pub use error::TraceError;
pub use model::{
    ElementKind, GeneratedText, InputElement, InputElementId, ModuleElementId,
    ModuleElementRecord, Resource, ResourceId, ResourceKind, SpanId, TraceabilityModel,
};
pub use query::Provenance;
