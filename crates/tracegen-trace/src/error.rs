//! Error types for traceability recording and persistence.

use crate::model::{InputElementId, ModuleElementId, ResourceId, ResourceKind, SpanId};

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("unknown resource id {0}")]
    UnknownResource(ResourceId),

    #[error("unknown module element id {0}")]
    UnknownModuleElement(ModuleElementId),

    #[error("unknown input element id {0}")]
    UnknownInputElement(InputElementId),

    #[error("unknown span id {0}")]
    UnknownSpan(SpanId),

    #[error(
        "resource '{location}' is a {kind} resource and cannot own generated text"
    )]
    NotGenerated {
        location: String,
        kind: ResourceKind,
    },

    #[error("invalid span [{start}, {end}) for '{location}'")]
    InvalidRange {
        location: String,
        start: usize,
        end: usize,
    },

    #[error(
        "span [{start}, {end}) for '{location}' starts before the previous span end {previous_end}"
    )]
    OutOfOrder {
        location: String,
        start: usize,
        end: usize,
        previous_end: usize,
    },

    #[error("resource '{location}' is complete and no longer accepts spans")]
    ResourceComplete { location: String },

    #[error("{entity} stored at index {index} carries id {id}")]
    MisplacedEntity {
        entity: &'static str,
        index: usize,
        id: usize,
    },

    #[error(
        "span {span} is listed by resource {listed_by} but belongs to resource {owner}"
    )]
    SpanOwnership {
        span: SpanId,
        listed_by: ResourceId,
        owner: ResourceId,
    },

    #[error("duplicate {kind} resource '{location}'")]
    DuplicateResource {
        location: String,
        kind: ResourceKind,
    },

    #[error("trace serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
