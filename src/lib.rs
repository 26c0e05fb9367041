//! # tracegen
//!
//! Model-to-text generation with character-level traceability.
//!
//! This crate re-exports the workspace libraries under one name:
//!
//! - [`engine`]: argument binding, evaluation dispatch and generation strategies
//! - [`trace`]: the traceability model and its queries
//!
//! The most used types are also available at the crate root.

pub use tracegen_engine as engine;
pub use tracegen_trace as trace;

pub use tracegen_engine::{
    CancellationFlag, CompilationResult, CompiledExpression, ElementHandle, EngineConfig,
    EngineError, EvaluationOutcome, EvaluationRequest, EvaluationResult, EvaluationStatus,
    Evaluator, Expression, ModelDocument, ModelSet, Module, NamedVariable, ObjectId, Statement,
    StrategyKind, Value,
};
pub use tracegen_trace::{Provenance, TraceabilityModel};
