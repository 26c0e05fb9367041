//! Evaluation engine for compiled templates and queries.
//!
//! The engine takes an already-compiled [`Module`] (templates, queries and
//! expression trees), a read-only [`ModelSet`] of input objects, and produces
//! text through a [`GenerationStrategy`] while recording a
//! [`TraceabilityModel`](tracegen_trace::TraceabilityModel) of where every
//! character came from.
//!
//! # Modules
//!
//! - [`binder`]: formal parameters matched against named variables and targets
//! - [`dispatcher`]: [`Evaluator`], the evaluation entry point
//! - [`generation`]: preview, overwrite and merge strategies
//! - [`compiled`]: compiled module representation
//! - [`model`]: runtime values and input models
//! - [`config`]: engine configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tracegen_engine::{
//!     CompiledExpression, ElementHandle, EngineConfig, EvaluationRequest, Evaluator, ModelSet,
//!     Module,
//! };
//!
//! # fn run(module: Module, models: ModelSet) {
//! let module = Arc::new(module);
//! let targets = models.roots();
//! let evaluator = Evaluator::new(EngineConfig::default(), Arc::new(models));
//! let handle = ElementHandle::by_name(module, "generate").unwrap();
//! let result = evaluator.evaluate(
//!     EvaluationRequest::new(CompiledExpression::Element(handle)).with_targets(targets),
//! );
//! for resource in &result.resources {
//!     println!("{}: {} chars", resource.location, resource.content.chars().count());
//! }
//! # }
//! ```

pub mod binder;
pub mod cancel;
pub mod compiled;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod generation;
mod interpreter;
pub mod model;

pub use binder::{ArgumentBinder, BindingError, NamedVariable};
pub use cancel::CancellationFlag;
pub use compiled::{
    CompilationResult, CompiledExpression, ElementHandle, Expression, Module, ModuleElement,
    Parameter, Query, Statement, Template, Visibility,
};
pub use config::{ConfigError, EngineConfig, MissingArgumentPolicy, RegionMarkers, StrategyKind};
pub use dispatcher::{
    EvaluationOutcome, EvaluationRequest, EvaluationResult, EvaluationStatus, Evaluator,
};
pub use error::{EngineError, EngineResult};
pub use generation::{
    strategy_for, AbandonedResource, ClosedResource, GenerationError, GenerationStrategy,
    MergeStrategy, OverwriteStrategy, PreviewStrategy, ProtectedRegion,
};
pub use model::{ModelDocument, ModelError, ModelObject, ModelSet, ObjectId, Value};
