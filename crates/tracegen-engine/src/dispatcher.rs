//! Evaluation entry point.
//!
//! [`Evaluator::evaluate`] dispatches on the compiled-expression kind:
//!
//! - a module element (template or query) has its parameters bound by the
//!   [`ArgumentBinder`] and is invoked with the bound arguments;
//! - a free-standing expression is evaluated in an environment binding `self` and
//!   `target` (the single target, or all of them) and `model` (root container of
//!   the first target), plus every named variable.
//!
//! Each call is one generation run with its own strategy instance and traceability
//! model; an `Evaluator` can be shared between threads running independent calls.

use std::collections::HashMap;
use std::sync::Arc;

use tracegen_trace::TraceabilityModel;

use crate::binder::{ArgumentBinder, NamedVariable};
use crate::cancel::CancellationFlag;
use crate::compiled::{
    CompilationResult, CompiledExpression, ElementHandle, Expression, Module, ModuleElement,
    Parameter,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::generation::{
    strategy_for, AbandonedResource, ClosedResource, Emitter, GenerationStrategy,
};
use crate::interpreter::Interpreter;
use crate::model::{ModelSet, ObjectId, Value};

/// Parameter types accepting any object.
const ANY_TYPES: &[&str] = &["OclAny", "EObject", "Object"];

/// One evaluation request.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub compilation: CompilationResult,
    /// Positional fallback for parameters not matched by name.
    pub targets: Vec<ObjectId>,
    pub variables: Vec<NamedVariable>,
    pub cancellation: CancellationFlag,
}

impl EvaluationRequest {
    pub fn new(compilation: impl Into<CompilationResult>) -> Self {
        Self {
            compilation: compilation.into(),
            targets: Vec::new(),
            variables: Vec::new(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = ObjectId>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.push(NamedVariable::new(name, value));
        self
    }

    pub fn with_variables(mut self, variables: impl IntoIterator<Item = NamedVariable>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// What a completed evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// Value of a query or free-standing expression.
    Value(Value),
    /// A template ran; its effect is the generated resources.
    Generated,
}

#[derive(Debug)]
pub enum EvaluationStatus {
    Completed(EvaluationOutcome),
    Failed(EngineError),
    /// Cancellation was observed; distinct from failure.
    Cancelled,
}

impl EvaluationStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Completed(EvaluationOutcome::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&EngineError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Status plus everything the run left behind.
#[derive(Debug)]
pub struct EvaluationResult {
    pub status: EvaluationStatus,
    /// Resources closed during the run, in closing order.
    pub resources: Vec<ClosedResource>,
    /// Resources left unfinished by a failure or cancellation.
    pub abandoned: Vec<AbandonedResource>,
    pub trace: TraceabilityModel,
}

impl EvaluationResult {
    pub fn resource(&self, location: &str) -> Option<&ClosedResource> {
        self.resources.iter().find(|r| r.location == location)
    }
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    config: Arc<EngineConfig>,
    models: Arc<ModelSet>,
}

impl Evaluator {
    pub fn new(config: EngineConfig, models: Arc<ModelSet>) -> Self {
        Self {
            config: Arc::new(config),
            models,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn models(&self) -> &Arc<ModelSet> {
        &self.models
    }

    /// Evaluate `request` with the configured generation strategy.
    pub fn evaluate(&self, request: EvaluationRequest) -> EvaluationResult {
        self.evaluate_with(request, strategy_for(&self.config))
    }

    /// Evaluate `request` with a caller-supplied strategy.
    pub fn evaluate_with(
        &self,
        request: EvaluationRequest,
        strategy: Box<dyn GenerationStrategy>,
    ) -> EvaluationResult {
        let EvaluationRequest {
            compilation,
            targets,
            variables,
            cancellation,
        } = request;

        self.run(strategy, &cancellation, |interpreter| match compilation.compiled {
            None => Err(EngineError::UnresolvedCompilation {
                messages: compilation.messages,
            }),
            Some(CompiledExpression::Element(handle)) => {
                run_element(interpreter, &handle, targets, variables)
            }
            Some(CompiledExpression::Expression { module, expression }) => run_expression(
                interpreter,
                &self.models,
                module,
                &expression,
                targets,
                variables,
            ),
        })
    }

    /// Run every `main` template of `module` on each target whose class its
    /// parameter accepts, as a single generation run.
    pub fn generate_main(
        &self,
        module: Arc<Module>,
        targets: &[ObjectId],
        cancellation: &CancellationFlag,
    ) -> EvaluationResult {
        let strategy = strategy_for(&self.config);
        self.run(strategy, cancellation, |interpreter| {
            let mains = module.main_templates();
            if mains.is_empty() {
                return Err(EngineError::NoMainTemplate {
                    module: module.name.clone(),
                });
            }
            for target in targets {
                let argument = Value::Object(*target);
                for &index in &mains {
                    let parameters = module.elements.get(index).map(ModuleElement::parameters);
                    let accepted = match parameters {
                        Some([parameter]) => accepts(&self.models, parameter, &argument),
                        _ => false,
                    };
                    if accepted {
                        interpreter.invoke(Arc::clone(&module), index, vec![argument.clone()])?;
                    }
                }
            }
            Ok(EvaluationOutcome::Generated)
        })
    }

    fn run(
        &self,
        strategy: Box<dyn GenerationStrategy>,
        cancellation: &CancellationFlag,
        body: impl FnOnce(&mut Interpreter<'_>) -> EngineResult<EvaluationOutcome>,
    ) -> EvaluationResult {
        let strategy_kind = strategy.kind();
        let emitter = Emitter::new(strategy, &self.config);
        let binder = ArgumentBinder::new(self.config.missing_argument);
        let mut interpreter = Interpreter::new(&self.models, binder, cancellation, emitter);

        let outcome = body(&mut interpreter);

        let mut emitter = interpreter.into_emitter();
        let outcome = outcome.and_then(|outcome| emitter.close_all().map(|()| outcome));
        if outcome.is_err() {
            emitter.abandon_all();
        }
        let output = emitter.into_output();

        let status = match outcome {
            Ok(outcome) => EvaluationStatus::Completed(outcome),
            Err(EngineError::Cancelled) => EvaluationStatus::Cancelled,
            Err(error) => EvaluationStatus::Failed(error),
        };
        match &status {
            EvaluationStatus::Completed(_) => {
                tracing::info!(
                    strategy = %strategy_kind,
                    resources = output.closed.len(),
                    spans = output.trace.spans().len(),
                    "Evaluation completed"
                );
            }
            EvaluationStatus::Cancelled => {
                tracing::info!(abandoned = output.abandoned.len(), "Evaluation cancelled");
            }
            EvaluationStatus::Failed(error) => {
                tracing::warn!(
                    error = %error,
                    abandoned = output.abandoned.len(),
                    "Evaluation failed"
                );
            }
        }

        EvaluationResult {
            status,
            resources: output.closed,
            abandoned: output.abandoned,
            trace: output.trace,
        }
    }
}

fn run_element(
    interpreter: &mut Interpreter<'_>,
    handle: &ElementHandle,
    targets: Vec<ObjectId>,
    mut variables: Vec<NamedVariable>,
) -> EngineResult<EvaluationOutcome> {
    let element = handle.element();
    let mut targets = targets.into_iter().map(Value::Object);
    let arguments = interpreter.binder().bind(
        element.name(),
        element.parameters(),
        &mut variables,
        &mut targets,
    )?;
    if !variables.is_empty() {
        tracing::debug!(
            element = %element.name(),
            unused = variables.len(),
            "Named variables not matched by any parameter"
        );
    }

    let value = interpreter.invoke(Arc::clone(handle.module()), handle.index(), arguments)?;
    Ok(match element {
        ModuleElement::Template(_) => EvaluationOutcome::Generated,
        ModuleElement::Query(_) => EvaluationOutcome::Value(value),
    })
}

fn run_expression(
    interpreter: &mut Interpreter<'_>,
    models: &ModelSet,
    module: Arc<Module>,
    expression: &Expression,
    targets: Vec<ObjectId>,
    variables: Vec<NamedVariable>,
) -> EngineResult<EvaluationOutcome> {
    let subject = match targets.as_slice() {
        [single] => Value::Object(*single),
        all => Value::Collection(all.iter().copied().map(Value::Object).collect()),
    };
    let model = targets
        .first()
        .map(|first| Value::Object(models.root_container(*first)))
        .unwrap_or_default();

    let mut bindings = HashMap::from([
        ("self".to_string(), subject.clone()),
        ("target".to_string(), subject),
        ("model".to_string(), model),
    ]);
    for variable in variables {
        bindings.insert(variable.name, variable.value);
    }

    let value = interpreter.evaluate_in(module, bindings, expression)?;
    Ok(EvaluationOutcome::Value(value))
}

fn accepts(models: &ModelSet, parameter: &Parameter, argument: &Value) -> bool {
    ANY_TYPES.contains(&parameter.type_name.as_str())
        || argument.type_name(models) == parameter.type_name
}
