use tracegen::engine::generation::ResourceHandle;
use tracegen::engine::{
    BindingError, ClosedResource, GenerationError, GenerationStrategy, MissingArgumentPolicy,
    OverwriteStrategy,
};
use tracegen::{
    CancellationFlag, CompilationResult, CompiledExpression, ElementHandle, EngineConfig,
    EngineError, EvaluationRequest, Evaluator, Expression, StrategyKind, Value,
};

use crate::common::{library, module};

fn element(name: &str) -> CompiledExpression {
    CompiledExpression::Element(ElementHandle::by_name(module(), name).unwrap())
}

fn expression(expression: Expression) -> CompiledExpression {
    CompiledExpression::Expression {
        module: module(),
        expression,
    }
}

/// Overwrites files like the stock strategy, then raises the cancellation
/// flag once a file has been written.
#[derive(Debug)]
struct CancelOnClose {
    inner: OverwriteStrategy,
    cancellation: CancellationFlag,
}

impl GenerationStrategy for CancelOnClose {
    fn kind(&self) -> StrategyKind {
        self.inner.kind()
    }

    fn open_resource(&mut self, location: &str) -> Result<ResourceHandle, GenerationError> {
        self.inner.open_resource(location)
    }

    fn append(&mut self, handle: ResourceHandle, text: &str) -> Result<(), GenerationError> {
        self.inner.append(handle, text)
    }

    fn close_resource(
        &mut self,
        handle: ResourceHandle,
    ) -> Result<ClosedResource, GenerationError> {
        let closed = self.inner.close_resource(handle)?;
        self.cancellation.cancel();
        Ok(closed)
    }

    fn abandon_resource(&mut self, handle: ResourceHandle) -> Option<String> {
        self.inner.abandon_resource(handle)
    }
}

#[test]
fn test_query_binds_named_then_positional() {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), lib.models.clone());

    let request = EvaluationRequest::new(element("label"))
        .with_targets([lib.dune])
        .with_variable("prefix", "> ");
    let positional = evaluator.evaluate(request);
    assert_eq!(positional.status.value(), Some(&Value::from("> Dune")));

    // A named match wins over the positional target, which is left unused.
    let request = EvaluationRequest::new(element("label"))
        .with_targets([lib.dune])
        .with_variable("prefix", "> ")
        .with_variable("b", Value::Object(lib.emma));
    let named = evaluator.evaluate(request);
    assert_eq!(named.status.value(), Some(&Value::from("> Emma")));
}

#[test]
fn test_missing_argument_fails_before_any_output() {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), lib.models.clone());
    let result = evaluator.evaluate(EvaluationRequest::new(element("bookFile")));

    let Some(EngineError::MissingArgument(binding)) = result.status.error() else {
        panic!("unexpected status: {:?}", result.status);
    };
    let BindingError::MissingArgument { parameter, element } = binding;
    assert_eq!(parameter, "b");
    assert_eq!(element, "bookFile");
    assert!(result.resources.is_empty());
    assert!(result.trace.spans().is_empty());
}

#[test]
fn test_substitute_null_policy_binds_null() {
    let lib = library();
    let config = EngineConfig {
        missing_argument: MissingArgumentPolicy::SubstituteNull,
        ..EngineConfig::default()
    };
    let evaluator = Evaluator::new(config, lib.models.clone());
    let request = EvaluationRequest::new(element("label")).with_targets([lib.dune]);
    let result = evaluator.evaluate(request);

    // `prefix` is bound to null, so the failure comes from the body, not the binder.
    match result.status.error() {
        Some(EngineError::UndefinedOperation {
            operation,
            operand_type,
            ..
        }) => {
            assert_eq!(operation, "concat");
            assert_eq!(operand_type, "Null");
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

#[test]
fn test_expression_environment() {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), lib.models.clone());

    let title = Expression::var("self").feature("title");
    let request = EvaluationRequest::new(expression(title)).with_targets([lib.dune]);
    let single = evaluator.evaluate(request);
    assert_eq!(single.status.value(), Some(&Value::from("Dune")));

    let pages = Expression::var("target").feature("pages");
    let request = EvaluationRequest::new(expression(pages)).with_targets([lib.dune, lib.emma]);
    let many = evaluator.evaluate(request);
    let expected = Value::Collection(vec![Value::Integer(412), Value::Integer(474)]);
    assert_eq!(many.status.value(), Some(&expected));

    let name = Expression::var("model").feature("name");
    let request = EvaluationRequest::new(expression(name)).with_targets([lib.emma]);
    let model = evaluator.evaluate(request);
    assert_eq!(model.status.value(), Some(&Value::from("City Library")));
}

#[test]
fn test_expression_reaches_across_references() {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), lib.models.clone());
    let author = Expression::var("book")
        .feature("author")
        .feature("name")
        .call("toUpper", vec![]);
    let dune = Value::Object(lib.dune);
    let request = EvaluationRequest::new(expression(author)).with_variable("book", dune);
    let result = evaluator.evaluate(request);
    assert_eq!(result.status.value(), Some(&Value::from("FRANK HERBERT")));
}

#[test]
fn test_unresolved_compilation_reports_messages() {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), lib.models.clone());
    let message = "line 3: unknown feature 'titel'".to_string();
    let compilation = CompilationResult::unresolved(vec![message]);
    let result = evaluator.evaluate(EvaluationRequest::new(compilation));
    let error = result.status.error().unwrap();
    assert_eq!(
        error.to_string(),
        "unresolved compilation issue: line 3: unknown feature 'titel'"
    );
}

#[test]
fn test_generate_main_runs_on_matching_targets() {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), lib.models.clone());
    let targets = lib.models.all_contents(lib.lib);
    let result = evaluator.generate_main(module(), &targets, &CancellationFlag::new());

    assert!(result.status.is_completed());
    let locations: Vec<&str> = result
        .resources
        .iter()
        .map(|r| r.location.as_str())
        .collect();
    assert_eq!(locations, vec!["Dune.java", "Emma.java"]);
}

#[test]
fn test_cancellation_is_not_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let lib = library();
    let config = EngineConfig::default()
        .with_strategy(StrategyKind::Overwrite)
        .with_output_root(dir.path());
    let evaluator = Evaluator::new(config, lib.models.clone());

    let cancellation = CancellationFlag::new();
    cancellation.cancel();
    let result = evaluator.generate_main(module(), &[lib.dune, lib.emma], &cancellation);

    assert!(result.status.is_cancelled());
    assert!(result.status.error().is_none());
    assert!(result.resources.is_empty());
    assert!(!dir.path().join("Dune.java").exists());
}

#[test]
fn test_cancellation_keeps_closed_resources() {
    let dir = tempfile::tempdir().unwrap();
    let lib = library();
    let config = EngineConfig::default()
        .with_strategy(StrategyKind::Overwrite)
        .with_output_root(dir.path());
    let evaluator = Evaluator::new(config, lib.models.clone());

    let cancellation = CancellationFlag::new();
    let strategy = CancelOnClose {
        inner: OverwriteStrategy::new(dir.path()),
        cancellation: cancellation.clone(),
    };
    let both = Expression::Sequence {
        items: vec![
            Expression::invoke("bookFile", vec![Expression::var("dune")]),
            Expression::invoke("bookFile", vec![Expression::var("emma")]),
        ],
    };
    let request = EvaluationRequest::new(expression(both))
        .with_variable("dune", Value::Object(lib.dune))
        .with_variable("emma", Value::Object(lib.emma))
        .with_cancellation(cancellation);
    let result = evaluator.evaluate_with(request, Box::new(strategy));

    // The second invocation observes the flag before opening its file.
    assert!(result.status.is_cancelled());
    assert!(result.resource("Dune.java").is_some());
    assert!(dir.path().join("Dune.java").is_file());
    assert!(result.resource("Emma.java").is_none());
    assert!(!dir.path().join("Emma.java").exists());
    assert!(result.abandoned.is_empty());
}
