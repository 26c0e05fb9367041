use std::path::Path;
use std::sync::Arc;

use tracegen::engine::{GenerationError, ModuleElement, Parameter, Template, Visibility};
use tracegen::{
    CompiledExpression, ElementHandle, EngineConfig, EngineError, EvaluationRequest,
    EvaluationResult, Evaluator, Expression, Module, Statement, StrategyKind,
};

use crate::common::{library, module};

const EDITED_DUNE: &str = "\
class Dune {
  // Start of user code Dune
  int pages;
  // End of user code
}
";

fn generate(config: EngineConfig, module: Arc<Module>, element: &str) -> EvaluationResult {
    let lib = library();
    let evaluator = Evaluator::new(config, Arc::clone(&lib.models));
    let handle = ElementHandle::by_name(module, element).unwrap();
    let request = EvaluationRequest::new(CompiledExpression::Element(handle));
    evaluator.evaluate(request.with_targets([lib.dune]))
}

fn config(strategy: StrategyKind, root: &Path) -> EngineConfig {
    EngineConfig::default()
        .with_strategy(strategy)
        .with_output_root(root)
}

/// Run `bookFile` on Dune with `strategy`, writing under `root`.
fn book_file(strategy: StrategyKind, root: &Path) -> EvaluationResult {
    generate(config(strategy, root), module(), "bookFile")
}

#[test]
fn test_preview_is_idempotent() {
    let first = generate(EngineConfig::default(), module(), "bookFile");
    let second = generate(EngineConfig::default(), module(), "bookFile");

    assert_eq!(first.resources, second.resources);
    assert_eq!(first.trace.spans(), second.trace.spans());
    assert!(first.resources[0].path.is_none());
}

#[test]
fn test_overwrite_writes_and_skips_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dune.java");

    let first = book_file(StrategyKind::Overwrite, dir.path());
    assert!(first.status.is_completed());
    let written = &first.resources[0];
    assert!(written.written);
    assert_eq!(written.path.as_deref(), Some(path.as_path()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), written.content);

    let second = book_file(StrategyKind::Overwrite, dir.path());
    assert!(!second.resources[0].written);
}

#[test]
fn test_overwrite_discards_user_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dune.java");
    std::fs::write(&path, EDITED_DUNE).unwrap();

    book_file(StrategyKind::Overwrite, dir.path());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("// add members here"));
    assert!(!content.contains("int pages;"));
}

#[test]
fn test_overwrite_into_a_file_root_fails_to_persist() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("not-a-directory");
    std::fs::write(&root, "occupied").unwrap();

    let result = book_file(StrategyKind::Overwrite, &root);
    match result.status.error() {
        Some(EngineError::Generation(GenerationError::ResourcePersistence { location, .. })) => {
            assert_eq!(location, "Dune.java")
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(result.resources.is_empty());
    assert_eq!(result.abandoned.len(), 1);
    assert_eq!(result.abandoned[0].location, "Dune.java");
    assert_eq!(std::fs::read_to_string(&root).unwrap(), "occupied");
}

#[test]
fn test_merge_preserves_protected_regions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dune.java");

    book_file(StrategyKind::Merge, dir.path());
    let generated = std::fs::read_to_string(&path).unwrap();
    let edited = generated.replace("  // add members here\n", "  int pages;\n");
    std::fs::write(&path, edited).unwrap();

    let result = book_file(StrategyKind::Merge, dir.path());
    assert!(result.status.is_completed());
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, EDITED_DUNE);
    assert!(result.resources[0].lost_regions.is_empty());

    // Preserved text is traced to the template but to no model input.
    let offset = content.find("int pages").unwrap();
    let trace = &result.trace;
    let provenance = trace.elements_producing("Dune.java", offset).unwrap();
    assert_eq!(provenance.module_element.name, "bookFile");
    assert!(provenance.inputs.is_empty());
}

#[test]
fn test_merge_round_trip_is_stable() {
    let dir = tempfile::tempdir().unwrap();

    let first = book_file(StrategyKind::Merge, dir.path());
    let second = book_file(StrategyKind::Merge, dir.path());

    assert_eq!(first.resources[0].content, second.resources[0].content);
    assert!(!second.resources[0].written);
    assert_eq!(first.trace.spans().len(), second.trace.spans().len());
}

#[test]
fn test_merge_keeps_regions_that_were_not_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dune.java");
    let obsolete = "// Start of user code Obsolete\nold notes\n// End of user code\n";
    std::fs::write(&path, obsolete).unwrap();

    let result = book_file(StrategyKind::Merge, dir.path());
    assert!(result.status.is_completed());

    let lost = &result.resources[0].lost_regions;
    assert_eq!(lost.len(), 1);
    assert_eq!(lost[0].id, "Obsolete");
    assert_eq!(lost[0].body, "old notes\n");

    let kept = std::fs::read_to_string(dir.path().join("Dune.java.lost")).unwrap();
    assert!(kept.contains("Obsolete"));
    assert!(kept.contains("old notes"));
    let regenerated = std::fs::read_to_string(&path).unwrap();
    assert!(!regenerated.contains("old notes"));
}

/// A template that opens a file, emits some text and then fails.
fn failing_module() -> Arc<Module> {
    let template = Template {
        name: "broken".to_string(),
        visibility: Visibility::Public,
        parameters: vec![Parameter::new("b", "Book")],
        guard: None,
        main: false,
        body: vec![Statement::File {
            url: Expression::literal("broken.txt"),
            body: vec![
                Statement::text("partial "),
                Statement::expr(Expression::var("b").feature("isbn")),
            ],
        }],
    };
    Arc::new(Module {
        name: "broken".to_string(),
        location: "broken.mtl".to_string(),
        elements: vec![ModuleElement::Template(template)],
    })
}

#[test]
fn test_failure_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let engine = config(StrategyKind::Overwrite, dir.path());
    let result = generate(engine, failing_module(), "broken");

    match result.status.error() {
        Some(EngineError::UndefinedOperation {
            operation,
            operand_type,
            ..
        }) => {
            assert_eq!(operation, "isbn");
            assert_eq!(operand_type, "Book");
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(result.resources.is_empty());
    assert_eq!(result.abandoned.len(), 1);
    assert_eq!(result.abandoned[0].location, "broken.txt");
    assert!(result.abandoned[0].partial_content.is_none());
    assert!(!dir.path().join("broken.txt").exists());
}

#[test]
fn test_merge_failure_leaves_existing_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    let existing = "// Start of user code notes\nkeep me\n// End of user code\n";
    std::fs::write(&path, existing).unwrap();

    let engine = config(StrategyKind::Merge, dir.path());
    let result = generate(engine, failing_module(), "broken");

    assert!(result.status.error().is_some());
    assert!(result.resources.is_empty());
    assert_eq!(result.abandoned.len(), 1);
    assert_eq!(result.abandoned[0].location, "broken.txt");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), existing);
    assert!(!dir.path().join("broken.txt.lost").exists());
}

#[test]
fn test_preview_failure_keeps_partial_content() {
    let result = generate(EngineConfig::default(), failing_module(), "broken");
    assert!(result.status.error().is_some());
    let abandoned = &result.abandoned[0];
    assert_eq!(abandoned.partial_content.as_deref(), Some("partial "));
    assert!(!result.trace.resource_for("broken.txt").unwrap().complete);
}
