use tracegen::{
    CompiledExpression, ElementHandle, EngineConfig, EvaluationRequest, Evaluator,
    TraceabilityModel,
};

use crate::common::{library, module};

const DUNE_JAVA: &str = "\
class Dune {
  // Start of user code Dune
  // add members here
  // End of user code
}
";

fn run(element: &str, target: tracegen::ObjectId) -> tracegen::EvaluationResult {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), lib.models);
    let handle = ElementHandle::by_name(module(), element).unwrap();
    let request = EvaluationRequest::new(CompiledExpression::Element(handle));
    evaluator.evaluate(request.with_targets([target]))
}

#[test]
fn test_spans_reconstruct_generated_content() {
    let lib = library();
    let result = run("bookFile", lib.dune);
    assert!(result.status.is_completed());

    let content = &result.resource("Dune.java").unwrap().content;
    assert_eq!(content, DUNE_JAVA);

    let trace = &result.trace;
    let resource = trace.resource_for("Dune.java").unwrap();
    assert!(resource.complete);
    assert_eq!(resource.length, content.chars().count());

    let mut cursor = 0;
    let mut rebuilt = String::new();
    for span in trace.spans_for(resource.id) {
        assert_eq!(span.start, cursor, "spans must tile the resource");
        rebuilt.push_str(trace.text_of(span, content).unwrap());
        cursor = span.end;
    }
    assert_eq!(cursor, resource.length);
    assert_eq!(&rebuilt, content);
}

#[test]
fn test_positions_map_back_to_elements_and_inputs() {
    let lib = library();
    let result = run("summary", lib.lib);
    let content = &result.resource("generated.txt").unwrap().content;
    assert_eq!(content, "City Library: Dune, Emma");

    let trace = &result.trace;

    let name = trace.elements_producing("generated.txt", 0).unwrap();
    assert_eq!(name.module_element.name, "summary");
    assert_eq!(name.inputs.len(), 1);
    assert_eq!(name.inputs[0].object_uri, "library.json#lib");
    assert_eq!(name.inputs[0].feature.as_deref(), Some("name"));

    let dune = trace.elements_producing("generated.txt", 15).unwrap();
    assert_eq!(trace.text_of(dune.span, content), Some("Dune"));
    assert_eq!(dune.inputs[0].object_uri, "library.json#b1");
    assert_eq!(dune.inputs[0].feature.as_deref(), Some("title"));

    // Static text is attributed to the context object without a feature.
    let separator = trace.elements_producing("generated.txt", 18).unwrap();
    assert_eq!(trace.text_of(separator.span, content), Some(", "));
    assert_eq!(separator.inputs[0].object_uri, "library.json#lib");
    assert_eq!(separator.inputs[0].feature, None);

    let end = content.chars().count();
    assert!(trace.elements_producing("generated.txt", end).is_none());
}

#[test]
fn test_reverse_lookup_from_input_object() {
    let lib = library();
    let result = run("summary", lib.lib);
    let content = &result.resource("generated.txt").unwrap().content;
    let trace = &result.trace;

    let emma = trace.spans_for_object("library.json#b2");
    assert_eq!(emma.len(), 1);
    assert_eq!(trace.text_of(emma[0], content), Some("Emma"));

    let title = trace.find_input("library.json#b1", Some("title")).unwrap();
    let spans = trace.spans_for_input(title.id);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].range(), 14..18);

    assert!(trace.find_input("library.json#a1", None).is_none());
}

#[test]
fn test_trace_survives_json_round_trip() {
    let lib = library();
    let result = run("summary", lib.lib);
    let json = result.trace.to_json_string().unwrap();

    let loaded = TraceabilityModel::from_json_str(&json).unwrap();
    assert_eq!(loaded.spans(), result.trace.spans());

    let provenance = loaded.elements_producing("generated.txt", 20).unwrap();
    assert_eq!(provenance.inputs[0].object_uri, "library.json#b2");
    let title = loaded.find_input("library.json#b1", Some("title"));
    assert!(title.is_some());
}
