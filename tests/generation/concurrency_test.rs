use std::sync::Arc;
use std::thread;

use tracegen::{CompiledExpression, ElementHandle, EngineConfig, EvaluationRequest, Evaluator};

use crate::common::{library, module};

#[test]
fn test_parallel_runs_share_models() {
    let lib = library();
    let evaluator = Evaluator::new(EngineConfig::default(), Arc::clone(&lib.models));
    let module = module();
    let targets = [lib.dune, lib.emma];

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let evaluator = evaluator.clone();
            let handle = ElementHandle::by_name(Arc::clone(&module), "bookFile").unwrap();
            let target = targets[i % 2];
            let request = EvaluationRequest::new(CompiledExpression::Element(handle));
            let request = request.with_targets([target]);
            thread::spawn(move || evaluator.evaluate(request))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.join().unwrap();
        assert!(result.status.is_completed());
        let expected = ["Dune.java", "Emma.java"][i % 2];
        assert_eq!(result.resources.len(), 1);
        assert_eq!(result.resources[0].location, expected);
        // Each run owns its traceability model.
        let resources = result.trace.resources();
        assert_eq!(resources.iter().filter(|r| r.complete).count(), 1);
    }
}
