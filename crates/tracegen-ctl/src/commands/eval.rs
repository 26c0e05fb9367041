//! `eval`: evaluate a compiled expression against input models.

use std::sync::Arc;

use anyhow::bail;
use tracegen_engine::model::{ModelSet, Value};
use tracegen_engine::{
    CompiledExpression, EvaluationOutcome, EvaluationRequest, EvaluationStatus, Evaluator,
    StrategyKind,
};

use crate::cli_config::CliConfig;
use crate::commands::Session;
use crate::{loader, output, EvalArgs};

pub(crate) fn handle_eval_command(args: EvalArgs, cli_config: &CliConfig) -> anyhow::Result<()> {
    let session = Session::load(&args.input)?;
    let expression = loader::load_expression(&args.expression)?;

    // Expressions never write files, whatever the configured strategy.
    let engine = cli_config
        .engine
        .clone()
        .with_strategy(StrategyKind::Preview);
    let evaluator = Evaluator::new(engine, Arc::clone(&session.models));

    let request = EvaluationRequest::new(CompiledExpression::Expression {
        module: Arc::clone(&session.module),
        expression,
    })
    .with_targets(session.targets.iter().copied())
    .with_variables(session.variables.iter().cloned());

    let result = evaluator.evaluate(request);
    for resource in &result.resources {
        if !resource.content.is_empty() {
            output::header(&resource.location);
            output::text(&resource.content);
        }
    }

    match result.status {
        EvaluationStatus::Completed(EvaluationOutcome::Value(value)) => {
            output::plain(display_value(&session.models, &value));
            Ok(())
        }
        EvaluationStatus::Completed(EvaluationOutcome::Generated) => Ok(()),
        EvaluationStatus::Cancelled => bail!("evaluation cancelled"),
        EvaluationStatus::Failed(error) => {
            Err(anyhow::Error::new(error).context("evaluation failed"))
        }
    }
}

/// Render a value for the terminal; objects are shown by URI.
pub(crate) fn display_value(models: &ModelSet, value: &Value) -> String {
    match value {
        Value::Object(id) => models.uri_of(*id),
        Value::String(s) => format!("{s:?}"),
        Value::Collection(items) => {
            let items: Vec<String> = items.iter().map(|v| display_value(models, v)).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        let mut models = ModelSet::new();
        let resource = models.add_resource("lib.json");
        let book = models.add_object(resource, "b1", "Book", None).unwrap();

        let items = vec![Value::Object(book), Value::from("x"), Value::Integer(2)];
        let value = Value::Collection(items);
        assert_eq!(display_value(&models, &value), r#"[lib.json#b1, "x", 2]"#);
        assert_eq!(display_value(&models, &Value::Null), "null");
    }
}
