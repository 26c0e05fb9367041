//! `generate`: run templates against input models and report what was produced.

use std::iter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tracegen_engine::{
    CancellationFlag, CompiledExpression, ElementHandle, EvaluationRequest, EvaluationResult,
    EvaluationStatus, Evaluator, ModelSet, ObjectId,
};
use tracegen_trace::TraceabilityModel;

use crate::cli_config::CliConfig;
use crate::commands::Session;
use crate::output::{self, Destination};
use crate::GenerateArgs;

pub(crate) fn handle_generate_command(
    args: GenerateArgs,
    cli_config: &CliConfig,
) -> anyhow::Result<()> {
    let mut engine = cli_config.engine.clone();
    if let Some(strategy) = args.strategy {
        engine.strategy = strategy;
    }
    if let Some(root) = args.output {
        engine.output_root = root;
    }
    let strategy = engine.strategy;

    let session = Session::load(&args.input)?;
    let evaluator = Evaluator::new(engine, Arc::clone(&session.models));

    let result = match args.element.as_deref() {
        Some(name) => {
            let module = Arc::clone(&session.module);
            let module_name = &session.module.name;
            let handle = ElementHandle::by_name(module, name)
                .with_context(|| format!("module '{module_name}' has no element '{name}'"))?;
            let request = EvaluationRequest::new(CompiledExpression::Element(handle))
                .with_targets(session.targets.iter().copied())
                .with_variables(session.variables.iter().cloned());
            evaluator.evaluate(request)
        }
        None => {
            let targets = if session.targets.is_empty() {
                whole_model(&session.models)
            } else {
                session.targets.clone()
            };
            tracing::debug!(
                module = %session.module.name,
                targets = targets.len(),
                "Running main templates"
            );
            let module = Arc::clone(&session.module);
            evaluator.generate_main(module, &targets, &CancellationFlag::new())
        }
    };

    output::header(format!("Generation ({strategy})"));
    report(&result, cli_config.show_preview);

    let trace_out = args
        .trace_out
        .or_else(|| cli_config.trace_out.as_ref().map(PathBuf::from));
    if let Some(path) = trace_out {
        write_trace(&result.trace, &path)?;
        output::label("Trace", path.display());
    }

    match result.status {
        EvaluationStatus::Completed(_) => {
            output::done(format!("{} resource(s) generated", result.resources.len()));
            Ok(())
        }
        EvaluationStatus::Cancelled => bail!("generation cancelled"),
        EvaluationStatus::Failed(error) => {
            Err(anyhow::Error::new(error).context("generation failed"))
        }
    }
}

/// Every object of the loaded models, each root followed by its contents.
fn whole_model(models: &ModelSet) -> Vec<ObjectId> {
    models
        .roots()
        .into_iter()
        .flat_map(|root| iter::once(root).chain(models.all_contents(root)))
        .collect()
}

fn report(result: &EvaluationResult, show_preview: bool) {
    for resource in &result.resources {
        let destination = match &resource.path {
            None => Destination::Preview,
            Some(path) if resource.written => Destination::Written(path),
            Some(path) => Destination::Unchanged(path),
        };
        output::resource(&resource.location, destination);
        if resource.path.is_none() && show_preview {
            output::text(&resource.content);
        }
        if !resource.lost_regions.is_empty() {
            let ids: Vec<&str> = resource
                .lost_regions
                .iter()
                .map(|r| r.id.as_str())
                .collect();
            output::warning(format!(
                "{}: protected region(s) not regenerated: {}",
                resource.location,
                ids.join(", ")
            ));
        }
    }
    for abandoned in &result.abandoned {
        let location = &abandoned.location;
        output::warning(format!("{location}: abandoned, nothing written"));
    }
}

fn write_trace(trace: &TraceabilityModel, path: &Path) -> anyhow::Result<()> {
    let json = trace.to_json_string()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let dir = parent.display();
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{dir}'"))?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write trace '{}'", path.display()))?;
    tracing::debug!(?path, spans = trace.spans().len(), "Wrote traceability model");
    Ok(())
}
