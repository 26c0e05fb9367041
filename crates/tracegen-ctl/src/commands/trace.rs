//! `trace`: query a traceability model written by `generate --trace-out`.

use std::path::Path;

use anyhow::{bail, Context};
use tracegen_trace::{GeneratedText, TraceabilityModel};

use crate::{output, TraceCommands};

pub(crate) fn handle_trace_command(cmd: TraceCommands) -> anyhow::Result<()> {
    match cmd {
        TraceCommands::At {
            trace,
            file,
            offset,
        } => handle_at(&load_trace(&trace)?, &file, offset),
        TraceCommands::Input {
            trace,
            object,
            feature,
        } => handle_input(&load_trace(&trace)?, &object, feature.as_deref()),
    }
}

fn load_trace(path: &Path) -> anyhow::Result<TraceabilityModel> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace '{}'", path.display()))?;
    TraceabilityModel::from_json_str(&json)
        .with_context(|| format!("invalid trace '{}'", path.display()))
}

fn handle_at(trace: &TraceabilityModel, file: &str, offset: usize) -> anyhow::Result<()> {
    if trace.resource_for(file).is_none() {
        bail!("no generated resource '{file}' in trace");
    }
    let Some(provenance) = trace.elements_producing(file, offset) else {
        bail!("no span covers offset {offset} of '{file}'");
    };

    output::header(format!("{file} @ {offset}"));
    let span = provenance.span;
    output::label("Span", format!("{}..{}", span.start, span.end));
    let element = provenance.module_element;
    let description = format!("{} {}", element.kind, element.signature());
    output::label("Element", description);
    if provenance.inputs.is_empty() {
        output::dim("  (static text)");
    }
    for input in provenance.inputs {
        match &input.feature {
            Some(feature) => output::item(format!("{}.{feature}", input.object_uri)),
            None => output::item(&input.object_uri),
        }
    }
    Ok(())
}

fn handle_input(
    trace: &TraceabilityModel,
    object: &str,
    feature: Option<&str>,
) -> anyhow::Result<()> {
    let spans = match feature {
        Some(feature) => {
            let input = trace
                .find_input(object, Some(feature))
                .with_context(|| format!("'{object}.{feature}' does not appear in trace"))?;
            trace.spans_for_input(input.id)
        }
        None => trace.spans_for_object(object),
    };
    if spans.is_empty() {
        bail!("'{object}' contributed to no generated text");
    }

    output::header(object);
    for span in spans {
        output::item(describe(trace, span));
    }
    Ok(())
}

fn describe(trace: &TraceabilityModel, span: &GeneratedText) -> String {
    let location = trace
        .get_resource(span.resource)
        .map(|r| r.location.as_str())
        .unwrap_or("?");
    let element = trace
        .get_module_element(span.module_element)
        .map(|e| e.name.as_str())
        .unwrap_or("?");
    format!("{location} {}..{} ({element})", span.start, span.end)
}
