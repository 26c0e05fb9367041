//! Routes emitted text to the active resource and records a span for every append.

use tracegen_trace::{
    InputElementId, ModuleElementId, ResourceId, ResourceKind, TraceabilityModel,
};

use super::{
    AbandonedResource, ClosedResource, GenerationError, GenerationStrategy, ResourceHandle,
};
use crate::config::{EngineConfig, RegionMarkers};
use crate::error::EngineResult;

#[derive(Debug)]
struct OpenResource {
    handle: ResourceHandle,
    location: String,
    trace_id: ResourceId,
    /// Length in characters, matching trace offsets.
    length: usize,
    ends_with_newline: bool,
}

/// Everything a run leaves behind once the emitter is done.
#[derive(Debug)]
pub(crate) struct EmitterOutput {
    pub closed: Vec<ClosedResource>,
    pub abandoned: Vec<AbandonedResource>,
    pub trace: TraceabilityModel,
}

/// Stack of open resources over a [`GenerationStrategy`].
///
/// Text emitted while no `file` block is active goes to the configured default
/// resource, which is opened lazily at the bottom of the stack.
#[derive(Debug)]
pub(crate) struct Emitter {
    strategy: Box<dyn GenerationStrategy>,
    trace: TraceabilityModel,
    open: Vec<OpenResource>,
    closed: Vec<ClosedResource>,
    abandoned: Vec<AbandonedResource>,
    default_location: String,
    markers: RegionMarkers,
}

impl Emitter {
    pub fn new(strategy: Box<dyn GenerationStrategy>, config: &EngineConfig) -> Self {
        Self {
            strategy,
            trace: TraceabilityModel::new(),
            open: Vec::new(),
            closed: Vec::new(),
            abandoned: Vec::new(),
            default_location: config.default_resource.clone(),
            markers: config.markers.clone(),
        }
    }

    pub fn markers(&self) -> &RegionMarkers {
        &self.markers
    }

    pub fn trace_mut(&mut self) -> &mut TraceabilityModel {
        &mut self.trace
    }

    /// Open `location` on top of the resource stack.
    pub fn open_file(&mut self, location: &str) -> EngineResult<()> {
        if self.open.iter().any(|r| r.location == location) {
            return Err(GenerationError::AlreadyOpen {
                location: location.to_string(),
            }
            .into());
        }
        let traced = self.trace.resource_for(location);
        if traced.is_some_and(|r| r.complete) {
            return Err(GenerationError::AlreadyGenerated {
                location: location.to_string(),
            }
            .into());
        }

        let handle = self.strategy.open_resource(location)?;
        let trace_id = self.trace.resource(location, ResourceKind::Generated);
        tracing::debug!(location = %location, strategy = %self.strategy.kind(), "Opened resource");
        self.open.push(OpenResource {
            handle,
            location: location.to_string(),
            trace_id,
            length: 0,
            ends_with_newline: true,
        });
        Ok(())
    }

    /// Close the innermost open resource.
    pub fn close_file(&mut self) -> EngineResult<()> {
        let Some(resource) = self.open.pop() else {
            return Ok(());
        };
        match self.strategy.close_resource(resource.handle) {
            Ok(closed) => {
                self.trace
                    .complete_resource(resource.trace_id, resource.length)?;
                self.closed.push(closed);
                Ok(())
            }
            Err(e) => {
                self.abandoned.push(AbandonedResource {
                    location: resource.location,
                    partial_content: None,
                });
                Err(e.into())
            }
        }
    }

    /// Append `text` to the active resource, attributed to `element` and `inputs`.
    pub fn emit(
        &mut self,
        text: &str,
        element: ModuleElementId,
        inputs: &[InputElementId],
    ) -> EngineResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.open.is_empty() {
            let location = self.default_location.clone();
            self.open_file(&location)?;
        }
        let Some(resource) = self.open.last_mut() else {
            return Ok(());
        };

        let start = resource.length;
        let end = start + text.chars().count();
        self.strategy.append(resource.handle, text)?;
        self.trace
            .record_span(resource.trace_id, start..end, element, inputs)?;
        resource.length = end;
        resource.ends_with_newline = text.ends_with('\n');
        Ok(())
    }

    /// Whether the active resource is empty or ends with a line break.
    pub fn at_line_start(&self) -> bool {
        self.open.last().is_none_or(|r| r.ends_with_newline)
    }

    /// Previous body of protected region `id` in the active resource.
    pub fn preserved_region(&mut self, id: &str) -> Option<String> {
        let handle = self.open.last()?.handle;
        self.strategy.preserved_region(handle, id)
    }

    /// Close every open resource, innermost first. On failure the remaining
    /// resources are abandoned.
    pub fn close_all(&mut self) -> EngineResult<()> {
        while !self.open.is_empty() {
            if let Err(e) = self.close_file() {
                self.abandon_all();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drop every open resource without materializing it.
    pub fn abandon_all(&mut self) {
        while let Some(resource) = self.open.pop() {
            let partial_content = self.strategy.abandon_resource(resource.handle);
            tracing::debug!(location = %resource.location, "Abandoned resource");
            self.abandoned.push(AbandonedResource {
                location: resource.location,
                partial_content,
            });
        }
    }

    pub fn into_output(self) -> EmitterOutput {
        EmitterOutput {
            closed: self.closed,
            abandoned: self.abandoned,
            trace: self.trace,
        }
    }
}
