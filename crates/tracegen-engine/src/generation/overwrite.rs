use std::path::Path;

use super::files::{persist_atomically, FileBuffers};
use super::{ClosedResource, GenerationError, GenerationStrategy, ResourceHandle};
use crate::config::StrategyKind;

/// Replaces the file at each location with the generated content.
///
/// Content is buffered and only written on close, through a temporary file that
/// is renamed into place.
#[derive(Debug)]
pub struct OverwriteStrategy {
    buffers: FileBuffers,
}

impl OverwriteStrategy {
    pub fn new(output_root: &Path) -> Self {
        Self {
            buffers: FileBuffers::new(output_root),
        }
    }
}

impl GenerationStrategy for OverwriteStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Overwrite
    }

    fn open_resource(&mut self, location: &str) -> Result<ResourceHandle, GenerationError> {
        let (handle, _) = self.buffers.open(location)?;
        Ok(handle)
    }

    fn append(&mut self, handle: ResourceHandle, text: &str) -> Result<(), GenerationError> {
        self.buffers.append(handle, text)
    }

    fn close_resource(
        &mut self,
        handle: ResourceHandle,
    ) -> Result<ClosedResource, GenerationError> {
        let buffer = self.buffers.take(handle)?;
        let written = persist_atomically(&buffer.location, &buffer.path, &buffer.content)?;
        tracing::debug!(location = %buffer.location, written, "Closed resource");
        Ok(ClosedResource {
            location: buffer.location,
            content: buffer.content,
            path: Some(buffer.path),
            written,
            lost_regions: Vec::new(),
        })
    }

    fn abandon_resource(&mut self, handle: ResourceHandle) -> Option<String> {
        self.buffers.discard(handle);
        None
    }
}
