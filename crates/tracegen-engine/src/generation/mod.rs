//! Generation strategies: where emitted text materializes.
//!
//! A [`GenerationStrategy`] owns the content of every resource opened during a run.
//! The engine drives it through the emitter, which also records a traceability span
//! for every append. Three strategies are provided:
//!
//! - [`PreviewStrategy`]: in memory only
//! - [`OverwriteStrategy`]: buffered, atomically written on close
//! - [`MergeStrategy`]: like overwrite, but protected regions of the existing file
//!   are carried over

mod emitter;
mod files;
mod merge;
mod overwrite;
mod preview;
pub mod protected;

use std::fmt;
use std::path::PathBuf;

pub(crate) use emitter::Emitter;
#[cfg(test)]
pub(crate) use emitter::EmitterOutput;
pub use merge::MergeStrategy;
pub use overwrite::OverwriteStrategy;
pub use preview::PreviewStrategy;
pub use protected::ProtectedRegion;

use crate::config::{EngineConfig, StrategyKind};

/// Opaque handle to a resource opened on a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub(crate) usize);

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resource whose generation completed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedResource {
    /// Identity as named by the template (relative to the output root).
    pub location: String,
    /// Final content, including any preserved protected regions.
    pub content: String,
    /// Filesystem path, for persisted strategies.
    pub path: Option<PathBuf>,
    /// `false` when the persisted file already had this exact content.
    pub written: bool,
    /// Protected regions of the previous file that were not regenerated.
    pub lost_regions: Vec<ProtectedRegion>,
}

/// A resource left unfinished by a failed or cancelled run.
#[derive(Debug, Clone, PartialEq)]
pub struct AbandonedResource {
    pub location: String,
    /// In-memory content kept for inspection (preview only); persisted strategies
    /// discard it and leave the filesystem untouched.
    pub partial_content: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("failed to persist '{location}': {source}")]
    ResourcePersistence {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid output location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("resource '{location}' is already open")]
    AlreadyOpen { location: String },

    #[error("resource '{location}' was already generated in this run")]
    AlreadyGenerated { location: String },

    #[error("unknown resource handle {0}")]
    UnknownHandle(ResourceHandle),
}

/// Policy object deciding where emitted characters go.
///
/// Implementations buffer until [`close_resource`](Self::close_resource) so that a
/// failed run never leaves a half-written file behind.
pub trait GenerationStrategy: Send + fmt::Debug {
    fn kind(&self) -> StrategyKind;

    fn open_resource(&mut self, location: &str) -> Result<ResourceHandle, GenerationError>;

    fn append(&mut self, handle: ResourceHandle, text: &str) -> Result<(), GenerationError>;

    fn close_resource(
        &mut self,
        handle: ResourceHandle,
    ) -> Result<ClosedResource, GenerationError>;

    /// Drop an unfinished resource. Returns the partial content when the strategy
    /// keeps it for inspection.
    fn abandon_resource(&mut self, handle: ResourceHandle) -> Option<String>;

    /// Previous content of protected region `id`, if the strategy preserves it.
    /// A region is handed out at most once per resource.
    fn preserved_region(&mut self, _handle: ResourceHandle, _id: &str) -> Option<String> {
        None
    }
}

/// Instantiate the strategy selected in `config`.
pub fn strategy_for(config: &EngineConfig) -> Box<dyn GenerationStrategy> {
    match config.strategy {
        StrategyKind::Preview => Box::new(PreviewStrategy::new()),
        StrategyKind::Overwrite => Box::new(OverwriteStrategy::new(&config.output_root)),
        StrategyKind::Merge => Box::new(MergeStrategy::new(
            &config.output_root,
            config.markers.clone(),
            &config.lost_suffix,
        )),
    }
}
