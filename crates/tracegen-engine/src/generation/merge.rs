use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use super::files::{persist_atomically, FileBuffers};
use super::protected::{render_regions, scan_regions, ProtectedRegion};
use super::{ClosedResource, GenerationError, GenerationStrategy, ResourceHandle};
use crate::config::{RegionMarkers, StrategyKind};

#[derive(Debug, Default)]
struct PreviousRegions {
    regions: Vec<ProtectedRegion>,
    used: HashSet<String>,
}

/// Regenerates files while carrying over the user-written bodies of protected
/// regions found in the previous version.
///
/// Regions of the previous file that the new run does not emit are appended to a
/// sibling file named `<location><lost-suffix>` instead of being dropped.
#[derive(Debug)]
pub struct MergeStrategy {
    buffers: FileBuffers,
    markers: RegionMarkers,
    lost_suffix: String,
    previous: HashMap<ResourceHandle, PreviousRegions>,
}

impl MergeStrategy {
    pub fn new(output_root: &Path, markers: RegionMarkers, lost_suffix: &str) -> Self {
        Self {
            buffers: FileBuffers::new(output_root),
            markers,
            lost_suffix: lost_suffix.to_string(),
            previous: HashMap::new(),
        }
    }

    fn lost_path(&self, path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(&self.lost_suffix);
        PathBuf::from(name)
    }

    fn save_lost(
        &self,
        location: &str,
        path: &Path,
        lost: &[ProtectedRegion],
    ) -> Result<(), GenerationError> {
        let lost_path = self.lost_path(path);
        let mut content = match std::fs::read_to_string(&lost_path) {
            Ok(existing) => existing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(GenerationError::ResourcePersistence {
                    location: location.to_string(),
                    source,
                })
            }
        };
        content.push_str(&render_regions(lost, &self.markers));
        persist_atomically(location, &lost_path, &content)?;
        tracing::warn!(
            location = %location,
            lost = lost.len(),
            path = %lost_path.display(),
            "Protected regions no longer generated, saved to lost file"
        );
        Ok(())
    }
}

impl GenerationStrategy for MergeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Merge
    }

    fn open_resource(&mut self, location: &str) -> Result<ResourceHandle, GenerationError> {
        let (handle, buffer) = self.buffers.open(location)?;
        let previous = match std::fs::read_to_string(&buffer.path) {
            Ok(existing) => PreviousRegions {
                regions: scan_regions(&existing, &self.markers),
                used: HashSet::new(),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => PreviousRegions::default(),
            Err(source) => {
                self.buffers.discard(handle);
                return Err(GenerationError::ResourcePersistence {
                    location: location.to_string(),
                    source,
                });
            }
        };
        tracing::debug!(
            location = %location,
            regions = previous.regions.len(),
            "Opened resource for merge"
        );
        self.previous.insert(handle, previous);
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
        let previous = self.previous.remove(&handle).unwrap_or_default();
        let lost: Vec<ProtectedRegion> = previous
            .regions
            .into_iter()
            .filter(|r| !previous.used.contains(&r.id))
            .collect();

        // Lost regions are saved before the file that drops them is replaced.
        if !lost.is_empty() {
            self.save_lost(&buffer.location, &buffer.path, &lost)?;
        }

        let written = persist_atomically(&buffer.location, &buffer.path, &buffer.content)?;
        tracing::debug!(location = %buffer.location, written, "Closed resource");
        Ok(ClosedResource {
            location: buffer.location,
            content: buffer.content,
            path: Some(buffer.path),
            written,
            lost_regions: lost,
        })
    }

    fn abandon_resource(&mut self, handle: ResourceHandle) -> Option<String> {
        self.previous.remove(&handle);
        self.buffers.discard(handle);
        None
    }

    fn preserved_region(&mut self, handle: ResourceHandle, id: &str) -> Option<String> {
        let previous = self.previous.get_mut(&handle)?;
        if previous.used.contains(id) {
            return None;
        }
        let region = previous.regions.iter().find(|r| r.id == id)?;
        previous.used.insert(id.to_string());
        Some(region.body.clone())
    }
}
