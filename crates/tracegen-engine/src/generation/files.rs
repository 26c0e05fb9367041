//! Buffers and atomic persistence shared by the file-backed strategies.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use super::{GenerationError, ResourceHandle};

#[derive(Debug)]
pub(super) struct FileBuffer {
    pub location: String,
    pub path: PathBuf,
    pub content: String,
}

/// Open buffers of a file-backed strategy.
#[derive(Debug)]
pub(super) struct FileBuffers {
    root: PathBuf,
    next: usize,
    open: HashMap<ResourceHandle, FileBuffer>,
}

impl FileBuffers {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            next: 0,
            open: HashMap::new(),
        }
    }

    pub fn open(
        &mut self,
        location: &str,
    ) -> Result<(ResourceHandle, &FileBuffer), GenerationError> {
        let path = resolve_location(&self.root, location)?;
        let handle = ResourceHandle(self.next);
        self.next += 1;
        let buffer = self.open.entry(handle).or_insert(FileBuffer {
            location: location.to_string(),
            path,
            content: String::new(),
        });
        Ok((handle, buffer))
    }

    pub fn append(&mut self, handle: ResourceHandle, text: &str) -> Result<(), GenerationError> {
        self.open
            .get_mut(&handle)
            .ok_or(GenerationError::UnknownHandle(handle))?
            .content
            .push_str(text);
        Ok(())
    }

    pub fn take(&mut self, handle: ResourceHandle) -> Result<FileBuffer, GenerationError> {
        self.open
            .remove(&handle)
            .ok_or(GenerationError::UnknownHandle(handle))
    }

    pub fn discard(&mut self, handle: ResourceHandle) {
        if let Some(buffer) = self.open.remove(&handle) {
            tracing::debug!(location = %buffer.location, "Discarded unfinished resource");
        }
    }
}

/// Resolve `location` under `root`, rejecting absolute paths and `..` escapes.
pub(super) fn resolve_location(root: &Path, location: &str) -> Result<PathBuf, GenerationError> {
    let invalid = |reason: &str| GenerationError::InvalidLocation {
        location: location.to_string(),
        reason: reason.to_string(),
    };

    let relative = Path::new(location);
    if location.trim().is_empty() {
        return Err(invalid("empty location"));
    }
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the output root"))
            }
        }
    }
    Ok(root.join(relative))
}

/// Write `content` to `path` through a temporary file in the same directory, then
/// rename it into place. Returns `false` if the file already had this content.
pub(super) fn persist_atomically(
    location: &str,
    path: &Path,
    content: &str,
) -> Result<bool, GenerationError> {
    let io_err = |source| GenerationError::ResourcePersistence {
        location: location.to_string(),
        source,
    };

    if let Ok(existing) = std::fs::read_to_string(path) {
        if existing == content {
            tracing::debug!(location = %location, "Generated content unchanged, skipping write");
            return Ok(false);
        }
    }

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(io_err)?;

    // The temporary file is removed on drop if anything below fails.
    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(content.as_bytes()).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(true)
}
