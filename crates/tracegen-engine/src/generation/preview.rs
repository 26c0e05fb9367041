use std::collections::HashMap;

use super::{ClosedResource, GenerationError, GenerationStrategy, ResourceHandle};
use crate::config::StrategyKind;

/// Accumulates generated text in memory, keyed by resource identity.
#[derive(Debug, Default)]
pub struct PreviewStrategy {
    next: usize,
    open: HashMap<ResourceHandle, (String, String)>,
}

impl PreviewStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GenerationStrategy for PreviewStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Preview
    }

    fn open_resource(&mut self, location: &str) -> Result<ResourceHandle, GenerationError> {
        let handle = ResourceHandle(self.next);
        self.next += 1;
        let buffer = (location.to_string(), String::new());
        self.open.insert(handle, buffer);
        Ok(handle)
    }

    fn append(&mut self, handle: ResourceHandle, text: &str) -> Result<(), GenerationError> {
        let (_, content) = self
            .open
            .get_mut(&handle)
            .ok_or(GenerationError::UnknownHandle(handle))?;
        content.push_str(text);
        Ok(())
    }

    fn close_resource(
        &mut self,
        handle: ResourceHandle,
    ) -> Result<ClosedResource, GenerationError> {
        let (location, content) = self
            .open
            .remove(&handle)
            .ok_or(GenerationError::UnknownHandle(handle))?;
        Ok(ClosedResource {
            location,
            content,
            path: None,
            written: false,
            lost_regions: Vec::new(),
        })
    }

    fn abandon_resource(&mut self, handle: ResourceHandle) -> Option<String> {
        self.open.remove(&handle).map(|(_, content)| content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_accumulates_per_resource() {
        let mut strategy = PreviewStrategy::new();
        let a = strategy.open_resource("a.txt").unwrap();
        let b = strategy.open_resource("b.txt").unwrap();
        strategy.append(a, "hello ").unwrap();
        strategy.append(b, "other").unwrap();
        strategy.append(a, "world").unwrap();

        let closed = strategy.close_resource(a).unwrap();
        assert_eq!(closed.location, "a.txt");
        assert_eq!(closed.content, "hello world");
        assert!(closed.path.is_none());

        assert_eq!(strategy.abandon_resource(b).as_deref(), Some("other"));
        assert!(matches!(
            strategy.append(a, "late"),
            Err(GenerationError::UnknownHandle(_))
        ));
    }
}
