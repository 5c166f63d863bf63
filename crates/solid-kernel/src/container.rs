//! In-memory [`VersionContainer`] used by callers that already hold kernel
//! handles.

use crate::traits::{ContainerEntry, VersionContainer};
use crate::types::{KernelFault, SolidHandle};

/// A labelled list of entries backed by plain memory.
#[derive(Debug, Clone)]
pub struct VersionDocument {
    label: String,
    entries: Vec<ContainerEntry>,
}

impl VersionDocument {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Vec::new(),
        }
    }

    /// Add an entry holding a solid.
    pub fn with_solid(mut self, name: impl Into<String>, solid: SolidHandle) -> Self {
        self.push(name, Ok(Some(solid)));
        self
    }

    /// Add an entry with no geometry (a sketch, a datum, a group...).
    pub fn with_empty(mut self, name: impl Into<String>) -> Self {
        self.push(name, Ok(None));
        self
    }

    /// Add an entry whose geometry cannot be read.
    pub fn with_unreadable(mut self, name: impl Into<String>, fault: KernelFault) -> Self {
        self.push(name, Err(fault));
        self
    }

    pub fn push(
        &mut self,
        name: impl Into<String>,
        solid: Result<Option<SolidHandle>, KernelFault>,
    ) {
        self.entries.push(ContainerEntry {
            name: name.into(),
            solid,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VersionContainer for VersionDocument {
    fn label(&self) -> &str {
        &self.label
    }

    fn entries(&self) -> Vec<ContainerEntry> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solid_types::FaultKind;

    #[test]
    fn test_entries_keep_insertion_order() {
        let doc = VersionDocument::new("rev-a")
            .with_empty("Sketch")
            .with_solid("Pad", SolidHandle(7))
            .with_unreadable("Broken", KernelFault::new(FaultKind::Other, "bad brep"));

        let entries = doc.entries();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Sketch", "Pad", "Broken"]);
        assert!(matches!(entries[0].solid, Ok(None)));
        assert_eq!(entries[1].solid.as_ref().unwrap(), &Some(SolidHandle(7)));
        assert!(entries[2].solid.is_err());
        assert_eq!(doc.label(), "rev-a");
        assert_eq!(doc.len(), 3);
    }
}
