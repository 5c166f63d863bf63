use serde::{Deserialize, Serialize};

/// The three derived volumes of a version diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffCategory {
    /// Geometry present in both versions: `Intersect(old, new)`.
    Unchanged,
    /// Geometry only in the new version: `Subtract(new, old)`.
    Added,
    /// Geometry only in the old version: `Subtract(old, new)`.
    Removed,
}

impl DiffCategory {
    pub const ALL: [DiffCategory; 3] = [
        DiffCategory::Unchanged,
        DiffCategory::Added,
        DiffCategory::Removed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DiffCategory::Unchanged => "Unchanged",
            DiffCategory::Added => "Added",
            DiffCategory::Removed => "Removed",
        }
    }
}

impl std::fmt::Display for DiffCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
