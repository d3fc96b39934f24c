use crate::geometry::Point;
use derive_more::{AsRef, Deref, From, Into};
use std::fmt;

/// Child indices leading from a root sector down to one of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deref, From, Into, AsRef)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        self.0.iter().try_for_each(|i| write!(f, "/{i}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HitTestEntry {
    Sector(NodePath),
    Box { position: Point },
}

impl HitTestEntry {
    pub fn sector_path(&self) -> Option<&NodePath> {
        match self {
            Self::Sector(path) => Some(path),
            Self::Box { .. } => None,
        }
    }
}

/// Hits in innermost-first order.
#[derive(Debug, Clone, Default)]
pub struct HitTestResult {
    path: Vec<HitTestEntry>,
}

impl HitTestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: HitTestEntry) {
        self.path.push(entry);
    }

    pub fn entries(&self) -> &[HitTestEntry] {
        &self.path
    }

    pub fn first(&self) -> Option<&HitTestEntry> {
        self.path.first()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn sector_paths(&self) -> impl Iterator<Item = &NodePath> {
        self.path.iter().filter_map(HitTestEntry::sector_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Up,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_path_display() {
        assert_eq!(NodePath::root().to_string(), "/");
        assert_eq!(NodePath::root().child(2).child(0).to_string(), "/2/0");
    }

    #[test]
    fn test_sector_paths_skip_box_entries() {
        let mut result = HitTestResult::new();
        result.add(HitTestEntry::Sector(NodePath::from(vec![1])));
        result.add(HitTestEntry::Sector(NodePath::root()));
        result.add(HitTestEntry::Box {
            position: Point::new(1.0, 2.0),
        });
        let paths: Vec<_> = result.sector_paths().cloned().collect();
        assert_eq!(paths, vec![NodePath::from(vec![1]), NodePath::root()]);
    }
}
