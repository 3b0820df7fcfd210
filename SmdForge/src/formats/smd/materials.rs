//! First-seen material name table
//!
//! The packed format stores material names once and refers to them by index
//! from each triangle. The table is derived from triangle order.

use indexmap::IndexSet;

use super::TrianglesBlock;

/// Material names in first-seen order plus each triangle's index into them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialTable {
    names: IndexSet<String>,
    indices: Vec<usize>,
}

impl MaterialTable {
    /// Build the table for a triangles block
    pub fn from_triangles(block: &TrianglesBlock) -> Self {
        let mut names = IndexSet::new();
        let indices = block
            .triangles
            .iter()
            .map(|tri| match names.get_index_of(tri.material.as_str()) {
                Some(index) => index,
                None => names.insert_full(tri.material.clone()).0,
            })
            .collect();

        Self { names, indices }
    }

    /// Distinct material names, first-seen order
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Per-triangle index into [`MaterialTable::names`]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
