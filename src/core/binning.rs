use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{BinIndex, VertexId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinningError {
    #[error(
        "Contig {vertex} is assigned to both bin '{first}' and bin '{second}'; \
         each contig in the initial binning result must belong to only one bin"
    )]
    InconsistentLabeling {
        vertex: VertexId,
        first: String,
        second: String,
    },

    #[error("Unknown bin: {0}")]
    UnknownBin(String),

    #[error("Contig {vertex} is out of range for a graph with {node_count} contigs")]
    VertexOutOfRange { vertex: VertexId, node_count: usize },
}

/// Ordered catalog of bin labels.
///
/// Labels are de-duplicated and sorted lexicographically so that bin indices
/// (and therefore tie-breaks during propagation) are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinCatalog {
    labels: Vec<String>,
}

impl BinCatalog {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self {
            labels: labels.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn label(&self, bin: BinIndex) -> Option<&str> {
        self.labels.get(bin).map(String::as_str)
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<BinIndex> {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .ok()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// Partition of contig vertices into bins.
///
/// A vertex belongs to at most one bin at any time. Per-bin members are kept in
/// sorted sets so every traversal is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinAssignment {
    catalog: BinCatalog,
    bins: Vec<BTreeSet<VertexId>>,
    membership: Vec<Option<BinIndex>>,
}

impl BinAssignment {
    /// Create an empty assignment over `node_count` vertices
    #[must_use]
    pub fn new(catalog: BinCatalog, node_count: usize) -> Self {
        Self {
            bins: vec![BTreeSet::new(); catalog.len()],
            membership: vec![None; node_count],
            catalog,
        }
    }

    /// Build an assignment from `(vertex, bin)` records.
    ///
    /// Repeating a record is harmless; assigning one vertex to two different
    /// bins is an error.
    ///
    /// # Errors
    ///
    /// Returns `BinningError::InconsistentLabeling` on conflicting records,
    /// `BinningError::VertexOutOfRange` or `BinningError::UnknownBin` on bad ids.
    pub fn from_records<I>(
        catalog: BinCatalog,
        node_count: usize,
        records: I,
    ) -> Result<Self, BinningError>
    where
        I: IntoIterator<Item = (VertexId, BinIndex)>,
    {
        let mut assignment = Self::new(catalog, node_count);
        for (vertex, bin) in records {
            assignment.assign(vertex, bin)?;
        }
        Ok(assignment)
    }

    /// Put `vertex` into `bin`. Returns `false` if it was already there.
    ///
    /// # Errors
    ///
    /// Returns `BinningError::InconsistentLabeling` if the vertex is in another bin.
    pub fn assign(&mut self, vertex: VertexId, bin: BinIndex) -> Result<bool, BinningError> {
        let node_count = self.node_count();
        let slot = self
            .membership
            .get_mut(vertex)
            .ok_or(BinningError::VertexOutOfRange { vertex, node_count })?;
        if bin >= self.bins.len() {
            return Err(BinningError::UnknownBin(bin.to_string()));
        }

        match *slot {
            Some(current) if current == bin => Ok(false),
            Some(current) => Err(BinningError::InconsistentLabeling {
                vertex,
                first: self.catalog.label(current).unwrap_or_default().to_string(),
                second: self.catalog.label(bin).unwrap_or_default().to_string(),
            }),
            None => {
                *slot = Some(bin);
                self.bins[bin].insert(vertex);
                Ok(true)
            }
        }
    }

    /// Strip the label of `vertex`, returning the bin it was in
    pub fn unassign(&mut self, vertex: VertexId) -> Option<BinIndex> {
        let bin = self.membership.get_mut(vertex)?.take()?;
        self.bins[bin].remove(&vertex);
        Some(bin)
    }

    #[must_use]
    pub fn bin_of(&self, vertex: VertexId) -> Option<BinIndex> {
        self.membership.get(vertex).copied().flatten()
    }

    #[must_use]
    pub fn is_binned(&self, vertex: VertexId) -> bool {
        self.bin_of(vertex).is_some()
    }

    #[must_use]
    pub fn members(&self, bin: BinIndex) -> &BTreeSet<VertexId> {
        &self.bins[bin]
    }

    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.membership.len()
    }

    #[must_use]
    pub fn catalog(&self) -> &BinCatalog {
        &self.catalog
    }

    /// Number of vertices that currently carry a label
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.bins.iter().map(BTreeSet::len).sum()
    }

    /// All labelled vertices, ascending
    pub fn binned_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.membership
            .iter()
            .enumerate()
            .filter_map(|(vertex, bin)| bin.map(|_| vertex))
    }

    /// All unlabelled vertices, ascending
    pub fn unbinned_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.membership
            .iter()
            .enumerate()
            .filter_map(|(vertex, bin)| bin.is_none().then_some(vertex))
    }

    /// `(bin, vertex)` pairs in bin order, vertices ascending within a bin
    pub fn iter(&self) -> impl Iterator<Item = (BinIndex, VertexId)> + '_ {
        self.bins
            .iter()
            .enumerate()
            .flat_map(|(bin, members)| members.iter().map(move |&vertex| (bin, vertex)))
    }
}
