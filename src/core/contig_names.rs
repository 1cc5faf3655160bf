use std::collections::HashMap;

use crate::core::types::{Assembler, VertexId};

/// How assembler-native contig names are reduced to a lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContigKey {
    /// First whitespace-delimited token of the name
    Exact,
    /// SPAdes `NODE_<n>_length_...`: the contig number
    SpadesNode,
    /// SGA `contig-<n>`: the contig number
    SgaContig,
}

impl ContigKey {
    #[must_use]
    pub fn for_assembler(assembler: Assembler) -> Self {
        match assembler {
            Assembler::Spades => Self::SpadesNode,
            Assembler::Sga => Self::SgaContig,
            Assembler::Megahit | Assembler::Flye | Assembler::Canu | Assembler::Miniasm => {
                Self::Exact
            }
        }
    }

    /// Lookup key for `name`. Names that don't follow the expected pattern fall
    /// back to their first token.
    #[must_use]
    pub fn normalize(self, name: &str) -> String {
        let token = name.split_whitespace().next().unwrap_or_default();
        let key = match self {
            Self::Exact => None,
            Self::SpadesNode => spades_node_number(token),
            Self::SgaContig => token
                .strip_prefix("contig-")
                .and_then(|n| n.parse::<u64>().ok()),
        };
        key.map_or_else(|| token.to_string(), |n| n.to_string())
    }
}

/// Extract `<n>` from `NODE_<n>_length_...`
#[must_use]
pub fn spades_node_number(name: &str) -> Option<u64> {
    let rest = name.strip_prefix("NODE_")?;
    let end = rest.find("_length")?;
    rest[..end].parse().ok()
}

/// Bidirectional mapping between vertex ids and contig names.
///
/// Ids are assigned densely in insertion order. Names whose key is already
/// present resolve to the existing vertex (e.g. the reverse-complement entries
/// of a SPAdes paths file).
#[derive(Debug, Clone)]
pub struct ContigNames {
    key: ContigKey,
    names: Vec<String>,
    index: HashMap<String, VertexId>,
}

impl ContigNames {
    #[must_use]
    pub fn new(key: ContigKey) -> Self {
        Self {
            key,
            names: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register `name`, returning its vertex id
    pub fn insert(&mut self, name: impl Into<String>) -> VertexId {
        let name = name.into();
        let key = self.key.normalize(&name);
        if let Some(&vertex) = self.index.get(&key) {
            return vertex;
        }
        let vertex = self.names.len();
        self.index.insert(key, vertex);
        self.names.push(name);
        vertex
    }

    /// Vertex id for a contig name, using this map's key normalisation
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<VertexId> {
        self.index.get(&self.key.normalize(name)).copied()
    }

    #[must_use]
    pub fn name(&self, vertex: VertexId) -> Option<&str> {
        self.names.get(vertex).map(String::as_str)
    }

    /// Replace the display name of an existing vertex, keeping the old key
    /// resolvable and registering the new one
    pub fn rename(&mut self, vertex: VertexId, name: impl Into<String>) {
        if let Some(slot) = self.names.get_mut(vertex) {
            let name = name.into();
            self.index.insert(self.key.normalize(&name), vertex);
            *slot = name;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
