//! core::graph
//!
//! Version graph representation and operations.
//!
//! # Architecture
//!
//! The version graph is a DAG where:
//! - Nodes are version names
//! - Edges point from child to parent (a version may have many parents)
//! - Roots are versions with no parents
//!
//! Inside a single weave the graph is implicit in the parent index lists.
//! This explicit, name-keyed form exists for operations that combine
//! several weaves, where indices are not comparable.
//!
//! # Invariants
//!
//! - Node order is first-insertion order, which keeps every traversal
//!   deterministic
//! - Graph must be acyclic to be sorted

use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;

use super::types::VersionName;

/// Errors from graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("cycle detected in version graph at: {0}")]
    CycleDetected(String),
}

/// A name-keyed version DAG.
#[derive(Debug, Default, Clone)]
pub struct VersionGraph {
    /// Nodes in first-insertion order
    order: Vec<VersionName>,
    /// Position of each node in `order`
    position: HashMap<VersionName, usize>,
    /// Parent names of each node, in insertion order, without duplicates
    parents: HashMap<VersionName, Vec<VersionName>>,
    /// Cached children sets (derived from parents)
    children: HashMap<VersionName, HashSet<VersionName>>,
}

impl VersionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no new edges. Returns true if it was not present.
    pub fn add_node(&mut self, name: &VersionName) -> bool {
        if self.position.contains_key(name) {
            return false;
        }
        self.position.insert(name.clone(), self.order.len());
        self.order.push(name.clone());
        self.parents.insert(name.clone(), Vec::new());
        true
    }

    /// Add a parent relationship, creating either node as needed.
    ///
    /// This also updates the children cache.
    pub fn add_edge(&mut self, child: &VersionName, parent: &VersionName) {
        self.add_node(child);
        self.add_node(parent);
        let parents = self.parents.entry(child.clone()).or_default();
        if !parents.contains(parent) {
            parents.push(parent.clone());
        }
        self.children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
    }

    /// Parents of a node, in insertion order.
    pub fn parents(&self, name: &VersionName) -> &[VersionName] {
        self.parents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compute a topological ordering, parents before children.
    ///
    /// Among nodes whose parents are all placed, the one inserted first is
    /// placed first, so merging the graphs of two weaves keeps each weave's
    /// own order wherever the combined constraints allow.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] if no ordering exists.
    ///
    /// # Example
    ///
    /// ```
    /// use weavestore::core::graph::VersionGraph;
    /// use weavestore::core::types::VersionName;
    ///
    /// let base = VersionName::new("base").unwrap();
    /// let tip = VersionName::new("tip").unwrap();
    ///
    /// let mut graph = VersionGraph::new();
    /// graph.add_node(&tip);
    /// graph.add_edge(&tip, &base);
    ///
    /// assert_eq!(graph.topological_order().unwrap(), vec![base, tip]);
    /// ```
    pub fn topological_order(&self) -> Result<Vec<VersionName>, GraphError> {
        let mut pending: Vec<usize> = self
            .order
            .iter()
            .map(|name| self.parents(name).len())
            .collect();

        // Ready set keyed by insertion position
        let mut ready: BTreeSet<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(pos, _)| pos)
            .collect();

        let mut result = Vec::with_capacity(self.order.len());
        while let Some(pos) = ready.pop_first() {
            let name = &self.order[pos];
            result.push(name.clone());
            if let Some(children) = self.children.get(name) {
                for child in children {
                    let child_pos = self.position[child];
                    pending[child_pos] -= 1;
                    if pending[child_pos] == 0 {
                        ready.insert(child_pos);
                    }
                }
            }
        }

        if result.len() != self.order.len() {
            let stuck = self
                .order
                .iter()
                .zip(&pending)
                .find(|(_, count)| **count > 0)
                .map(|(name, _)| name.to_string())
                .unwrap_or_default();
            return Err(GraphError::CycleDetected(stuck));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> VersionName {
        VersionName::new(s).unwrap()
    }

    #[test]
    fn empty_graph_sorts_to_nothing() {
        let graph = VersionGraph::new();
        assert!(graph.topological_order().unwrap().is_empty());
    }

    #[test]
    fn edges_create_nodes() {
        let mut graph = VersionGraph::new();
        graph.add_edge(&name("b"), &name("a"));

        assert_eq!(graph.topological_order().unwrap(), vec![name("a"), name("b")]);
        assert_eq!(graph.parents(&name("b")), &[name("a")]);
        assert!(graph.parents(&name("a")).is_empty());
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut graph = VersionGraph::new();
        graph.add_edge(&name("b"), &name("a"));
        graph.add_edge(&name("b"), &name("a"));
        assert_eq!(graph.parents(&name("b")).len(), 1);
    }

    #[test]
    fn topological_order_respects_parents() {
        let mut graph = VersionGraph::new();
        // Insert children before parents on purpose
        graph.add_node(&name("d"));
        graph.add_edge(&name("d"), &name("c"));
        graph.add_edge(&name("c"), &name("b"));
        graph.add_edge(&name("b"), &name("a"));

        let order = graph.topological_order().unwrap();
        let pos = |n: &str| order.iter().position(|x| x == &name(n)).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn topological_order_prefers_insertion_order() {
        let mut graph = VersionGraph::new();
        graph.add_node(&name("a"));
        graph.add_edge(&name("x"), &name("a"));
        graph.add_edge(&name("y"), &name("a"));
        graph.add_edge(&name("b"), &name("a"));

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![name("a"), name("x"), name("y"), name("b")]);
    }

    #[test]
    fn topological_order_is_deterministic() {
        let mut graph = VersionGraph::new();
        graph.add_edge(&name("b"), &name("a"));
        graph.add_edge(&name("c"), &name("a"));

        assert_eq!(
            graph.topological_order().unwrap(),
            graph.topological_order().unwrap()
        );
    }

    #[test]
    fn cycle_is_reported() {
        let mut graph = VersionGraph::new();
        graph.add_edge(&name("a"), &name("b"));
        graph.add_edge(&name("b"), &name("a"));

        assert!(matches!(
            graph.topological_order(),
            Err(GraphError::CycleDetected(_))
        ));
    }
}
