//! Branch/node graph of a network

use geo::{LineString, Point};
use hashbrown::HashSet;
use petgraph::{Direction, stable_graph::StableDiGraph, visit::EdgeRef};

use crate::{BranchId, Error, NodeId, OFFSET_TOLERANCE, geometry};

use super::BranchFeature;

/// Network node, the place where branches meet
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub geometry: Point<f64>,
}

/// Directed network edge with a polyline geometry and a length
#[derive(Debug, Clone)]
pub struct Branch {
    pub name: String,
    geometry: LineString<f64>,
    geometry_length: f64,
    custom_length: Option<f64>,
    /// Attached features, ordered by offset
    features: Vec<BranchFeature>,
}

impl Branch {
    pub(crate) fn new(name: String, geometry: LineString<f64>, custom_length: Option<f64>) -> Self {
        let geometry_length = geometry::line_length(&geometry);
        Self {
            name,
            geometry,
            geometry_length,
            custom_length,
            features: Vec::new(),
        }
    }

    /// Length used for offsets along the branch.
    pub fn length(&self) -> f64 {
        self.custom_length.unwrap_or(self.geometry_length)
    }

    pub fn is_length_custom(&self) -> bool {
        self.custom_length.is_some()
    }

    pub fn custom_length(&self) -> Option<f64> {
        self.custom_length
    }

    pub fn geometry(&self) -> &LineString<f64> {
        &self.geometry
    }

    /// Arc length of the branch geometry, regardless of any custom length.
    pub fn geometry_length(&self) -> f64 {
        self.geometry_length
    }

    pub fn features(&self) -> &[BranchFeature] {
        &self.features
    }

    /// Converts an offset in branch length units into a distance along the
    /// geometry.
    pub fn geometric_distance(&self, offset: f64) -> f64 {
        let length = self.length();
        if length > 0.0 {
            offset * self.geometry_length / length
        } else {
            0.0
        }
    }

    pub(crate) fn features_mut(&mut self) -> &mut Vec<BranchFeature> {
        &mut self.features
    }

    pub(crate) fn insert_feature(&mut self, feature: BranchFeature) {
        let idx = self
            .features
            .partition_point(|existing| existing.offset() <= feature.offset());
        self.features.insert(idx, feature);
    }
}

/// Directed multigraph of nodes and branches.
///
/// Nodes and branches live in a stable arena, so their ids survive removal
/// of other elements. Iteration order is insertion order; a split branch is
/// replaced in place by its two halves.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub name: String,
    pub(crate) graph: StableDiGraph<Node, Branch>,
    pub(crate) node_order: Vec<NodeId>,
    pub(crate) branch_order: Vec<BranchId>,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, geometry: Point<f64>) -> NodeId {
        let id = self.graph.add_node(Node {
            name: name.into(),
            geometry,
        });
        self.node_order.push(id);
        id
    }

    /// Adds a branch whose length follows its geometry.
    ///
    /// # Errors
    ///
    /// Fails if an endpoint is not part of this network or the geometry has
    /// no length.
    pub fn add_branch(
        &mut self,
        name: impl Into<String>,
        source: NodeId,
        target: NodeId,
        geometry: LineString<f64>,
    ) -> Result<BranchId, Error> {
        self.insert_branch(Branch::new(name.into(), geometry, None), source, target)
    }

    /// Adds a branch with an explicit length that overrides the geometry.
    ///
    /// # Errors
    ///
    /// Fails if an endpoint is not part of this network, the geometry has
    /// fewer than two coordinates, or `length` is negative or not finite.
    pub fn add_branch_with_length(
        &mut self,
        name: impl Into<String>,
        source: NodeId,
        target: NodeId,
        geometry: LineString<f64>,
        length: f64,
    ) -> Result<BranchId, Error> {
        if !length.is_finite() || length < 0.0 {
            return Err(Error::InvalidData(format!("Invalid branch length {length}")));
        }
        self.insert_branch(Branch::new(name.into(), geometry, Some(length)), source, target)
    }

    fn insert_branch(
        &mut self,
        branch: Branch,
        source: NodeId,
        target: NodeId,
    ) -> Result<BranchId, Error> {
        if !self.contains_node(source) || !self.contains_node(target) {
            return Err(Error::UnknownNode);
        }
        if branch.geometry.0.len() < 2 {
            return Err(Error::InvalidData(format!(
                "Branch {} needs at least two coordinates",
                branch.name
            )));
        }
        if !branch.is_length_custom() && branch.geometry_length <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Branch {} has zero length",
                branch.name
            )));
        }

        let id = self.graph.add_edge(source, target, branch);
        self.branch_order.push(id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(id)
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.graph.edge_weight(id)
    }

    pub(crate) fn branch_mut(&mut self, id: BranchId) -> Option<&mut Branch> {
        self.graph.edge_weight_mut(id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.graph.contains_node(id)
    }

    pub fn contains_branch(&self, id: BranchId) -> bool {
        self.graph.edge_weight(id).is_some()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.node_order
            .iter()
            .filter_map(|&id| self.graph.node_weight(id).map(|node| (id, node)))
    }

    /// Branches in insertion order.
    pub fn branches(&self) -> impl Iterator<Item = (BranchId, &Branch)> + '_ {
        self.branch_order
            .iter()
            .filter_map(|&id| self.graph.edge_weight(id).map(|branch| (id, branch)))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn branch_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn total_length(&self) -> f64 {
        self.branches().map(|(_, branch)| branch.length()).sum()
    }

    /// `(source, target)` nodes of a branch.
    pub fn endpoints(&self, branch: BranchId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(branch)
    }

    pub fn source(&self, branch: BranchId) -> Option<NodeId> {
        self.endpoints(branch).map(|(source, _)| source)
    }

    pub fn target(&self, branch: BranchId) -> Option<NodeId> {
        self.endpoints(branch).map(|(_, target)| target)
    }

    /// Branches whose target is `node`.
    pub fn incoming_branches(&self, node: NodeId) -> Vec<BranchId> {
        self.adjacent(node, Direction::Incoming)
    }

    /// Branches whose source is `node`.
    pub fn outgoing_branches(&self, node: NodeId) -> Vec<BranchId> {
        self.adjacent(node, Direction::Outgoing)
    }

    fn adjacent(&self, node: NodeId, direction: Direction) -> Vec<BranchId> {
        let mut ids: Vec<BranchId> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| edge.id())
            .collect();
        if ids.len() > 1 {
            ids.sort_by_cached_key(|id| self.branch_position(*id));
        }
        ids
    }

    fn has_adjacent(&self, node: NodeId, direction: Direction, branch: BranchId) -> bool {
        self.graph
            .edges_directed(node, direction)
            .any(|edge| edge.id() == branch)
    }

    fn branch_position(&self, id: BranchId) -> Option<usize> {
        self.branch_order.iter().position(|&existing| existing == id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    pub fn branch_by_name(&self, name: &str) -> Option<BranchId> {
        self.branches()
            .find(|(_, branch)| branch.name == name)
            .map(|(id, _)| id)
    }

    /// First free name of the form `Node{n}`.
    pub fn unique_node_name(&self) -> String {
        (self.node_count() + 1..)
            .map(|n| format!("Node{n}"))
            .find(|name| self.node_by_name(name).is_none())
            .unwrap_or_default()
    }

    /// First free name of the form `{base}_{n}`.
    pub fn unique_branch_name(&self, base: &str) -> String {
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|name| self.branch_by_name(name).is_none())
            .unwrap_or_default()
    }

    /// Attaches a feature to its branch, keeping the branch's features
    /// ordered by offset.
    ///
    /// # Errors
    ///
    /// Fails if the branch is unknown or the feature does not fit inside
    /// the branch length.
    pub fn add_branch_feature(&mut self, feature: BranchFeature) -> Result<(), Error> {
        let branch = self
            .branch_mut(feature.branch())
            .ok_or(Error::UnknownBranch)?;

        if feature.min_offset() < -OFFSET_TOLERANCE
            || feature.max_offset() > branch.length() + OFFSET_TOLERANCE
        {
            return Err(Error::InvalidData(format!(
                "Feature at offset {} lies outside branch {} of length {}",
                feature.offset(),
                branch.name,
                branch.length()
            )));
        }

        branch.insert_feature(feature);
        Ok(())
    }

    /// Checks the structural invariants of the network.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] describing the first violation found.
    pub fn validate(&self) -> Result<(), Error> {
        let ordered_nodes: HashSet<NodeId> = self.node_order.iter().copied().collect();
        for (id, branch) in self.branches() {
            let (source, target) = self
                .endpoints(id)
                .ok_or_else(|| Error::InvalidState(format!("Branch {} is detached", branch.name)))?;

            if !ordered_nodes.contains(&source) || !ordered_nodes.contains(&target) {
                return Err(Error::InvalidState(format!(
                    "Branch {} connects nodes outside the network",
                    branch.name
                )));
            }
            if !self.has_adjacent(source, Direction::Outgoing, id)
                || !self.has_adjacent(target, Direction::Incoming, id)
            {
                return Err(Error::InvalidState(format!(
                    "Branch {} is missing from its nodes' adjacency",
                    branch.name
                )));
            }
            if !branch.is_length_custom() && branch.length() <= 0.0 {
                return Err(Error::InvalidState(format!(
                    "Branch {} has zero length",
                    branch.name
                )));
            }
            for feature in branch.features() {
                if feature.branch() != id
                    || feature.min_offset() < -OFFSET_TOLERANCE
                    || feature.max_offset() > branch.length() + OFFSET_TOLERANCE
                {
                    return Err(Error::InvalidState(format!(
                        "Feature at offset {} is not placed on branch {}",
                        feature.offset(),
                        branch.name
                    )));
                }
            }
        }

        if self.branch_order.len() != self.branch_count() || self.node_order.len() != self.node_count()
        {
            return Err(Error::InvalidState(
                "Element order out of sync with the network".to_string(),
            ));
        }

        Ok(())
    }
}
