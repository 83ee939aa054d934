use geo::LineString;

use crate::{
    BranchId, Error, NodeId, OFFSET_TOLERANCE, geometry,
    model::{Branch, BranchFeature, Network, Node},
};

/// Everything needed to apply a split, computed before the network is touched.
struct SplitPlan {
    source: NodeId,
    target: NodeId,
    point: geo::Point<f64>,
    incoming_geometry: LineString<f64>,
    outgoing_geometry: LineString<f64>,
    incoming_length: Option<f64>,
    outgoing_length: Option<f64>,
}

impl Network {
    /// Splits `branch` in two at a new node `offset` along its geometry.
    ///
    /// The branch is replaced by an incoming half (original source to the new
    /// node, keeping the original name and attached features) and an outgoing
    /// half (new node to the original target). Geometry-derived lengths are
    /// recomputed from the halves; a custom length is divided in proportion
    /// to the geometric split.
    ///
    /// Features beyond the split stay on the incoming half until
    /// [`Network::redistribute_features_after_split`] is called, and segments
    /// or routes computed before the split are not updated.
    ///
    /// # Errors
    ///
    /// Fails without modifying the network if the branch is unknown, its
    /// custom length is zero, or `offset` is not strictly inside the geometry.
    pub fn split_branch_at_node(&mut self, branch: BranchId, offset: f64) -> Result<NodeId, Error> {
        let plan = self.plan_split(branch, offset)?;

        let Some(mut original) = self.graph.remove_edge(branch) else {
            return Err(Error::UnknownBranch);
        };
        let position = self.branch_order.iter().position(|&id| id == branch);
        self.branch_order.retain(|&id| id != branch);

        let node_name = self.unique_node_name();
        let node = self.graph.add_node(Node {
            name: node_name,
            geometry: plan.point,
        });
        self.node_order.push(node);

        let outgoing_name = self.unique_branch_name(&original.name);
        let incoming = Branch::new(
            original.name.clone(),
            plan.incoming_geometry,
            plan.incoming_length,
        );
        let outgoing = Branch::new(outgoing_name, plan.outgoing_geometry, plan.outgoing_length);
        let incoming_id = self.graph.add_edge(plan.source, node, incoming);
        let outgoing_id = self.graph.add_edge(node, plan.target, outgoing);

        let mut features = std::mem::take(original.features_mut());
        for feature in &mut features {
            feature.rebase(incoming_id, 0.0);
        }
        if let Some(incoming) = self.graph.edge_weight_mut(incoming_id) {
            *incoming.features_mut() = features;
        }

        let position = position.unwrap_or(self.branch_order.len());
        self.branch_order.insert(position, incoming_id);
        self.branch_order.insert(position + 1, outgoing_id);

        log::debug!(
            "Split branch {} at {offset}: node {:?}, branches {:?} and {:?}",
            original.name,
            node,
            incoming_id,
            outgoing_id
        );

        Ok(node)
    }

    fn plan_split(&self, branch: BranchId, offset: f64) -> Result<SplitPlan, Error> {
        let (source, target) = self.endpoints(branch).ok_or(Error::UnknownBranch)?;
        let original = self.branch(branch).ok_or(Error::UnknownBranch)?;

        if original.custom_length() == Some(0.0) {
            return Err(Error::InvalidState(format!(
                "Cannot split branch {} with a custom length of zero",
                original.name
            )));
        }

        let geometry_length = original.geometry_length();
        if offset <= OFFSET_TOLERANCE || offset >= geometry_length - OFFSET_TOLERANCE {
            return Err(Error::InvalidSplitOffset {
                offset,
                length: geometry_length,
            });
        }

        let (incoming_geometry, outgoing_geometry) = geometry::split_line(original.geometry(), offset)
            .ok_or(Error::InvalidSplitOffset {
                offset,
                length: geometry_length,
            })?;
        let point = geometry::point_at_distance(original.geometry(), offset).ok_or(
            Error::InvalidSplitOffset {
                offset,
                length: geometry_length,
            },
        )?;

        let (incoming_length, outgoing_length) = match original.custom_length() {
            Some(custom) => {
                let incoming = custom * offset / geometry_length;
                (Some(incoming), Some(custom - incoming))
            }
            None => (None, None),
        };

        Ok(SplitPlan {
            source,
            target,
            point,
            incoming_geometry,
            outgoing_geometry,
            incoming_length,
            outgoing_length,
        })
    }

    /// Moves the features that ended up beyond the split point of `node`
    /// from its incoming branch onto its outgoing branch, shifting their
    /// offsets by the incoming length. Locations are placed by their offset;
    /// a segment reaching across the split is cut there, the part beyond it
    /// moving to the outgoing branch. Returns how many features were placed
    /// on the outgoing branch.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not join exactly one incoming and one outgoing
    /// branch, as a node created by [`Network::split_branch_at_node`] does.
    pub fn redistribute_features_after_split(&mut self, node: NodeId) -> Result<usize, Error> {
        let (incoming_id, outgoing_id) = match (
            self.incoming_branches(node).as_slice(),
            self.outgoing_branches(node).as_slice(),
        ) {
            (&[incoming], &[outgoing]) => (incoming, outgoing),
            _ => {
                return Err(Error::InvalidState(
                    "Node does not join exactly two branches".to_string(),
                ));
            }
        };

        let incoming = self.branch_mut(incoming_id).ok_or(Error::UnknownBranch)?;
        let split_offset = incoming.length();
        let mut stay: Vec<BranchFeature> = Vec::new();
        let mut moved: Vec<BranchFeature> = Vec::new();
        for feature in std::mem::take(incoming.features_mut()) {
            match feature {
                BranchFeature::Segment(segment)
                    if segment.min_offset() < split_offset - OFFSET_TOLERANCE
                        && segment.max_offset() > split_offset + OFFSET_TOLERANCE =>
                {
                    let (lower, upper) = segment.cut_at(split_offset);
                    stay.push(lower.into());
                    moved.push(upper.into());
                }
                _ if feature.max_offset() > split_offset + OFFSET_TOLERANCE => {
                    moved.push(feature);
                }
                _ => stay.push(feature),
            }
        }
        *incoming.features_mut() = stay;

        for feature in &mut moved {
            feature.rebase(outgoing_id, split_offset);
        }

        let count = moved.len();
        let outgoing = self.branch_mut(outgoing_id).ok_or(Error::UnknownBranch)?;
        for feature in moved {
            outgoing.insert_feature(feature);
        }

        log::debug!("Moved {count} features past the split onto {outgoing_id:?}");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NetworkLocation, NetworkSegment, line_network, triangle_network};
    use approx::assert_relative_eq;
    use geo::{Point, line_string};

    fn long_branch(custom_length: Option<f64>) -> (Network, BranchId) {
        let mut network = Network::new("long");
        let a = network.add_node("a", Point::new(0.0, 0.0));
        let b = network.add_node("b", Point::new(600.0, 400.0));
        let geometry = line_string![(x: 0.0, y: 0.0), (x: 600.0, y: 0.0), (x: 600.0, y: 400.0)];
        let branch = match custom_length {
            Some(length) => network.add_branch_with_length("long", a, b, geometry, length),
            None => network.add_branch("long", a, b, geometry),
        }
        .unwrap();
        (network, branch)
    }

    #[test]
    fn test_split_geometry_length() {
        let (mut network, branch) = long_branch(None);
        let node = network.split_branch_at_node(branch, 700.0).unwrap();

        let incoming = network.incoming_branches(node);
        let outgoing = network.outgoing_branches(node);
        assert_eq!(incoming.len(), 1);
        assert_eq!(outgoing.len(), 1);

        let incoming = network.branch(incoming[0]).unwrap();
        let outgoing = network.branch(outgoing[0]).unwrap();
        assert_relative_eq!(incoming.length(), 700.0);
        assert_relative_eq!(outgoing.length(), 300.0);
        assert!(!incoming.is_length_custom());
        assert_eq!(incoming.name, "long");
        assert_eq!(outgoing.name, "long_1");

        let point = network.node(node).unwrap().geometry;
        assert_relative_eq!(point.x(), 600.0);
        assert_relative_eq!(point.y(), 100.0);

        assert_eq!(network.node_count(), 3);
        assert_eq!(network.branch_count(), 2);
        network.validate().unwrap();
    }

    #[test]
    fn test_split_custom_length_is_proportional() {
        let (mut network, branch) = long_branch(Some(1000.0));
        let node = network.split_branch_at_node(branch, 200.0).unwrap();

        let incoming = network.branch(network.incoming_branches(node)[0]).unwrap();
        let outgoing = network.branch(network.outgoing_branches(node)[0]).unwrap();
        assert!(incoming.is_length_custom());
        assert_relative_eq!(incoming.length(), 200.0);
        assert_relative_eq!(outgoing.length(), 800.0);
    }

    #[test]
    fn test_split_custom_length_scales() {
        let (mut network, branch) = long_branch(Some(50.0));
        let node = network.split_branch_at_node(branch, 250.0).unwrap();

        let incoming = network.branch(network.incoming_branches(node)[0]).unwrap();
        let outgoing = network.branch(network.outgoing_branches(node)[0]).unwrap();
        assert_relative_eq!(incoming.length(), 12.5);
        assert_relative_eq!(outgoing.length(), 37.5);
    }

    #[test]
    fn test_split_zero_custom_length_fails_untouched() {
        let (mut network, branch) = long_branch(Some(0.0));
        let result = network.split_branch_at_node(branch, 200.0);

        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert_eq!(network.branch_count(), 1);
        assert_eq!(network.node_count(), 2);
        assert!(network.contains_branch(branch));
    }

    #[test]
    fn test_split_outside_geometry_fails() {
        let (mut network, branch) = line_network();
        for offset in [0.0, 100.0, 150.0, -3.0] {
            let result = network.split_branch_at_node(branch, offset);
            assert!(matches!(result, Err(Error::InvalidSplitOffset { .. })));
        }
        assert!(matches!(
            network.split_branch_at_node(BranchId::new(9), 10.0),
            Err(Error::UnknownBranch)
        ));
        assert_eq!(network.branch_count(), 1);
    }

    #[test]
    fn test_split_keeps_branch_order() {
        let (mut network, [branch1, _, _]) = triangle_network();
        network.split_branch_at_node(branch1, 40.0).unwrap();

        let names: Vec<&str> = network.branches().map(|(_, b)| b.name.as_str()).collect();
        assert_eq!(names, vec!["branch1", "branch1_1", "branch2", "branch3"]);

        let nodes: Vec<&str> = network.nodes().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(nodes, vec!["node1", "node2", "node3", "Node4"]);
    }

    #[test]
    fn test_split_then_redistribute_features() {
        let (mut network, branch) = line_network();
        network
            .add_branch_feature(NetworkLocation::new(branch, 10.0).into())
            .unwrap();
        network
            .add_branch_feature(NetworkLocation::new(branch, 60.0).into())
            .unwrap();
        network
            .add_branch_feature(NetworkSegment::new(branch, 70.0, 90.0).into())
            .unwrap();

        let node = network.split_branch_at_node(branch, 40.0).unwrap();
        let incoming = network.incoming_branches(node)[0];
        let outgoing = network.outgoing_branches(node)[0];

        // not migrated until asked
        assert_eq!(network.branch(incoming).unwrap().features().len(), 3);
        assert!(network.validate().is_err());

        let moved = network.redistribute_features_after_split(node).unwrap();
        assert_eq!(moved, 2);
        network.validate().unwrap();

        let stay = network.branch(incoming).unwrap().features();
        assert_eq!(stay, &[BranchFeature::Location(NetworkLocation::new(incoming, 10.0))]);

        let moved = network.branch(outgoing).unwrap().features();
        assert_relative_eq!(moved[0].offset(), 20.0);
        assert_relative_eq!(moved[1].offset(), 30.0);
        assert_relative_eq!(moved[1].max_offset(), 50.0);
        assert_eq!(moved[1].branch(), outgoing);
    }

    #[test]
    fn test_redistribute_cuts_segment_across_split() {
        let (mut network, branch) = line_network();
        network
            .add_branch_feature(NetworkSegment::new(branch, 30.0, 60.0).into())
            .unwrap();
        network
            .add_branch_feature(NetworkSegment::new(branch, 90.0, 20.0).into())
            .unwrap();

        let node = network.split_branch_at_node(branch, 40.0).unwrap();
        let incoming = network.incoming_branches(node)[0];
        let outgoing = network.outgoing_branches(node)[0];

        let moved = network.redistribute_features_after_split(node).unwrap();
        assert_eq!(moved, 2);
        network.validate().unwrap();

        let stay = network.branch(incoming).unwrap().features();
        assert_eq!(stay.len(), 2);
        assert!(stay.contains(&NetworkSegment::new(incoming, 30.0, 40.0).into()));
        assert!(stay.contains(&NetworkSegment::new(incoming, 40.0, 20.0).into()));

        let moved = network.branch(outgoing).unwrap().features();
        assert_eq!(moved.len(), 2);
        assert!(moved.contains(&NetworkSegment::new(outgoing, 0.0, 20.0).into()));
        assert!(moved.contains(&NetworkSegment::new(outgoing, 50.0, 0.0).into()));
    }

    #[test]
    fn test_redistribute_keeps_features_ending_at_split() {
        let (mut network, branch) = line_network();
        network
            .add_branch_feature(NetworkSegment::new(branch, 10.0, 40.0).into())
            .unwrap();
        network
            .add_branch_feature(NetworkLocation::new(branch, 40.0).into())
            .unwrap();

        let node = network.split_branch_at_node(branch, 40.0).unwrap();
        assert_eq!(network.redistribute_features_after_split(node).unwrap(), 0);
        network.validate().unwrap();
    }

    #[test]
    fn test_redistribute_requires_split_node() {
        let (mut network, _) = triangle_network();
        let node1 = network.node_by_name("node1").unwrap();
        // node1 joins branch3 (in) and branch1 (out), which qualifies
        assert_eq!(network.redistribute_features_after_split(node1).unwrap(), 0);

        let lonely = network.add_node("lonely", Point::new(9.0, 9.0));
        assert!(matches!(
            network.redistribute_features_after_split(lonely),
            Err(Error::InvalidState(_))
        ));
    }
}
