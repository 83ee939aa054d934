use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::{
    Direction,
    visit::{EdgeRef, NodeIndexable},
};
use rayon::prelude::*;

use crate::{
    BranchId, NodeId,
    model::{Network, NetworkLocation, NetworkSegment},
};

use super::state::{State, Vertex};

/// Part of a branch walked to reach a vertex
#[derive(Copy, Clone, Debug)]
struct Step {
    from: Vertex,
    branch: BranchId,
    start: f64,
    end: f64,
}

impl Step {
    fn cost(&self) -> f64 {
        (self.end - self.start).abs()
    }
}

/// Where a location sits on its branch, with the offset clamped to the
/// branch length so partial edge weights stay non-negative.
#[derive(Copy, Clone, Debug)]
struct Anchor {
    branch: BranchId,
    offset: f64,
    length: f64,
    source: NodeId,
    target: NodeId,
}

impl Anchor {
    fn new(network: &Network, location: &NetworkLocation) -> Option<Self> {
        let (source, target) = network.endpoints(location.branch)?;
        let length = network.branch(location.branch)?.length();
        Some(Self {
            branch: location.branch,
            offset: location.offset.clamp(0.0, length),
            length,
            source,
            target,
        })
    }
}

/// Shortest walk over the network from `source` to `target`.
///
/// Branches can be walked in both directions. The result is a list of
/// segments oriented from source to target: a partial segment on the source
/// branch, full interior branches, and a partial segment on the target
/// branch. Locations on the same branch are joined by a single segment.
///
/// Returns an empty vector when no path exists or a location refers to a
/// branch outside `network`.
pub fn shortest_path(
    network: &Network,
    source: &NetworkLocation,
    target: &NetworkLocation,
) -> Vec<NetworkSegment> {
    let (Some(from), Some(to)) = (Anchor::new(network, source), Anchor::new(network, target)) else {
        log::debug!("Shortest path requested for a location outside the network");
        return Vec::new();
    };

    if from.branch == to.branch {
        return vec![NetworkSegment::new(from.branch, source.offset, target.offset)];
    }

    let Some(steps) = search(network, &from, &to) else {
        log::trace!("No path between branches {:?} and {:?}", from.branch, to.branch);
        return Vec::new();
    };

    steps
        .into_iter()
        .map(|step| NetworkSegment::new(step.branch, step.start, step.end))
        .collect()
}

/// Total walked length of a path.
pub fn path_length(segments: &[NetworkSegment]) -> f64 {
    segments.iter().map(NetworkSegment::length).sum()
}

/// Path lengths from `source` to each of `targets`, computed in parallel.
/// `None` marks an unreachable target.
pub fn shortest_path_lengths(
    network: &Network,
    source: &NetworkLocation,
    targets: &[NetworkLocation],
) -> Vec<Option<f64>> {
    targets
        .par_iter()
        .map(|target| {
            let path = shortest_path(network, source, target);
            (!path.is_empty()).then(|| path_length(&path))
        })
        .collect()
}

/// Dijkstra's algorithm between the two synthetic endpoints.
/// Returns the walked steps in order, or `None` if the target is unreachable.
fn search(network: &Network, from: &Anchor, to: &Anchor) -> Option<Vec<Step>> {
    let node_bound = network.graph.node_bound();
    let mut settled = FixedBitSet::with_capacity(node_bound + 2);
    let mut distances: HashMap<Vertex, f64> = HashMap::with_capacity(network.node_count() + 2);
    let mut predecessors: HashMap<Vertex, Step> = HashMap::with_capacity(network.node_count() + 2);
    let mut heap = BinaryHeap::new();

    // Start vertex has distance 0
    heap.push(State {
        cost: 0.0,
        vertex: Vertex::Source,
    });
    distances.insert(Vertex::Source, 0.0);

    while let Some(State { cost, vertex }) = heap.pop() {
        if vertex == Vertex::Target {
            break;
        }

        let idx = vertex.index(node_bound);
        if settled.contains(idx) {
            continue;
        }
        settled.insert(idx);

        for (next, step) in neighbours(network, vertex, from, to) {
            let next_cost = cost + step.cost();

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost >= *entry.get() {
                        continue;
                    }
                    *entry.get_mut() = next_cost;
                }
            }
            predecessors.insert(next, step);
            heap.push(State {
                cost: next_cost,
                vertex: next,
            });
        }
    }

    // Follow predecessors backward from target to source
    let mut steps = Vec::new();
    let mut current = Vertex::Target;
    while current != Vertex::Source {
        let step = *predecessors.get(&current)?;
        steps.push(step);
        current = step.from;
    }
    steps.reverse();

    Some(steps)
}

fn neighbours(network: &Network, vertex: Vertex, from: &Anchor, to: &Anchor) -> Vec<(Vertex, Step)> {
    match vertex {
        Vertex::Source => vec![
            (
                Vertex::Node(from.source),
                Step {
                    from: vertex,
                    branch: from.branch,
                    start: from.offset,
                    end: 0.0,
                },
            ),
            (
                Vertex::Node(from.target),
                Step {
                    from: vertex,
                    branch: from.branch,
                    start: from.offset,
                    end: from.length,
                },
            ),
        ],
        Vertex::Target => Vec::new(),
        Vertex::Node(node) => {
            let mut next = Vec::new();

            for edge in network.graph.edges_directed(node, Direction::Outgoing) {
                next.push((
                    Vertex::Node(edge.target()),
                    Step {
                        from: vertex,
                        branch: edge.id(),
                        start: 0.0,
                        end: edge.weight().length(),
                    },
                ));
            }
            for edge in network.graph.edges_directed(node, Direction::Incoming) {
                next.push((
                    Vertex::Node(edge.source()),
                    Step {
                        from: vertex,
                        branch: edge.id(),
                        start: edge.weight().length(),
                        end: 0.0,
                    },
                ));
            }

            if node == to.source {
                next.push((
                    Vertex::Target,
                    Step {
                        from: vertex,
                        branch: to.branch,
                        start: 0.0,
                        end: to.offset,
                    },
                ));
            }
            if node == to.target {
                next.push((
                    Vertex::Target,
                    Step {
                        from: vertex,
                        branch: to.branch,
                        start: to.length,
                        end: to.offset,
                    },
                ));
            }

            next
        }
    }
}
