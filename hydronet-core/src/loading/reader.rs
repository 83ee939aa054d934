//! `GeoJSON` feature collection to network conversion

use geo::{LineString, Point};
use geojson::{Feature, GeoJson};
use rstar::{RTree, primitives::GeomWithData};

use crate::{Error, NodeId, model::Network};

type IndexedNode = GeomWithData<[f64; 2], NodeId>;

/// Merges nearby endpoints into shared nodes
struct NodeSnapper {
    tree: RTree<IndexedNode>,
    tolerance: f64,
}

impl NodeSnapper {
    fn new(tolerance: f64) -> Self {
        Self {
            tree: RTree::new(),
            tolerance,
        }
    }

    fn find(&self, point: Point<f64>) -> Option<NodeId> {
        let nearest = self.tree.nearest_neighbor(&[point.x(), point.y()])?;
        let [x, y] = *nearest.geom();
        ((x - point.x()).hypot(y - point.y()) <= self.tolerance).then_some(nearest.data)
    }

    fn snap_or_insert(&mut self, network: &mut Network, point: Point<f64>) -> NodeId {
        if let Some(node) = self.find(point) {
            return node;
        }
        let name = network.unique_node_name();
        let node = network.add_node(name, point);
        self.tree.insert(GeomWithData::new([point.x(), point.y()], node));
        node
    }
}

fn name_property(feature: &Feature) -> Option<String> {
    feature
        .property("name")
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

fn to_geo(feature: &Feature) -> Option<geo::Geometry<f64>> {
    let geometry = feature.geometry.clone()?;
    match geo::Geometry::<f64>::try_from(geometry) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            log::warn!("Skipping feature with unsupported geometry: {e}");
            None
        }
    }
}

/// Builds a network from a `GeoJSON` `FeatureCollection`.
///
/// `LineString` features become branches from their first to their last
/// coordinate; endpoints within `snap_tolerance` of each other share a node.
/// `Point` features with a `name` property name the node they snap to. A
/// numeric `length_property` on a branch feature sets a custom length.
/// Other geometries and degenerate lines are skipped with a warning.
///
/// # Errors
///
/// Fails if the text is not a `GeoJSON` `FeatureCollection`.
pub fn network_from_geojson(
    name: impl Into<String>,
    geojson: &str,
    snap_tolerance: f64,
    length_property: &str,
) -> Result<Network, Error> {
    let collection = match geojson.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(Error::InvalidData(
                "Expected a GeoJSON FeatureCollection".to_string(),
            ));
        }
    };

    let mut network = Network::new(name);
    let mut snapper = NodeSnapper::new(snap_tolerance);

    let mut lines: Vec<(&Feature, LineString<f64>)> = Vec::new();
    for feature in &collection.features {
        match to_geo(feature) {
            Some(geo::Geometry::Point(point)) => {
                let node = snapper.snap_or_insert(&mut network, point);
                if let Some(name) = name_property(feature) {
                    if let Some(node) = network.graph.node_weight_mut(node) {
                        node.name = name;
                    }
                }
            }
            Some(geo::Geometry::LineString(line)) => lines.push((feature, line)),
            Some(_) => log::warn!("Skipping feature that is neither a Point nor a LineString"),
            None => {}
        }
    }

    for (feature, line) in lines {
        let (Some(&first), Some(&last)) = (line.0.first(), line.0.last()) else {
            log::warn!("Skipping empty LineString");
            continue;
        };
        let source = snapper.snap_or_insert(&mut network, first.into());
        let target = snapper.snap_or_insert(&mut network, last.into());

        let branch_name = name_property(feature)
            .unwrap_or_else(|| format!("Branch{}", network.branch_count() + 1));
        let custom_length = feature
            .property(length_property)
            .and_then(serde_json::Value::as_f64);

        let added = match custom_length {
            Some(length) => {
                network.add_branch_with_length(branch_name, source, target, line, length)
            }
            None => network.add_branch(branch_name, source, target, line),
        };
        if let Err(e) = added {
            log::warn!("Skipping branch: {e}");
        }
    }

    log::info!(
        "Loaded network {} with {} nodes and {} branches",
        network.name,
        network.node_count(),
        network.branch_count()
    );

    Ok(network)
}
