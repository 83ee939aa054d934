use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::json;

use crate::{
    Error, geometry,
    model::{Network, NetworkSegment, Route},
};

/// Converts a walk over the network to a `GeoJSON` `FeatureCollection`,
/// one `LineString` feature per segment, oriented in walking direction.
///
/// # Errors
///
/// Fails if a segment refers to a branch outside `network`.
pub fn segments_to_geojson(
    network: &Network,
    segments: &[NetworkSegment],
) -> Result<FeatureCollection, Error> {
    let features = segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| segment_feature(network, idx, segment))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

fn segment_feature(
    network: &Network,
    idx: usize,
    segment: &NetworkSegment,
) -> Result<Feature, Error> {
    let branch = network.branch(segment.branch).ok_or(Error::UnknownBranch)?;

    let from = branch.geometric_distance(segment.start_offset());
    let to = branch.geometric_distance(segment.stop_offset());
    let coordinates: LineString<f64> = geometry::sub_line(branch.geometry(), from, to)
        .ok_or_else(|| Error::InvalidData(format!("Branch {} has no geometry", branch.name)))?;

    let value = json!({
        "type": "Feature",
        "geometry": Geometry::new((&coordinates).into()),
        "properties": {
            "index": idx,
            "branch": branch.name,
            "offset": segment.offset,
            "end_offset": segment.end_offset,
            "direction_is_positive": segment.direction_is_positive,
            "length": segment.length(),
        }
    });

    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

impl Route {
    /// Converts the route segments to a `GeoJSON` `FeatureCollection`.
    pub fn to_geojson(&self, network: &Network) -> Result<FeatureCollection, Error> {
        segments_to_geojson(network, self.segments())
    }

    pub fn to_geojson_string(&self, network: &Network) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson(network)?)
            .map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}
