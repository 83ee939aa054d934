//! Building and checking routes over a network

use hashbrown::HashSet;
use itertools::Itertools;

use crate::{
    Error, OFFSET_TOLERANCE,
    model::{BranchFeature, Network, NetworkCoverage, NetworkLocation, NetworkSegment, Route},
};

use super::dijkstra::shortest_path;

/// Creates a route visiting `locations` in the given order.
///
/// # Errors
///
/// Returns [`Error::InvalidLocations`] if any location refers to a branch
/// that is not part of `network`.
pub fn create_route(network: &Network, locations: &[NetworkLocation]) -> Result<Route, Error> {
    if locations
        .iter()
        .any(|location| !network.contains_branch(location.branch))
    {
        return Err(Error::InvalidLocations);
    }

    let mut route = Route {
        name: "route".to_string(),
        locations: locations.to_vec(),
        segments: Vec::new(),
    };
    route.refresh_segments(network);
    Ok(route)
}

impl Route {
    /// Recomputes the cached segments from the shortest paths between
    /// consecutive locations.
    pub fn refresh_segments(&mut self, network: &Network) {
        self.segments = self
            .locations
            .iter()
            .tuple_windows()
            .flat_map(|(from, to)| shortest_path(network, from, to))
            .collect();
    }
}

/// Source locations covered by each route segment, in walking order.
fn segment_locations(source: &NetworkCoverage, segment: &NetworkSegment) -> Vec<NetworkLocation> {
    let mut locations: Vec<NetworkLocation> = source
        .locations()
        .iter()
        .filter(|location| location.branch == segment.branch && segment.contains(location.offset))
        .copied()
        .collect();

    for boundary in [segment.start_location(), segment.stop_location()] {
        if !locations.contains(&boundary) {
            locations.push(boundary);
        }
    }

    locations.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    if !segment.direction_is_positive {
        locations.reverse();
    }
    locations
}

/// Every location of `source` that lies on `route`, in walking order,
/// together with the start and end of each route segment.
///
/// A location shared by the end of one segment and the start of the next is
/// listed once.
pub fn get_locations_in_route(source: &NetworkCoverage, route: &Route) -> Vec<NetworkLocation> {
    let mut result: Vec<NetworkLocation> = Vec::new();

    for segment in route.segments() {
        for location in segment_locations(source, segment) {
            if result.last() != Some(&location) {
                result.push(location);
            }
        }
    }

    result
}

/// True if the route passes through one of its own locations a second time,
/// i.e. a location lies strictly inside one of the route segments.
pub fn route_contain_loops(route: &Route) -> bool {
    route.locations().iter().any(|location| {
        route.segments().iter().any(|segment| {
            segment.branch == location.branch && segment.strictly_contains(location.offset)
        })
    })
}

/// True if any two consecutive route locations are not connected.
pub fn is_disconnected(network: &Network, route: &Route) -> bool {
    route
        .locations()
        .iter()
        .tuple_windows()
        .any(|(from, to)| shortest_path(network, from, to).is_empty())
}

/// Distance walked along `route` from its start to the anchor of `feature`.
///
/// Returns `None` when the anchor is not on the route: its branch is not
/// walked, its offset falls outside every segment, or the result would
/// exceed the route length.
pub fn get_route_offset(route: &Route, feature: &BranchFeature) -> Option<f64> {
    let anchor = feature.anchor();
    let mut walked = 0.0;

    for segment in route.segments() {
        if segment.branch == anchor.branch && segment.contains(anchor.offset) {
            let offset = walked + segment.distance_to(anchor.offset).min(segment.length());
            return (offset <= route.length() + OFFSET_TOLERANCE).then_some(offset);
        }
        walked += segment.length();
    }

    None
}

/// Route offsets of the route's own locations.
pub fn route_location_offsets(route: &Route) -> Vec<Option<f64>> {
    route
        .locations()
        .iter()
        .map(|&location| get_route_offset(route, &location.into()))
        .collect()
}

/// True if two route locations end up at the same route offset, or a
/// location cannot be placed on the route at all.
pub fn has_duplicate_offsets(route: &Route) -> bool {
    let offsets = route_location_offsets(route);
    if offsets.iter().any(Option::is_none) {
        return true;
    }

    offsets
        .iter()
        .flatten()
        .sorted_by(|a, b| a.total_cmp(b))
        .tuple_windows()
        .any(|(a, b)| b - a <= OFFSET_TOLERANCE)
}

/// True if no location of `source` lies on more than one route segment.
///
/// Each segment claims the locations from its start up to, but not
/// including, its end; the last segment also claims its end. This way the
/// point where consecutive segments meet is counted once.
pub fn locations_are_unique_on_route(source: &NetworkCoverage, route: &Route) -> bool {
    let segments = route.segments();
    let mut seen: HashSet<usize> = HashSet::new();

    for (idx, segment) in segments.iter().enumerate() {
        let is_last = idx + 1 == segments.len();
        let claimed: HashSet<usize> = source
            .locations()
            .iter()
            .enumerate()
            .filter(|(_, location)| {
                location.branch == segment.branch
                    && segment.contains(location.offset)
                    && (is_last || (location.offset - segment.stop_offset()).abs() > OFFSET_TOLERANCE)
            })
            .map(|(location_idx, _)| location_idx)
            .collect();

        if !seen.is_disjoint(&claimed) {
            return false;
        }
        seen.extend(claimed);
    }

    true
}
