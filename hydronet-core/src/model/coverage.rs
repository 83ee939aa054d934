//! Location-based coverages and routes

use super::{NetworkLocation, NetworkSegment};

/// Values sampled at locations on a network
#[derive(Debug, Clone, Default)]
pub struct NetworkCoverage {
    pub name: String,
    locations: Vec<NetworkLocation>,
    values: Vec<f64>,
}

impl NetworkCoverage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a sample, replacing the value of an equal location.
    pub fn add(&mut self, location: NetworkLocation, value: f64) {
        match self.locations.iter().position(|existing| *existing == location) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.locations.push(location);
                self.values.push(value);
            }
        }
    }

    pub fn locations(&self) -> &[NetworkLocation] {
        &self.locations
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value_at(&self, location: &NetworkLocation) -> Option<f64> {
        self.locations
            .iter()
            .position(|existing| existing == location)
            .map(|idx| self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl FromIterator<(NetworkLocation, f64)> for NetworkCoverage {
    fn from_iter<T: IntoIterator<Item = (NetworkLocation, f64)>>(iter: T) -> Self {
        let mut coverage = NetworkCoverage::default();
        for (location, value) in iter {
            coverage.add(location, value);
        }
        coverage
    }
}

/// Ordered walk over a network, used as the argument of a coverage.
///
/// Built by [`crate::create_route`]; the segments are a cache of the
/// shortest paths between consecutive locations and go stale when the
/// network topology changes (see [`Route::refresh_segments`]).
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub(crate) locations: Vec<NetworkLocation>,
    pub(crate) segments: Vec<NetworkSegment>,
}

impl Route {
    /// Unit of the route argument (cumulative offset along the route)
    pub const UNIT: &'static str = "m";

    pub fn locations(&self) -> &[NetworkLocation] {
        &self.locations
    }

    pub fn segments(&self) -> &[NetworkSegment] {
        &self.segments
    }

    pub fn unit(&self) -> &'static str {
        Self::UNIT
    }

    /// Total walked length of the route.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(NetworkSegment::length).sum()
    }
}
