use hydronet_core::prelude::*;
use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};

use crate::network::{PyNetwork, PySegment, core_error, value_error};

/// Route
///
/// An ordered list of ``(branch, offset)`` locations together with the
/// shortest walks joining each consecutive pair. A route is bound to the
/// network it was created on; methods that need topology take it again.
#[gen_stub_pyclass]
#[pyclass(name = "Route")]
pub struct PyRoute {
    route: Route,
    locations: Vec<(String, f64)>,
    segments: Vec<PySegment>,
}

impl PyRoute {
    fn from_route(network: &PyNetwork, route: Route) -> Self {
        let locations = route
            .locations()
            .iter()
            .map(|location| {
                let name = network
                    .network
                    .branch(location.branch)
                    .map(|branch| branch.name.clone())
                    .unwrap_or_default();
                (name, location.offset)
            })
            .collect();
        let segments = route
            .segments()
            .iter()
            .map(|segment| network.py_segment(segment))
            .collect();

        PyRoute {
            route,
            locations,
            segments,
        }
    }
}

#[gen_stub_pymethods]
#[pymethods]
impl PyRoute {
    #[getter]
    pub fn locations(&self) -> Vec<(String, f64)> {
        self.locations.clone()
    }

    /// ``(branch, offset, end_offset, direction_is_positive, length)`` per walked segment
    #[getter]
    pub fn segments(&self) -> Vec<PySegment> {
        self.segments.clone()
    }

    #[getter]
    pub fn length(&self) -> f64 {
        self.route.length()
    }

    #[getter]
    pub fn unit(&self) -> &'static str {
        self.route.unit()
    }

    /// Whether any location lies strictly inside a walked segment
    pub fn contains_loops(&self) -> bool {
        route_contain_loops(&self.route)
    }

    /// Whether some pair of consecutive locations has no connecting path
    pub fn is_disconnected(&self, network: &PyNetwork) -> bool {
        is_disconnected(&network.network, &self.route)
    }

    /// Distance along the route to a location, or ``None`` when the route
    /// does not pass it
    pub fn route_offset(&self, network: &PyNetwork, location: (String, f64)) -> PyResult<Option<f64>> {
        let location = network.location(&location)?;
        Ok(get_route_offset(&self.route, &location.into()))
    }

    /// Route offsets of every location of the route
    pub fn location_offsets(&self) -> Vec<Option<f64>> {
        route_location_offsets(&self.route)
    }

    pub fn has_duplicate_offsets(&self) -> bool {
        has_duplicate_offsets(&self.route)
    }

    /// Route segments as a ``GeoJSON`` ``FeatureCollection`` string
    pub fn to_geojson(&self, network: &PyNetwork) -> PyResult<String> {
        self.route
            .to_geojson_string(&network.network)
            .map_err(core_error)
    }

    fn __repr__(&self) -> String {
        format!(
            "Route with {} locations, {} segments, length {:.3} {}",
            self.locations.len(),
            self.segments.len(),
            self.route.length(),
            self.route.unit()
        )
    }

    fn __len__(&self) -> usize {
        self.locations.len()
    }
}

/// Create a route through ``(branch, offset)`` locations
///
/// Consecutive locations are joined by their shortest walk. A pair without a
/// connecting path contributes no segments; check ``Route.is_disconnected``.
///
/// Raises
/// ------
/// ValueError
///     If a branch is unknown
#[gen_stub_pyfunction]
#[pyfunction]
pub fn create_route(network: &PyNetwork, locations: Vec<(String, f64)>) -> PyResult<PyRoute> {
    let locations = locations
        .iter()
        .map(|location| network.location(location))
        .collect::<PyResult<Vec<_>>>()?;

    let route = hydronet_core::create_route(&network.network, &locations)
        .map_err(|e| value_error(format!("Failed to create route: {e}")))?;
    Ok(PyRoute::from_route(network, route))
}
