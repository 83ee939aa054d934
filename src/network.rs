use geo::{LineString, Point};
use hydronet_core::prelude::*;
use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};
use rayon::prelude::*;
use wkt::{ToWkt, TryFromWkt};

/// Segment as returned to Python:
/// `(branch, offset, end_offset, direction_is_positive, length)`
pub type PySegment = (String, f64, f64, bool, f64);

pub(crate) fn value_error(message: impl Into<String>) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(message.into())
}

pub(crate) fn core_error(e: Error) -> PyErr {
    match e {
        Error::IoError(e) => PyErr::new::<pyo3::exceptions::PyIOError, _>(e.to_string()),
        other => value_error(other.to_string()),
    }
}

/// Network
///
/// A directed network of named nodes joined by named branches. Every branch
/// carries a polyline geometry and a length; positions on the network are
/// given as ``(branch_name, offset)`` pairs, the offset measured in branch
/// length units from the branch source.
///
/// Example:
///
/// .. code-block:: python
///
///     network = Network("river")
///     network.add_node("a", 0.0, 0.0)
///     network.add_node("b", 100.0, 0.0)
///     network.add_branch("main", "a", "b", "LINESTRING (0 0, 100 0)")
///     network.shortest_path(("main", 10.0), ("main", 90.0))
#[gen_stub_pyclass]
#[pyclass(name = "Network")]
pub struct PyNetwork {
    pub(crate) network: Network,
}

impl PyNetwork {
    pub(crate) fn location(&self, location: &(String, f64)) -> PyResult<NetworkLocation> {
        let (name, offset) = location;
        let branch = self
            .network
            .branch_by_name(name)
            .ok_or_else(|| value_error(format!("Unknown branch: {name}")))?;
        Ok(NetworkLocation::new(branch, *offset))
    }

    fn branch_id(&self, name: &str) -> PyResult<BranchId> {
        self.network
            .branch_by_name(name)
            .ok_or_else(|| value_error(format!("Unknown branch: {name}")))
    }

    fn node_id(&self, name: &str) -> PyResult<NodeId> {
        self.network
            .node_by_name(name)
            .ok_or_else(|| value_error(format!("Unknown node: {name}")))
    }

    pub(crate) fn py_segment(&self, segment: &NetworkSegment) -> PySegment {
        let name = self
            .network
            .branch(segment.branch)
            .map(|branch| branch.name.clone())
            .unwrap_or_default();
        (
            name,
            segment.offset,
            segment.end_offset,
            segment.direction_is_positive,
            segment.length(),
        )
    }
}

#[gen_stub_pymethods]
#[pymethods]
impl PyNetwork {
    #[new]
    #[pyo3(signature = (name = "network"))]
    pub fn new(name: &str) -> Self {
        PyNetwork {
            network: Network::new(name),
        }
    }

    #[getter]
    pub fn name(&self) -> String {
        self.network.name.clone()
    }

    pub fn node_count(&self) -> usize {
        self.network.node_count()
    }

    pub fn branch_count(&self) -> usize {
        self.network.branch_count()
    }

    pub fn total_length(&self) -> f64 {
        self.network.total_length()
    }

    pub fn node_names(&self) -> Vec<String> {
        self.network
            .nodes()
            .map(|(_, node)| node.name.clone())
            .collect()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.network
            .branches()
            .map(|(_, branch)| branch.name.clone())
            .collect()
    }

    /// Add a node at ``(x, y)``. Node names must be unique.
    pub fn add_node(&mut self, name: &str, x: f64, y: f64) -> PyResult<()> {
        if self.network.node_by_name(name).is_some() {
            return Err(value_error(format!("Node {name} already exists")));
        }
        self.network.add_node(name, Point::new(x, y));
        Ok(())
    }

    /// Add a branch between two existing nodes.
    ///
    /// Parameters
    /// ----------
    /// name : str
    ///     Unique branch name
    /// source, target : str
    ///     Names of the end nodes
    /// wkt : str
    ///     ``LINESTRING`` geometry of the branch
    /// length : float, optional
    ///     Custom length; the geometry length is used when omitted
    #[pyo3(signature = (name, source, target, wkt, length = None))]
    pub fn add_branch(
        &mut self,
        name: &str,
        source: &str,
        target: &str,
        wkt: &str,
        length: Option<f64>,
    ) -> PyResult<()> {
        if self.network.branch_by_name(name).is_some() {
            return Err(value_error(format!("Branch {name} already exists")));
        }
        let source = self.node_id(source)?;
        let target = self.node_id(target)?;
        let geometry = LineString::<f64>::try_from_wkt_str(wkt)
            .map_err(|e| value_error(format!("Invalid LINESTRING: {e}")))?;

        match length {
            Some(length) => self
                .network
                .add_branch_with_length(name, source, target, geometry, length),
            None => self.network.add_branch(name, source, target, geometry),
        }
        .map_err(core_error)?;
        Ok(())
    }

    pub fn branch_length(&self, name: &str) -> PyResult<f64> {
        let id = self.branch_id(name)?;
        self.network
            .branch(id)
            .map(Branch::length)
            .ok_or_else(|| value_error(format!("Unknown branch: {name}")))
    }

    /// Names of the source and target nodes of a branch
    pub fn branch_nodes(&self, name: &str) -> PyResult<(String, String)> {
        let id = self.branch_id(name)?;
        let node_name = |node: NodeId| {
            self.network
                .node(node)
                .map(|node| node.name.clone())
                .unwrap_or_default()
        };
        self.network
            .endpoints(id)
            .map(|(source, target)| (node_name(source), node_name(target)))
            .ok_or_else(|| value_error(format!("Unknown branch: {name}")))
    }

    pub fn branch_wkt(&self, name: &str) -> PyResult<String> {
        let id = self.branch_id(name)?;
        self.network
            .branch(id)
            .map(|branch| branch.geometry().to_wkt().to_string())
            .ok_or_else(|| value_error(format!("Unknown branch: {name}")))
    }

    /// Split a branch at a new node ``offset`` along its geometry.
    ///
    /// The original name stays on the upstream half. With
    /// ``redistribute_features`` the features past the split move to the
    /// downstream half. Returns the name of the new node.
    #[pyo3(signature = (branch, offset, redistribute_features = false))]
    pub fn split_branch(
        &mut self,
        branch: &str,
        offset: f64,
        redistribute_features: bool,
    ) -> PyResult<String> {
        let id = self.branch_id(branch)?;
        let node = self
            .network
            .split_branch_at_node(id, offset)
            .map_err(core_error)?;
        if redistribute_features {
            self.network
                .redistribute_features_after_split(node)
                .map_err(core_error)?;
        }
        Ok(self
            .network
            .node(node)
            .map(|node| node.name.clone())
            .unwrap_or_default())
    }

    /// Attach a point feature to a branch
    pub fn add_location(&mut self, location: (String, f64)) -> PyResult<()> {
        let location = self.location(&location)?;
        self.network
            .add_branch_feature(location.into())
            .map_err(core_error)
    }

    /// Attach a stretch feature to a branch
    pub fn add_segment(&mut self, branch: &str, offset: f64, end_offset: f64) -> PyResult<()> {
        let id = self.branch_id(branch)?;
        self.network
            .add_branch_feature(NetworkSegment::new(id, offset, end_offset).into())
            .map_err(core_error)
    }

    /// Offsets of the features on either side of a position on a branch
    pub fn neighbours(&self, location: (String, f64)) -> PyResult<(Option<f64>, Option<f64>)> {
        let location = self.location(&location)?;
        let (before, after) = self
            .network
            .get_neighbours_on_branch(location.branch, location.offset);
        Ok((
            before.map(BranchFeature::offset),
            after.map(BranchFeature::offset),
        ))
    }

    /// Shortest walk between two ``(branch, offset)`` positions, as a list of
    /// ``(branch, offset, end_offset, direction_is_positive, length)``.
    /// Empty when the target cannot be reached.
    pub fn shortest_path(
        &self,
        source: (String, f64),
        target: (String, f64),
    ) -> PyResult<Vec<PySegment>> {
        let source = self.location(&source)?;
        let target = self.location(&target)?;
        Ok(shortest_path(&self.network, &source, &target)
            .iter()
            .map(|segment| self.py_segment(segment))
            .collect())
    }

    /// Length of the shortest walk, or ``None`` when unreachable
    pub fn shortest_path_length(
        &self,
        source: (String, f64),
        target: (String, f64),
    ) -> PyResult<Option<f64>> {
        let source = self.location(&source)?;
        let target = self.location(&target)?;
        Ok(shortest_path_lengths(&self.network, &source, &[target])
            .into_iter()
            .next()
            .flatten())
    }

    /// Shortest walk as a ``GeoJSON`` ``FeatureCollection`` string
    pub fn shortest_path_geojson(
        &self,
        source: (String, f64),
        target: (String, f64),
    ) -> PyResult<String> {
        let source = self.location(&source)?;
        let target = self.location(&target)?;
        let path = shortest_path(&self.network, &source, &target);
        let collection = segments_to_geojson(&self.network, &path).map_err(core_error)?;
        serde_json::to_string(&collection).map_err(|e| value_error(e.to_string()))
    }

    /// Shortest path lengths between every pair of positions
    pub fn distance_matrix(&self, locations: Vec<(String, f64)>) -> PyResult<Vec<Vec<Option<f64>>>> {
        let locations = locations
            .iter()
            .map(|location| self.location(location))
            .collect::<PyResult<Vec<_>>>()?;

        Ok(locations
            .par_iter()
            .map(|source| shortest_path_lengths(&self.network, source, &locations))
            .collect())
    }

    /// Check topology and feature invariants, raising ``ValueError`` on the
    /// first violation
    pub fn validate(&self) -> PyResult<()> {
        self.network.validate().map_err(core_error)
    }

    fn __repr__(&self) -> String {
        format!(
            "Network {} with {} nodes and {} branches",
            self.network.name,
            self.network.node_count(),
            self.network.branch_count()
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

/// Load a network from a ``GeoJSON`` ``FeatureCollection`` file
///
/// Parameters
/// ----------
/// path : str
///     File with ``LineString`` branches and optional named ``Point`` nodes
/// snap_tolerance : float, default=0.01
///     Branch endpoints closer than this share a node
/// name : str, optional
///     Network name, the file stem when omitted
/// length_property : str, default="length"
///     Feature property holding a custom branch length
///
/// Raises
/// ------
/// ValueError
///     If the file is missing or not a valid feature collection
#[gen_stub_pyfunction]
#[pyfunction]
#[pyo3(signature = (path, snap_tolerance = 0.01, name = None, length_property = "length"))]
pub fn load_network(
    path: &str,
    snap_tolerance: f64,
    name: Option<String>,
    length_property: &str,
) -> PyResult<PyNetwork> {
    let config = NetworkConfig {
        path: std::path::PathBuf::from(path),
        name,
        snap_tolerance,
        length_property: length_property.to_string(),
    };

    let network = create_network(&config)
        .map_err(|e| value_error(format!("Failed to load network: {e}")))?;
    Ok(PyNetwork { network })
}
