use pyo3::prelude::*;
use pyo3_stub_gen::define_stub_info_gatherer;

use network::{PyNetwork, load_network};
use route::{PyRoute, create_route};

pub mod network;
pub mod route;

/// Branch/node network routing implemented in Rust.
#[pymodule]
fn hydronet(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyNetwork>()?;
    m.add_function(wrap_pyfunction!(load_network, m)?)?;

    m.add_class::<PyRoute>()?;
    m.add_function(wrap_pyfunction!(create_route, m)?)?;
    Ok(())
}

define_stub_info_gatherer!(stub_info);
