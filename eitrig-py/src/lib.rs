use eitrig::{
    coordinates, geom::HitBox, geom::ObjectProperties, geom::TankProperties, hitbox, scaling,
    scaling::IntDomain,
};
use pyo3::prelude::*;

/// Safe placement limits of an object inside the tank.
#[pyfunction]
#[pyo3(signature = (tank, object, tolerance = 5.0))]
fn compute_hitbox(
    tank: &TankProperties,
    object: &ObjectProperties,
    tolerance: f64,
) -> PyResult<HitBox> {
    Ok(hitbox::compute_hitbox(tank, object, tolerance)?)
}

/// Measurement coordinates as a list of `(x, y, z)` tuples.
#[pyfunction]
fn create_meas_coordinates(
    hitbox: &HitBox,
    x_pts: usize,
    y_pts: usize,
    z_pts: usize,
) -> PyResult<Vec<(f64, f64, f64)>> {
    let coords = coordinates::create_meas_coordinates(hitbox, x_pts, y_pts, z_pts)?;
    Ok(coords.iter().map(|p| (p.x, p.y, p.z)).collect())
}

/// Voxel index of a `(y, x, z)` coordinate, returned in the same order.
#[pyfunction]
#[pyo3(signature = (coordinate, hitbox, new_min = 0, new_max = 32, d = 3))]
fn scale_realworld_to_intdomain(
    coordinate: (f64, f64, f64),
    hitbox: &HitBox,
    new_min: i64,
    new_max: i64,
    d: i64,
) -> PyResult<(i64, i64, i64)> {
    let domain = IntDomain::new(new_min, new_max, d)?;
    let (y, x, z) = coordinate;
    let index = scaling::scale_realworld_to_intdomain([y, x, z], hitbox, &domain)?;
    Ok((index.y, index.x, index.z))
}

#[pymodule]
fn _eitrig_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute_hitbox, m)?)?;
    m.add_function(wrap_pyfunction!(create_meas_coordinates, m)?)?;
    m.add_function(wrap_pyfunction!(scale_realworld_to_intdomain, m)?)?;
    m.add_class::<TankProperties>()?;
    m.add_class::<ObjectProperties>()?;
    m.add_class::<HitBox>()?;
    Ok(())
}
