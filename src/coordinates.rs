//! Measurement coordinate grids inside a hitbox.
//!
//! A regular lattice is laid over the hitbox and every lattice point farther
//! than `r_max` from the tank axis is dropped, which cuts the square corners
//! of the box off along the cylindrical tank wall.

use itertools::iproduct;
use log::info;
use nalgebra::Point3;
use ndarray::{Array1, Array2, Axis};
use ndarray_stats::QuantileExt;

use crate::error::{GridError, Result};
use crate::geom::{radial_distance, HitBox};


/// Ordered set of measurement coordinates in tank millimetres.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateSet {
    points: Vec<Point3<f64>>,
}

/// Per-axis extent of a coordinate set.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateProps {
    pub count: usize,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl CoordinateSet {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Coordinates as an `(n, 3)` array with columns x, y, z.
    pub fn to_array(&self) -> Array2<f64> {
        let mut array = Array2::<f64>::zeros((self.points.len(), 3));
        for (mut row, point) in array.outer_iter_mut().zip(self.points.iter()) {
            row[0] = point.x;
            row[1] = point.y;
            row[2] = point.z;
        }
        array
    }

    /// Min and max along each axis, `None` if the set is empty.
    pub fn props(&self) -> Option<CoordinateProps> {
        if self.is_empty() {
            return None;
        }
        let array = self.to_array();
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for (ax, column) in array.axis_iter(Axis(1)).enumerate() {
            min[ax] = *column.min().ok()?;
            max[ax] = *column.max().ok()?;
        }
        Some(CoordinateProps {
            count: self.points.len(),
            min,
            max,
        })
    }

    pub fn log_props(&self) {
        match self.props() {
            Some(props) => {
                info!("Properties of the computed coordinates");
                for (ax, name) in ["x", "y", "z"].iter().enumerate() {
                    info!(
                        "{}: min {:.2}\tmax {:.2}",
                        name, props.min[ax], props.max[ax]
                    );
                }
                info!("shape ({}, 3)", props.count);
            }
            None => info!("No coordinates to describe"),
        }
    }
}

impl<'a> IntoIterator for &'a CoordinateSet {
    type Item = &'a Point3<f64>;
    type IntoIter = std::slice::Iter<'a, Point3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Evenly spaced samples over `[min, max]`; one sample yields `min`.
fn axis_samples(min: f64, max: f64, num: usize) -> Array1<f64> {
    let mut samples = Array1::linspace(min, max, num);
    // linspace may overshoot max by an ulp
    if num > 1 {
        samples[num - 1] = max;
    }
    samples
}

/// Number of lattice points before radial filtering.
///
/// Returns [`GridError::InvalidArgument`] if the product overflows `usize`.
pub fn candidate_count(x_pts: usize, y_pts: usize, z_pts: usize) -> Result<usize> {
    x_pts
        .checked_mul(y_pts)
        .and_then(|n| n.checked_mul(z_pts))
        .ok_or_else(|| {
            GridError::InvalidArgument(format!(
                "grid of {} x {} x {} points is too large",
                x_pts, y_pts, z_pts
            ))
        })
}

/// Creates the measurement points inside the hitbox.
///
/// Lays `x_pts * y_pts * z_pts` evenly spaced points over the hitbox and keeps
/// those within `r_max` of the tank axis. Points are ordered with y outermost,
/// then x, then z innermost. An empty result is valid.
pub fn create_meas_coordinates(
    hitbox: &HitBox,
    x_pts: usize,
    y_pts: usize,
    z_pts: usize,
) -> Result<CoordinateSet> {
    if x_pts == 0 || y_pts == 0 || z_pts == 0 {
        return Err(GridError::InvalidArgument(format!(
            "grid point counts must be positive, got ({}, {}, {})",
            x_pts, y_pts, z_pts
        )));
    }

    let candidates = candidate_count(x_pts, y_pts, z_pts)?;
    let xs = axis_samples(hitbox.x_min, hitbox.x_max, x_pts);
    let ys = axis_samples(hitbox.y_min, hitbox.y_max, y_pts);
    let zs = axis_samples(hitbox.z_min, hitbox.z_max, z_pts);

    let mut points = Vec::with_capacity(candidates);
    points.extend(
        iproduct!(ys.iter(), xs.iter(), zs.iter())
            .map(|(&y, &x, &z)| Point3::new(x, y, z))
            .filter(|point| radial_distance(point) <= hitbox.r_max),
    );

    info!(
        "HitBox({}, {}, {}) leads to {} available points",
        x_pts,
        y_pts,
        z_pts,
        points.len()
    );

    Ok(CoordinateSet::new(points))
}
