//! Geometry records for the tomography tank and the objects placed inside it.
//!
//! All lengths are in millimetres. The tank frame has its origin on the
//! central axis of the cylinder at the tank floor, so the lateral bounds are
//! symmetric around zero and the vertical bounds start at zero.
//!
//! - [`TankProperties`]: cylindrical tank and its axis-aligned bounding box
//! - [`ObjectProperties`]: a spherical anomaly placed inside the tank
//! - [`HitBox`]: the region an anomaly center may legally occupy

use nalgebra::Point3;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};


/// Cylindrical tank with its axis-aligned bounding box.
#[pyclass]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TankProperties {
    #[pyo3(get)]
    pub diameter: f64,
    #[pyo3(get)]
    pub radius: f64,
    #[pyo3(get)]
    pub x_bounds: (f64, f64),
    #[pyo3(get)]
    pub y_bounds: (f64, f64),
    #[pyo3(get)]
    pub z_bounds: (f64, f64),
    /// Heights of the electrode rings above the tank floor.
    #[pyo3(get)]
    #[serde(default)]
    pub electrode_rings: Vec<f64>,
    #[pyo3(get)]
    #[serde(default)]
    pub num_electrodes: usize,
}

impl TankProperties {
    /// Creates a validated tank without electrode information.
    pub fn new(
        radius: f64,
        x_bounds: (f64, f64),
        y_bounds: (f64, f64),
        z_bounds: (f64, f64),
    ) -> Result<Self> {
        let tank = Self {
            diameter: 2.0 * radius,
            radius,
            x_bounds,
            y_bounds,
            z_bounds,
            electrode_rings: Vec::new(),
            num_electrodes: 0,
        };
        tank.validate()?;
        Ok(tank)
    }

    /// The 32x2 tank: two rings of 32 electrodes at 50 mm and 100 mm.
    pub fn tank_32x2() -> Self {
        Self {
            diameter: 194.0,
            radius: 97.0,
            x_bounds: (-97.0, 97.0),
            y_bounds: (-97.0, 97.0),
            z_bounds: (0.0, 148.0),
            electrode_rings: vec![50.0, 100.0],
            num_electrodes: 64,
        }
    }

    pub fn with_electrodes(mut self, rings: Vec<f64>, num_electrodes: usize) -> Self {
        self.electrode_rings = rings;
        self.num_electrodes = num_electrodes;
        self
    }

    /// Checks the bounds are ordered and that the box circumscribes the cylinder.
    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(GridError::Configuration(format!(
                "tank radius must be positive, got {}",
                self.radius
            )));
        }
        for (name, (min, max)) in [
            ("x", self.x_bounds),
            ("y", self.y_bounds),
            ("z", self.z_bounds),
        ] {
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(GridError::Configuration(format!(
                    "tank {} bounds must satisfy min < max, got ({}, {})",
                    name, min, max
                )));
            }
        }
        for (name, (min, max)) in [("x", self.x_bounds), ("y", self.y_bounds)] {
            if min > -self.radius || max < self.radius {
                return Err(GridError::Configuration(format!(
                    "tank {} bounds ({}, {}) do not enclose a cylinder of radius {}",
                    name, min, max, self.radius
                )));
            }
        }
        Ok(())
    }
}

#[pymethods]
impl TankProperties {
    #[new]
    fn py_new(
        radius: f64,
        x_bounds: (f64, f64),
        y_bounds: (f64, f64),
        z_bounds: (f64, f64),
    ) -> PyResult<Self> {
        Ok(Self::new(radius, x_bounds, y_bounds, z_bounds)?)
    }

    #[staticmethod]
    #[pyo3(name = "tank_32x2")]
    fn py_tank_32x2() -> Self {
        Self::tank_32x2()
    }
}

/// A spherical anomaly placed in the tank.
#[pyclass]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ObjectProperties {
    #[pyo3(get)]
    pub x: f64,
    #[pyo3(get)]
    pub y: f64,
    #[pyo3(get)]
    pub z: f64,
    #[pyo3(get)]
    pub r: f64,
    #[pyo3(get)]
    pub material: String,
}

impl ObjectProperties {
    pub fn new(x: f64, y: f64, z: f64, r: f64, material: &str) -> Result<Self> {
        let object = Self {
            x,
            y,
            z,
            r,
            material: material.to_string(),
        };
        object.validate()?;
        Ok(object)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.r.is_finite() && self.r >= 0.0) {
            return Err(GridError::InvalidArgument(format!(
                "object radius must be non-negative, got {}",
                self.r
            )));
        }
        Ok(())
    }

    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn diameter(&self) -> f64 {
        2.0 * self.r
    }
}

#[pymethods]
impl ObjectProperties {
    #[new]
    fn py_new(x: f64, y: f64, z: f64, r: f64, material: String) -> PyResult<Self> {
        Ok(Self::new(x, y, z, r, &material)?)
    }
}

/// Limits for the center of an object inside the tank.
///
/// Serializes as a flat map with the keys `r_min`, `r_max`, `x_min` .. `z_max`.
#[pyclass]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct HitBox {
    #[pyo3(get)]
    pub r_min: f64,
    /// Maximum radial distance from the tank axis.
    #[pyo3(get)]
    pub r_max: f64,
    #[pyo3(get)]
    pub x_min: f64,
    #[pyo3(get)]
    pub x_max: f64,
    #[pyo3(get)]
    pub y_min: f64,
    #[pyo3(get)]
    pub y_max: f64,
    #[pyo3(get)]
    pub z_min: f64,
    #[pyo3(get)]
    pub z_max: f64,
}

impl HitBox {
    /// Returns true if the point lies inside the axis bounds and within `r_max` of the tank axis.
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (self.x_min..=self.x_max).contains(&point.x)
            && (self.y_min..=self.y_max).contains(&point.y)
            && (self.z_min..=self.z_max).contains(&point.z)
            && radial_distance(point) <= self.r_max
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
            0.5 * (self.z_min + self.z_max),
        )
    }
}

#[pymethods]
impl HitBox {
    fn __repr__(&self) -> String {
        format!("{:?}", self)
    }
}

/// Distance of a point from the tank's central (z) axis.
pub fn radial_distance(point: &Point3<f64>) -> f64 {
    (point.x * point.x + point.y * point.y).sqrt()
}
