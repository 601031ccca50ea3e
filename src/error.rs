//! Error types for measurement planning and gantry control.

use std::io;
use thiserror::Error;

/// Result type for the planning library.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors raised by hitbox computation, grid generation, scaling and the gantry driver.
///
/// Boundary saturation during scaling and an empty coordinate set are not errors.
#[derive(Error, Debug)]
pub enum GridError {
    /// The requested geometry is physically invalid, e.g. the object plus
    /// tolerance does not fit inside the tank.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An argument is outside its accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The gantry answered with something unexpected.
    #[error("gantry protocol error: {0}")]
    Protocol(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl From<GridError> for pyo3::PyErr {
    fn from(err: GridError) -> Self {
        match err {
            GridError::Configuration(_) | GridError::InvalidArgument(_) => {
                pyo3::exceptions::PyValueError::new_err(err.to_string())
            }
            GridError::Io(_) => pyo3::exceptions::PyIOError::new_err(err.to_string()),
            GridError::Protocol(_) | GridError::Json(_) | GridError::Toml(_) => {
                pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}
