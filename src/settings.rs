use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::config::{DEFAULT_TOLERANCE, VOXEL_MARGIN, VOXEL_RES};
use crate::gantry::GantryFrame;
use crate::geom::{ObjectProperties, TankProperties};
use crate::scaling::IntDomain;

/// Number of lattice points along each axis of the measurement grid.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct GridResolution {
    pub x_pts: usize,
    pub y_pts: usize,
    pub z_pts: usize,
}

/// Runtime configuration for a measurement run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    pub tank: TankProperties,
    pub object: ObjectProperties,
    /// Border tolerance between object and tank wall [mm].
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    pub grid: GridResolution,
    #[serde(default)]
    pub voxel: IntDomain,
    #[serde(default = "default_voxel_res")]
    pub voxel_res: usize,
    /// Radius of the ball stamped into label volumes [voxels].
    #[serde(default = "default_label_radius")]
    pub label_radius: f64,
    #[serde(default)]
    pub gantry: GantryFrame,
    /// Gantry feed rate [mm/min].
    pub motion_speed: f64,
    pub output_dir: String,
    pub seed: Option<u64>,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_voxel_res() -> usize {
    VOXEL_RES
}

fn default_label_radius() -> f64 {
    VOXEL_MARGIN as f64
}

/// Command line overrides. Values not given fall back to the configuration file.
#[derive(Parser, Debug, Default)]
#[command(version, about = "Measurement planning for the EIT tank rig")]
pub struct CliArgs {
    /// Border tolerance between object and tank wall in mm.
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Radius of the object placed in the tank in mm.
    #[arg(short, long)]
    pub radius: Option<f64>,

    /// Material tag of the object.
    #[arg(short, long)]
    pub material: Option<String>,

    /// Grid points along x, y and z, separated by spaces.
    #[arg(long, num_args = 3, value_delimiter = ' ')]
    pub pts: Option<Vec<usize>>,

    /// Root directory for measurement output.
    #[arg(short, long)]
    pub out: Option<String>,

    /// Gantry feed rate in mm/min.
    #[arg(long)]
    pub speed: Option<f64>,

    /// Write the G-code program for the measurement grid.
    #[arg(long)]
    pub gcode: bool,

    /// Generate labelled voxel volumes for every measurement point.
    #[arg(long)]
    pub voxels: bool,

    /// Generate this many random ball volumes.
    #[arg(long)]
    pub synthetic: Option<usize>,

    /// Random seed for synthetic data generation.
    #[arg(short, long)]
    pub seed: Option<u64>,
}

impl CliArgs {
    /// Applies the given overrides on top of `config`.
    pub fn apply(&self, config: &mut Settings) -> Result<()> {
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(radius) = self.radius {
            config.object.r = radius;
        }
        if let Some(material) = &self.material {
            config.object.material = material.clone();
        }
        if let Some(pts) = &self.pts {
            match pts.as_slice() {
                &[x_pts, y_pts, z_pts] => {
                    config.grid = GridResolution {
                        x_pts,
                        y_pts,
                        z_pts,
                    }
                }
                _ => return Err(anyhow!("--pts needs exactly three values, got {:?}", pts)),
            }
        }
        if let Some(out) = &self.out {
            config.output_dir = out.clone();
        }
        if let Some(speed) = self.speed {
            config.motion_speed = speed;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(())
    }
}

/// Loads `config/default.toml` without environment or command line overrides.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("loading configuration")?;

    let config: Settings = settings
        .try_deserialize()
        .context("deserializing configuration")?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the layered configuration: config file, then `EITRIG_*` environment
/// variables, then the given command line arguments.
pub fn load_config(args: &CliArgs) -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        info!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(
            Environment::with_prefix("eitrig")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("loading configuration")?;

    let mut config: Settings = settings
        .try_deserialize()
        .context("deserializing configuration")?;

    args.apply(&mut config)?;

    validate_config(&config)?;

    info!("{}", config);

    Ok(config)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the EITRIG_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("EITRIG_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    // Walk upward from the executable directory
    let exe_path = env::current_exe().context("failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("could not find project root directory"))
}

fn validate_config(config: &Settings) -> Result<()> {
    config.tank.validate()?;
    config.object.validate()?;
    config.voxel.validate()?;
    if !(config.motion_speed > 0.0) {
        return Err(anyhow!(
            "motion speed must be greater than 0, got {}",
            config.motion_speed
        ));
    }
    if config.voxel_res == 0 {
        return Err(anyhow!("voxel resolution must be greater than 0"));
    }
    Ok(())
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Tank radius: {:.1} mm, z: {:?}
  - Object: {} r={:.1} mm
  - Tolerance: {:.1} mm
  - Grid: {} x {} x {}
  - Voxel domain: [{}, {}] d={} on {}^3
  - Motion speed: {:.0} mm/min
  - Output: {}
  ",
            self.tank.radius,
            self.tank.z_bounds,
            self.object.material,
            self.object.r,
            self.tolerance,
            self.grid.x_pts,
            self.grid.y_pts,
            self.grid.z_pts,
            self.voxel.new_min,
            self.voxel.new_max,
            self.voxel.d,
            self.voxel_res,
            self.motion_speed,
            self.output_dir,
        )
    }
}
