//! Measurement run orchestration.
//!
//! A [`MeasurementPlan`] ties the configured tank and object to the derived
//! hitbox and measurement coordinates, and turns them into the artifacts of
//! a run:
//!
//! - the G-code program that walks the gantry through every coordinate
//! - the metadata record and coordinate listing written next to the data
//! - labelled voxel volumes for training reconstruction models, dumped as
//!   raw bytes with a JSON header

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use log::info;
use ndarray::Array4;
use rand::{rngs::StdRng, SeedableRng};

use crate::coordinates::{create_meas_coordinates, CoordinateSet};
use crate::dataset::{label_volumes, LabelledVolumes};
use crate::error::Result;
use crate::gantry::Command;
use crate::geom::HitBox;
use crate::hitbox::compute_hitbox;
use crate::output::{self, InfoRecord};
use crate::settings::Settings;
use crate::voxel::gen_voxel_ball_data;

/// Hitbox and coordinates derived from one set of settings.
#[derive(Debug, Clone)]
pub struct MeasurementPlan {
    pub settings: Settings,
    pub hitbox: HitBox,
    pub coordinates: CoordinateSet,
}

impl MeasurementPlan {
    /// Computes the hitbox and the measurement coordinates for the settings.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.tank.validate()?;
        let hitbox = compute_hitbox(&settings.tank, &settings.object, settings.tolerance)?;
        info!("{:?}", hitbox);

        let grid = settings.grid;
        let coordinates = create_meas_coordinates(&hitbox, grid.x_pts, grid.y_pts, grid.z_pts)?;
        info!("So {} points will be measured.", coordinates.len());
        coordinates.log_props();

        Ok(Self {
            settings,
            hitbox,
            coordinates,
        })
    }

    /// Gantry program: prepare the axes, visit every coordinate, release the steppers.
    ///
    /// Each point is approached with an x/y move followed by a z move, in
    /// gantry coordinates.
    pub fn gcode_program(&self) -> Vec<Command> {
        let frame = &self.settings.gantry;
        let mut program = vec![
            Command::EnableSteppers,
            Command::Home,
            Command::MoveXY(frame.center_x, frame.center_y),
            Command::FanOff,
        ];
        for point in &self.coordinates {
            let target = frame.to_gantry(point);
            program.push(Command::MoveXY(target.x, target.y));
            program.push(Command::MoveZ(target.z));
        }
        program.push(Command::DisableSteppers);
        program
    }

    /// Label volumes for every measurement coordinate.
    pub fn label_volumes(&self) -> Result<LabelledVolumes> {
        let start = Instant::now();
        let labelled = label_volumes(
            &self.coordinates,
            &self.hitbox,
            &self.settings.voxel,
            self.settings.label_radius,
            self.settings.voxel_res,
        )?;
        info!("Time taken: {:.2?}", start.elapsed());
        Ok(labelled)
    }

    /// Random ball volumes with the margin of the voxel domain as radius.
    ///
    /// Reproducible when the settings carry a seed.
    pub fn synthetic_balls(&self, num: usize) -> Result<Array4<u8>> {
        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let d = self.settings.voxel.d.max(0) as usize;
        gen_voxel_ball_data(&mut rng, num, d, self.settings.voxel_res)
    }

    /// Writes metadata, coordinates, settings and optionally the G-code program
    /// into a new timestamped directory below `root`. Returns the directory.
    pub fn writeup(&self, root: &Path, with_gcode: bool) -> Result<PathBuf> {
        let now = Local::now();
        let object = &self.settings.object;
        let dir = output::measurement_dir(root, &object.material, object.diameter(), &now);
        output::create_dir(&dir)?;

        let record = InfoRecord {
            timestamp: output::timestamp(&now),
            tolerance: self.settings.tolerance,
            num_points: self.coordinates.len(),
            hitbox: &self.hitbox,
            tank: &self.settings.tank,
            object,
        };
        output::write_info_json(&dir.join("info.json"), &record)?;
        output::write_coordinates(&dir.join("coordinates.txt"), &self.coordinates)?;
        output::write_toml(&dir.join("settings.toml"), &self.settings)?;
        if with_gcode {
            output::write_gcode(
                &dir.join("program.gcode"),
                &self.gcode_program(),
                self.settings.motion_speed,
            )?;
        }

        info!("Wrote measurement plan to {:?}", dir);
        Ok(dir)
    }

    /// Labels every coordinate and stores the volumes as `labels.u8` and
    /// `labels.json` in `dir`.
    pub fn write_label_volumes(&self, dir: &Path) -> Result<LabelledVolumes> {
        let labelled = self.label_volumes()?;
        output::write_volumes(dir, "labels", &labelled.volumes, &labelled.indices)?;
        info!(
            "Wrote label volumes with shape {:?} to {:?}",
            labelled.volumes.shape(),
            dir
        );
        Ok(labelled)
    }

    /// Generates `num` random ball volumes and stores them as `synthetic.u8`
    /// and `synthetic.json` in `dir`.
    pub fn write_synthetic_balls(&self, dir: &Path, num: usize) -> Result<Array4<u8>> {
        let balls = self.synthetic_balls(num)?;
        output::write_volumes(dir, "synthetic", &balls, &[])?;
        info!("Wrote {} synthetic ball volumes to {:?}", num, dir);
        Ok(balls)
    }
}
