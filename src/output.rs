use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use ndarray::Array4;
use serde::Serialize;

use crate::coordinates::CoordinateSet;
use crate::error::Result;
use crate::gantry::Command;
use crate::geom::{HitBox, ObjectProperties, TankProperties};
use crate::scaling::VoxelIndex;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nalgebra::Point3;

    fn hitbox() -> HitBox {
        HitBox {
            r_min: 0.0,
            r_max: 67.0,
            x_min: -67.0,
            x_max: 67.0,
            y_min: -67.0,
            y_max: 67.0,
            z_min: 30.0,
            z_max: 118.0,
        }
    }

    #[test]
    fn dir_name_carries_material_diameter_and_time() {
        let now = Local.with_ymd_and_hms(2023, 5, 10, 14, 7, 0).unwrap();
        let dir = measurement_dir(Path::new("measurements"), "acryl", 30.0, &now);
        assert_eq!(
            dir,
            PathBuf::from("measurements/acryl_d_30_2023_05_10_14h_07m")
        );
    }

    #[test]
    fn info_json_is_flat_in_hitbox_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("info.json");
        let tank = TankProperties::tank_32x2();
        let object = ObjectProperties::new(0.0, 0.0, 0.0, 15.0, "acryl").unwrap();
        let record = InfoRecord {
            timestamp: "2023_05_10_14h_07m".to_string(),
            tolerance: 5.0,
            num_points: 12,
            hitbox: &hitbox(),
            tank: &tank,
            object: &object,
        };
        write_info_json(&path, &record).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["r_max"], 67.0);
        assert_eq!(value["z_min"], 30.0);
        assert_eq!(value["num_points"], 12);
        assert_eq!(value["object"]["material"], "acryl");
        assert!(value.get("hitbox").is_none());

        let hitbox_back: HitBox = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(hitbox_back, hitbox());
    }

    #[test]
    fn coordinates_one_line_each() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("coordinates.txt");
        let coords = CoordinateSet::new(vec![
            Point3::new(-10.0, 0.0, 30.0),
            Point3::new(10.5, -2.0, 118.0),
        ]);
        write_coordinates(&path, &coords).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "-10 0 30\n10.5 -2 118\n");
    }

    #[test]
    fn volumes_dump_raw_bytes_with_header() {
        let tmp = tempfile::tempdir().unwrap();
        let mut volumes = Array4::<u8>::zeros((2, 2, 2, 2));
        volumes[[1, 0, 1, 1]] = 1;
        let indices = [VoxelIndex { y: 3, x: 4, z: 5 }];
        write_volumes(tmp.path(), "labels", &volumes, &indices).unwrap();

        let raw = fs::read(tmp.path().join("labels.u8")).unwrap();
        assert_eq!(raw.len(), 16);
        assert_eq!(raw[8 + 2 + 1], 1);
        assert_eq!(raw.iter().filter(|&&v| v == 1).count(), 1);

        let header: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(tmp.path().join("labels.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(header["shape"], serde_json::json!([2, 2, 2, 2]));
        assert_eq!(header["data_file"], "labels.u8");
        assert_eq!(header["indices"][0]["x"], 4);
    }

    #[test]
    fn gcode_program_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("program.gcode");
        write_gcode(&path, &[Command::FanOff, Command::MoveZ(20.0)], 1000.0).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "M106 S0\r\nG0 Z20 F1000\r\n");
    }
}

/// Timestamp format used in measurement directory names and metadata.
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%Hh_%Mm";

/// Metadata stored next to every measurement run.
///
/// The hitbox keys are written at the top level of the JSON object.
#[derive(Debug, Serialize)]
pub struct InfoRecord<'a> {
    pub timestamp: String,
    pub tolerance: f64,
    pub num_points: usize,
    #[serde(flatten)]
    pub hitbox: &'a HitBox,
    pub tank: &'a TankProperties,
    pub object: &'a ObjectProperties,
}

pub fn timestamp(now: &DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Header written next to a raw volume dump.
#[derive(Debug, Serialize)]
pub struct VolumeHeader<'a> {
    /// `(n, res, res, res)`, indexed `[sample, y, x, z]`.
    pub shape: &'a [usize],
    pub data_file: String,
    pub indices: &'a [VoxelIndex],
}

/// Directory for one run: `<root>/<material>_d_<diameter>_<timestamp>`.
pub fn measurement_dir(
    root: &Path,
    material: &str,
    diameter: f64,
    now: &DateTime<Local>,
) -> PathBuf {
    root.join(format!("{}_d_{}_{}", material, diameter, timestamp(now)))
}

/// Creates the directory and its parents.
pub fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

pub fn write_info_json(path: &Path, record: &InfoRecord) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writeln!(writer)?;
    Ok(())
}

/// Write the coordinates as whitespace separated `x y z` lines
pub fn write_coordinates(path: &Path, coordinates: &CoordinateSet) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for point in coordinates {
        writeln!(writer, "{} {} {}", point.x, point.y, point.z)?;
    }

    Ok(())
}

pub fn write_gcode(path: &Path, program: &[Command], feed: f64) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for command in program {
        write!(writer, "{}", command.to_gcode(feed))?;
    }

    Ok(())
}

pub fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, toml::to_string_pretty(value)?)?;
    Ok(())
}

/// Writes `<name>.u8` with the voxels in row-major order and `<name>.json`
/// with the shape and the anomaly indices (empty for synthetic volumes).
pub fn write_volumes(
    dir: &Path,
    name: &str,
    volumes: &Array4<u8>,
    indices: &[VoxelIndex],
) -> Result<()> {
    let data_file = format!("{}.u8", name);
    let mut writer = BufWriter::new(File::create(dir.join(&data_file))?);
    match volumes.as_slice() {
        Some(bytes) => writer.write_all(bytes)?,
        None => {
            for &value in volumes.iter() {
                writer.write_all(&[value])?;
            }
        }
    }
    writer.flush()?;

    let header = VolumeHeader {
        shape: volumes.shape(),
        data_file,
        indices,
    };
    let mut writer = BufWriter::new(File::create(dir.join(format!("{}.json", name)))?);
    serde_json::to_writer_pretty(&mut writer, &header)?;
    writeln!(writer)?;
    Ok(())
}
