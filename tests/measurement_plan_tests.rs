use std::fs;

use eitrig::{
    gantry::Command,
    geom::{ObjectProperties, TankProperties},
    hitbox::compute_hitbox,
    plan::MeasurementPlan,
    scaling::{scale_realworld_to_intdomain, IntDomain},
    settings::{self, CliArgs, GridResolution},
};

#[test]
fn default_config_loads() {
    let settings = settings::load_default_config().unwrap();
    assert_eq!(settings.tank, TankProperties::tank_32x2());
    assert_eq!(settings.tolerance, 5.0);
    assert_eq!(settings.object.material, "acryl");
    assert_eq!(settings.voxel, IntDomain::default());
    assert_eq!(settings.voxel_res, 32);
    assert_eq!(settings.seed, None);
}

#[test]
fn cli_overrides_apply() {
    let mut settings = settings::load_default_config().unwrap();
    let args = CliArgs {
        tolerance: Some(2.0),
        radius: Some(10.0),
        pts: Some(vec![4, 5, 6]),
        seed: Some(42),
        ..Default::default()
    };
    args.apply(&mut settings).unwrap();
    assert_eq!(settings.tolerance, 2.0);
    assert_eq!(settings.object.r, 10.0);
    assert_eq!(
        settings.grid,
        GridResolution {
            x_pts: 4,
            y_pts: 5,
            z_pts: 6
        }
    );
    assert_eq!(settings.seed, Some(42));
}

#[test]
fn plan_from_default_config() {
    let settings = settings::load_default_config().unwrap();
    let plan = MeasurementPlan::new(settings).unwrap();

    // r = 15, tolerance = 5 on the 32x2 tank
    assert_eq!(plan.hitbox.x_max, 77.0);
    assert_eq!(plan.hitbox.r_max, 77.0);
    assert_eq!(plan.hitbox.z_min, 20.0);
    assert_eq!(plan.hitbox.z_max, 128.0);

    assert!(!plan.coordinates.is_empty());
    for point in &plan.coordinates {
        assert!(plan.hitbox.contains(point));
    }
}

#[test]
fn plan_rejects_object_too_large() {
    let mut settings = settings::load_default_config().unwrap();
    settings.object.r = 80.0;
    assert!(MeasurementPlan::new(settings).is_err());
}

#[test]
fn gcode_program_visits_every_point() {
    let mut settings = settings::load_default_config().unwrap();
    settings.grid = GridResolution {
        x_pts: 3,
        y_pts: 3,
        z_pts: 2,
    };
    let plan = MeasurementPlan::new(settings).unwrap();
    let program = plan.gcode_program();

    assert_eq!(program.len(), 4 + 2 * plan.coordinates.len() + 1);
    assert_eq!(program[0], Command::EnableSteppers);
    assert_eq!(program[1], Command::Home);
    assert_eq!(program[2], Command::MoveXY(180.0, 180.0));
    assert_eq!(program.last(), Some(&Command::DisableSteppers));

    // first point of a 3x3x2 grid is (0, -77, 20) in the tank frame
    assert_eq!(program[4], Command::MoveXY(180.0, 103.0));
    assert_eq!(program[5], Command::MoveZ(20.0));
}

#[test]
fn writeup_creates_run_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = settings::load_default_config().unwrap();
    let plan = MeasurementPlan::new(settings).unwrap();

    let dir = plan.writeup(tmp.path(), true).unwrap();
    assert!(dir.starts_with(tmp.path()));
    assert!(dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("acryl_d_30_"));

    let info: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("info.json")).unwrap()).unwrap();
    assert_eq!(info["x_max"], 77.0);
    assert_eq!(info["num_points"], plan.coordinates.len());

    let listing = fs::read_to_string(dir.join("coordinates.txt")).unwrap();
    assert_eq!(listing.lines().count(), plan.coordinates.len());

    let gcode = fs::read_to_string(dir.join("program.gcode")).unwrap();
    assert!(gcode.starts_with("M17 X Y Z E\r\n"));
    assert!(dir.join("settings.toml").exists());
}

#[test]
fn labelled_volumes_match_scaler() {
    let mut settings = settings::load_default_config().unwrap();
    settings.grid = GridResolution {
        x_pts: 3,
        y_pts: 3,
        z_pts: 3,
    };
    let plan = MeasurementPlan::new(settings).unwrap();
    let labelled = plan.label_volumes().unwrap();

    assert_eq!(labelled.volumes.shape()[0], plan.coordinates.len());
    for (point, index) in plan.coordinates.iter().zip(labelled.indices.iter()) {
        let expected = scale_realworld_to_intdomain(
            [point.y, point.x, point.z],
            &plan.hitbox,
            &plan.settings.voxel,
        )
        .unwrap();
        assert_eq!(*index, expected);
    }
}

#[test]
fn volume_flags_write_into_run_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let mut settings = settings::load_default_config().unwrap();
    settings.grid = GridResolution {
        x_pts: 3,
        y_pts: 3,
        z_pts: 2,
    };
    settings.seed = Some(7);
    let plan = MeasurementPlan::new(settings).unwrap();
    let dir = plan.writeup(tmp.path(), false).unwrap();

    let labelled = plan.write_label_volumes(&dir).unwrap();
    let raw = fs::read(dir.join("labels.u8")).unwrap();
    assert_eq!(raw.len(), plan.coordinates.len() * 32 * 32 * 32);
    assert_eq!(raw.as_slice(), labelled.volumes.as_slice().unwrap());
    let header: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("labels.json")).unwrap()).unwrap();
    assert_eq!(header["shape"][0], plan.coordinates.len());
    assert_eq!(
        header["indices"].as_array().unwrap().len(),
        plan.coordinates.len()
    );

    plan.write_synthetic_balls(&dir, 2).unwrap();
    assert_eq!(
        fs::read(dir.join("synthetic.u8")).unwrap().len(),
        2 * 32 * 32 * 32
    );
    assert!(dir.join("synthetic.json").exists());
}

#[test]
fn seeded_synthetic_balls_are_reproducible() {
    let mut settings = settings::load_default_config().unwrap();
    settings.seed = Some(5);
    let plan = MeasurementPlan::new(settings).unwrap();
    let a = plan.synthetic_balls(3).unwrap();
    let b = plan.synthetic_balls(3).unwrap();
    assert_eq!(a.shape(), &[3, 32, 32, 32]);
    assert_eq!(a, b);
}

#[test]
fn ball_10_hitbox_and_center() {
    let tank = TankProperties::tank_32x2();
    let ball = ObjectProperties::new(0.0, 0.0, 0.0, 10.0, "acryl").unwrap();
    let hitbox = compute_hitbox(&tank, &ball, 5.0).unwrap();
    assert_eq!(hitbox.x_max, 82.0);
    assert_eq!(hitbox.r_max, 82.0);

    let z_mid = 0.5 * (hitbox.z_min + hitbox.z_max);
    let index =
        scale_realworld_to_intdomain([0.0, 0.0, z_mid], &hitbox, &IntDomain::default()).unwrap();
    assert_eq!((index.y, index.x), (16, 16));
}
