use std::path::Path;

use anyhow::Result;
use clap::Parser;
use eitrig::plan::MeasurementPlan;
use eitrig::settings::{self, CliArgs};
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let settings = settings::load_config(&args)?;
    let plan = MeasurementPlan::new(settings)?;

    let dir = plan.writeup(Path::new(&plan.settings.output_dir), args.gcode)?;

    if args.voxels {
        plan.write_label_volumes(&dir)?;
    }

    if let Some(num) = args.synthetic {
        plan.write_synthetic_balls(&dir, num)?;
    }

    info!("Done: {:?}", dir);

    Ok(())
}
