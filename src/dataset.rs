//! Labelled training volumes from measured anomaly positions.
//!
//! Each measurement coordinate is mapped to a voxel index with the scaler and
//! a ball is stamped at that index. The volumes are generated in parallel
//! with rayon, with an indicatif progress bar for long coordinate sets.

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use ndarray::Array4;
use rayon::prelude::*;

use crate::coordinates::CoordinateSet;
use crate::error::{GridError, Result};
use crate::geom::HitBox;
use crate::scaling::{scale_realworld_to_intdomain, IntDomain, VoxelIndex};
use crate::voxel::{stack_grids, voxel_ball};


/// Label volumes together with the voxel index of each anomaly center.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledVolumes {
    pub indices: Vec<VoxelIndex>,
    /// Shape `(n, res, res, res)`, indexed `[sample, y, x, z]`.
    pub volumes: Array4<u8>,
}

/// Stamps a ball of `radius` voxels at the scaled position of every coordinate.
pub fn label_volumes(
    coordinates: &CoordinateSet,
    hitbox: &HitBox,
    domain: &IntDomain,
    radius: f64,
    res: usize,
) -> Result<LabelledVolumes> {
    domain.validate()?;
    if domain.lo() < 0 || domain.hi() >= res as i64 {
        return Err(GridError::InvalidArgument(format!(
            "target domain [{}, {}] does not fit a grid of {} voxels",
            domain.lo(),
            domain.hi(),
            res
        )));
    }

    let pb = ProgressBar::new(coordinates.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
    ) {
        pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁"));
    }
    pb.set_message("volume".to_string());

    let labelled = coordinates
        .points()
        .par_iter()
        .map(|point| {
            // the scaler takes the rig's (y, x, z) order
            let index = scale_realworld_to_intdomain([point.y, point.x, point.z], hitbox, domain)?;
            let center = index.to_grid(res).ok_or_else(|| {
                GridError::InvalidArgument(format!(
                    "voxel index {:?} outside a grid of {} voxels",
                    index.as_array(),
                    res
                ))
            })?;
            pb.inc(1);
            Ok((index, voxel_ball(center, radius, res)))
        })
        .collect::<Result<Vec<_>>>()?;
    pb.finish_and_clear();

    let (indices, grids): (Vec<_>, Vec<_>) = labelled.into_iter().unzip();
    info!("Labelled {} volumes of {}^3 voxels", grids.len(), res);

    Ok(LabelledVolumes {
        indices,
        volumes: stack_grids(&grids, res),
    })
}
