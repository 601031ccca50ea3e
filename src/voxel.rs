//! Voxel rasterization of synthetic ball and brick anomalies.
//!
//! Grids are cubic with edge length `res` and hold `1` inside the object and
//! `0` elsewhere. Batches are stacked along a leading sample axis; the
//! trailing channel axis expected by 3D convolution networks is added with
//! [`expand_channel`].

use ndarray::{Array3, Array4, Array5, Axis};
use rand::Rng;

use crate::error::{GridError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn unit_ball_is_single_voxel() {
        let grid = voxel_ball([5, 5, 5], 1.0, 16);
        assert_eq!(grid.count(), 1);
        assert_eq!(grid.data()[[5, 5, 5]], 1);
    }

    #[test]
    fn ball_radius_two_is_strict() {
        // offsets with squared distance 0..=3 only
        let grid = voxel_ball([8, 8, 8], 2.0, 16);
        assert_eq!(grid.count(), 27);
        assert_eq!(grid.data()[[10, 8, 8]], 0);
    }

    #[test]
    fn ball_is_cut_at_grid_border() {
        let grid = voxel_ball([0, 0, 0], 2.0, 16);
        // one octant of the 27-voxel ball: 1 + 3 + 3 + 1
        assert_eq!(grid.count(), 8);
    }

    #[test]
    fn brick_is_half_open() {
        let grid = voxel_brick([10, 10, 10], [1, 2, 3], 32);
        assert_eq!(grid.count(), 2 * 4 * 6);
        assert_eq!(grid.data()[[9, 8, 7]], 1);
        assert_eq!(grid.data()[[11, 10, 10]], 0);
        assert_eq!(grid.data()[[10, 12, 10]], 0);
    }

    #[test]
    fn random_ball_stays_inside_grid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let grid = random_voxel_ball(&mut rng, 3, 32).unwrap();
            // every lattice point with squared distance < 9
            assert_eq!(grid.count(), 93);
        }
    }

    #[test]
    fn random_ball_margin_too_large() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = random_voxel_ball(&mut rng, 16, 32);
        assert!(matches!(result, Err(GridError::InvalidArgument(_))));
    }

    #[test]
    fn random_brick_stays_inside_grid() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let grid = random_voxel_brick(&mut rng, [5, 5, 5], 32).unwrap();
            assert_eq!(grid.count(), 1000);
        }
    }

    #[test]
    fn batches_have_sample_and_channel_axes() {
        let mut rng = StdRng::seed_from_u64(3);
        let balls = gen_voxel_ball_data(&mut rng, 4, 3, 32).unwrap();
        assert_eq!(balls.shape(), &[4, 32, 32, 32]);
        let bricks = gen_voxel_brick_data(&mut rng, 2, [2, 3, 4], 32).unwrap();
        assert_eq!(bricks.shape(), &[2, 32, 32, 32]);
        let expanded = expand_channel(balls);
        assert_eq!(expanded.shape(), &[4, 32, 32, 32, 1]);
        assert_eq!(expanded.iter().map(|&v| v as usize).sum::<usize>(), 4 * 93);
    }

    #[test]
    fn mask_matches_data() {
        let grid = voxel_ball([4, 4, 4], 2.0, 8);
        let mask = grid.mask();
        assert_eq!(mask.iter().filter(|&&b| b).count(), grid.count());
    }
}

/// Cubic occupancy grid.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    data: Array3<u8>,
}

impl VoxelGrid {
    pub fn empty(res: usize) -> Self {
        Self {
            data: Array3::zeros((res, res, res)),
        }
    }

    pub fn res(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn into_data(self) -> Array3<u8> {
        self.data
    }

    /// Boolean view of the occupancy.
    pub fn mask(&self) -> Array3<bool> {
        self.data.mapv(|v| v != 0)
    }

    /// Number of occupied voxels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Marks every voxel strictly closer than `radius` to `center`.
    pub fn stamp_ball(&mut self, center: [usize; 3], radius: f64) {
        let c = center.map(|v| v as f64);
        self.data.indexed_iter_mut().for_each(|((i, j, k), v)| {
            let (di, dj, dk) = (i as f64 - c[0], j as f64 - c[1], k as f64 - c[2]);
            if (di * di + dj * dj + dk * dk).sqrt() < radius {
                *v = 1;
            }
        });
    }

    /// Marks the voxels in `[center - half, center + half)` along each axis.
    pub fn stamp_brick(&mut self, center: [usize; 3], half_extent: [usize; 3]) {
        let inside = |idx: usize, ax: usize| {
            idx + half_extent[ax] >= center[ax] && idx < center[ax] + half_extent[ax]
        };
        self.data.indexed_iter_mut().for_each(|((i, j, k), v)| {
            if inside(i, 0) && inside(j, 1) && inside(k, 2) {
                *v = 1;
            }
        });
    }
}

pub fn voxel_ball(center: [usize; 3], radius: f64, res: usize) -> VoxelGrid {
    let mut grid = VoxelGrid::empty(res);
    grid.stamp_ball(center, radius);
    grid
}

pub fn voxel_brick(center: [usize; 3], half_extent: [usize; 3], res: usize) -> VoxelGrid {
    let mut grid = VoxelGrid::empty(res);
    grid.stamp_brick(center, half_extent);
    grid
}

fn random_center<R: Rng + ?Sized>(rng: &mut R, margin: usize, res: usize) -> Result<[usize; 3]> {
    if 2 * margin >= res {
        return Err(GridError::InvalidArgument(format!(
            "margin {} leaves no room in a grid of {} voxels",
            margin, res
        )));
    }
    Ok([
        rng.random_range(margin..res - margin),
        rng.random_range(margin..res - margin),
        rng.random_range(margin..res - margin),
    ])
}

/// Ball of radius `d` at a random center in `[d, res - d)`.
pub fn random_voxel_ball<R: Rng + ?Sized>(rng: &mut R, d: usize, res: usize) -> Result<VoxelGrid> {
    let center = random_center(rng, d, res)?;
    Ok(voxel_ball(center, d as f64, res))
}

/// Brick with the given half extents at a random center.
pub fn random_voxel_brick<R: Rng + ?Sized>(
    rng: &mut R,
    half_extent: [usize; 3],
    res: usize,
) -> Result<VoxelGrid> {
    let margin = half_extent.iter().copied().max().unwrap_or(0);
    let center = random_center(rng, margin, res)?;
    Ok(voxel_brick(center, half_extent, res))
}

/// Stacks grids along a new leading sample axis.
pub fn stack_grids(grids: &[VoxelGrid], res: usize) -> Array4<u8> {
    let mut data = Array4::<u8>::zeros((grids.len(), res, res, res));
    for (mut slot, grid) in data.outer_iter_mut().zip(grids.iter()) {
        slot.assign(grid.data());
    }
    data
}

pub fn gen_voxel_ball_data<R: Rng + ?Sized>(
    rng: &mut R,
    num: usize,
    d: usize,
    res: usize,
) -> Result<Array4<u8>> {
    let grids = (0..num)
        .map(|_| random_voxel_ball(&mut *rng, d, res))
        .collect::<Result<Vec<_>>>()?;
    Ok(stack_grids(&grids, res))
}

pub fn gen_voxel_brick_data<R: Rng + ?Sized>(
    rng: &mut R,
    num: usize,
    half_extent: [usize; 3],
    res: usize,
) -> Result<Array4<u8>> {
    let grids = (0..num)
        .map(|_| random_voxel_brick(&mut *rng, half_extent, res))
        .collect::<Result<Vec<_>>>()?;
    Ok(stack_grids(&grids, res))
}

/// Appends the single channel axis: `(n, res, res, res)` -> `(n, res, res, res, 1)`.
pub fn expand_channel(data: Array4<u8>) -> Array5<u8> {
    data.insert_axis(Axis(4))
}
