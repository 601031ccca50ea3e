//! Mapping between tank millimetres and voxel-grid indices.
//!
//! Real anomaly positions are mapped into a fixed-resolution voxel grid to
//! label synthetic training volumes. A margin of `d` voxels is kept free on
//! every border, so the indices actually produced lie in
//! `[new_min + d, new_max - d]`.
//!
//! # Axis order
//!
//! Coordinates are taken and returned in `(y, x, z)` order. The rig's
//! physical y/x axes are swapped relative to the voxel grid's conventional
//! axes and the label volumes already on disk were produced with this
//! ordering, so the swap is kept as is and never undone here.
//!
//! # Rounding
//!
//! Scaled values are rounded with [`f64::round`], i.e. ties round away from zero.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{VOXEL_MARGIN, VOXEL_RES};
use crate::error::{GridError, Result};
use crate::geom::HitBox;


/// Target integer domain of the scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct IntDomain {
    pub new_min: i64,
    pub new_max: i64,
    /// Margin kept free at both ends of the domain.
    pub d: i64,
}

impl Default for IntDomain {
    fn default() -> Self {
        Self {
            new_min: 0,
            new_max: VOXEL_RES as i64,
            d: VOXEL_MARGIN,
        }
    }
}

impl IntDomain {
    pub fn new(new_min: i64, new_max: i64, d: i64) -> Result<Self> {
        let domain = Self {
            new_min,
            new_max,
            d,
        };
        domain.validate()?;
        Ok(domain)
    }

    pub fn validate(&self) -> Result<()> {
        if self.new_min >= self.new_max {
            return Err(GridError::InvalidArgument(format!(
                "target domain must satisfy new_min < new_max, got [{}, {}]",
                self.new_min, self.new_max
            )));
        }
        if self.d < 0 || 2 * self.d >= self.new_max - self.new_min {
            return Err(GridError::InvalidArgument(format!(
                "margin {} leaves no room in [{}, {}]",
                self.d, self.new_min, self.new_max
            )));
        }
        Ok(())
    }

    /// Smallest index produced.
    pub fn lo(&self) -> i64 {
        self.new_min + self.d
    }

    /// Largest index produced.
    pub fn hi(&self) -> i64 {
        self.new_max - self.d
    }

    pub fn span(&self) -> i64 {
        self.hi() - self.lo()
    }

    fn midpoint(&self) -> i64 {
        (0.5 * (self.lo() + self.hi()) as f64).round() as i64
    }

    fn contains(&self, index: i64) -> bool {
        (self.lo()..=self.hi()).contains(&index)
    }
}

/// Voxel index of an anomaly center, in the rig's `(y, x, z)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelIndex {
    pub y: i64,
    pub x: i64,
    pub z: i64,
}

impl VoxelIndex {
    pub fn as_array(&self) -> [i64; 3] {
        [self.y, self.x, self.z]
    }

    /// Array index into a grid of edge length `res`, or `None` if out of range.
    pub fn to_grid(&self, res: usize) -> Option<[usize; 3]> {
        let mut out = [0usize; 3];
        for (slot, value) in out.iter_mut().zip(self.as_array()) {
            let value = usize::try_from(value).ok()?;
            if value >= res {
                return None;
            }
            *slot = value;
        }
        Some(out)
    }
}

/// Linearly maps `value` from `[src_min, src_max]` onto the domain, rounds and clamps.
fn rescale_axis(value: f64, src_min: f64, src_max: f64, domain: &IntDomain) -> i64 {
    let (lo, hi) = (domain.lo() as f64, domain.hi() as f64);
    let src_span = src_max - src_min;
    if src_span <= 0.0 {
        return domain.midpoint();
    }
    let scaled = (lo + (value - src_min) / src_span * (hi - lo)).round();
    if scaled < lo || scaled > hi {
        debug!("saturating scaled value {} into [{}, {}]", scaled, lo, hi);
    }
    scaled.clamp(lo, hi) as i64
}

fn unscale_axis(index: i64, dst_min: f64, dst_max: f64, domain: &IntDomain) -> f64 {
    let t = (index - domain.lo()) as f64 / domain.span() as f64;
    dst_min + t * (dst_max - dst_min)
}

/// Maps a real-world coordinate in millimetres to a voxel index.
///
/// `coordinate` is `(y, x, z)`. The lateral values are shifted by the
/// hitbox's positive bound and rescaled from `[0, 2 * axis_max]`; z is
/// rescaled from `[z_min, z_max]`. Every axis lands in
/// `[new_min + d, new_max - d]`; inputs outside the hitbox saturate.
pub fn scale_realworld_to_intdomain(
    coordinate: [f64; 3],
    hitbox: &HitBox,
    domain: &IntDomain,
) -> Result<VoxelIndex> {
    domain.validate()?;
    if coordinate.iter().any(|v| v.is_nan()) {
        return Err(GridError::InvalidArgument(format!(
            "coordinate contains NaN: {:?}",
            coordinate
        )));
    }
    let [y, x, z] = coordinate;

    Ok(VoxelIndex {
        y: rescale_axis(y + hitbox.y_max, 0.0, 2.0 * hitbox.y_max, domain),
        x: rescale_axis(x + hitbox.x_max, 0.0, 2.0 * hitbox.x_max, domain),
        z: rescale_axis(z, hitbox.z_min, hitbox.z_max, domain),
    })
}

/// Maps a voxel index back to the real-world `(y, x, z)` position of its center.
pub fn scale_intdomain_to_realworld(
    index: VoxelIndex,
    hitbox: &HitBox,
    domain: &IntDomain,
) -> Result<[f64; 3]> {
    domain.validate()?;
    if !index.as_array().iter().all(|&v| domain.contains(v)) {
        return Err(GridError::InvalidArgument(format!(
            "voxel index {:?} outside [{}, {}]",
            index.as_array(),
            domain.lo(),
            domain.hi()
        )));
    }

    Ok([
        unscale_axis(index.y, -hitbox.y_max, hitbox.y_max, domain),
        unscale_axis(index.x, -hitbox.x_max, hitbox.x_max, domain),
        unscale_axis(index.z, hitbox.z_min, hitbox.z_max, domain),
    ])
}
