//! Safe placement region for an object inside the tank.

use crate::error::{GridError, Result};
use crate::geom::{HitBox, ObjectProperties, TankProperties};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TOLERANCE;

    fn ball(r: f64) -> ObjectProperties {
        ObjectProperties::new(0.0, 0.0, 0.0, r, "acryl").unwrap()
    }

    #[test]
    fn hitbox_32x2_ball_10() {
        let tank = TankProperties::tank_32x2();
        let hitbox = compute_hitbox(&tank, &ball(10.0), DEFAULT_TOLERANCE).unwrap();
        assert_eq!(hitbox.x_max, 82.0);
        assert_eq!(hitbox.x_min, -82.0);
        assert_eq!(hitbox.y_min, -82.0);
        assert_eq!(hitbox.y_max, 82.0);
        assert_eq!(hitbox.z_min, 15.0);
        assert_eq!(hitbox.z_max, 133.0);
        assert_eq!(hitbox.r_min, 0.0);
        assert_eq!(hitbox.r_max, 82.0);
    }

    #[test]
    fn r_max_follows_x_bound_not_radius() {
        // wider box than cylinder: r_max still comes from the x bound
        let tank = TankProperties::new(90.0, (-100.0, 100.0), (-95.0, 95.0), (0.0, 100.0)).unwrap();
        let hitbox = compute_hitbox(&tank, &ball(5.0), 5.0).unwrap();
        assert_eq!(hitbox.r_max, 90.0);
        assert_eq!(hitbox.y_max, 85.0);
    }

    #[test]
    fn zero_tolerance_point_object() {
        let tank = TankProperties::tank_32x2();
        let hitbox = compute_hitbox(&tank, &ball(0.0), 0.0).unwrap();
        assert_eq!(hitbox.x_min, -97.0);
        assert_eq!(hitbox.z_max, 148.0);
    }

    #[test]
    fn object_too_large_is_configuration_error() {
        let tank = TankProperties::tank_32x2();
        // z span is 148, so r + tol > 74 inverts the z bounds
        let result = compute_hitbox(&tank, &ball(70.0), 5.0);
        assert!(matches!(result, Err(GridError::Configuration(_))));
    }

    #[test]
    fn exactly_fitting_object_gives_flat_axis() {
        let tank = TankProperties::tank_32x2();
        let hitbox = compute_hitbox(&tank, &ball(69.0), 5.0).unwrap();
        assert_eq!(hitbox.z_min, hitbox.z_max);
        assert_eq!(hitbox.z_min, 74.0);
    }

    #[test]
    fn bounds_subtract_radius_then_tolerance() {
        let tank = TankProperties::tank_32x2();
        let (r, tol) = (14.84072838597616, 9.641080941496623);
        let hitbox = compute_hitbox(&tank, &ball(r), tol).unwrap();
        assert_eq!(hitbox.r_max, 97.0 - r - tol);
        assert_eq!(hitbox.x_max, 97.0 - r - tol);
        assert_eq!(hitbox.x_min, -97.0 + r + tol);
        assert_eq!(hitbox.y_min, -97.0 + r + tol);
        assert_eq!(hitbox.z_min, 0.0 + r + tol);
        assert_eq!(hitbox.z_max, 148.0 - r - tol);
    }

    #[test]
    fn negative_tolerance_is_invalid() {
        let tank = TankProperties::tank_32x2();
        let result = compute_hitbox(&tank, &ball(10.0), -1.0);
        assert!(matches!(result, Err(GridError::InvalidArgument(_))));
    }
}

/// Computes the hitbox of an object placed inside the tank.
///
/// Every axis bound of the tank is moved inward by `object.r` and then by
/// `tolerance`.
/// The radial limit reuses the inset x bound (`tank.x_max - object.r - tolerance`)
/// rather than the tank radius; downstream consumers rely on this coupling.
///
/// Returns [`GridError::Configuration`] if the object and tolerance do not fit
/// the tank, i.e. any axis would end up with `min > max`.
pub fn compute_hitbox(
    tank: &TankProperties,
    object: &ObjectProperties,
    tolerance: f64,
) -> Result<HitBox> {
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(GridError::InvalidArgument(format!(
            "safety tolerance must be non-negative, got {}",
            tolerance
        )));
    }
    object.validate()?;

    // evaluated left to right, bound then radius then tolerance
    let hitbox = HitBox {
        r_min: 0.0,
        r_max: tank.x_bounds.1 - object.r - tolerance,
        x_min: tank.x_bounds.0 + object.r + tolerance,
        x_max: tank.x_bounds.1 - object.r - tolerance,
        y_min: tank.y_bounds.0 + object.r + tolerance,
        y_max: tank.y_bounds.1 - object.r - tolerance,
        z_min: tank.z_bounds.0 + object.r + tolerance,
        z_max: tank.z_bounds.1 - object.r - tolerance,
    };

    for (name, min, max) in [
        ("x", hitbox.x_min, hitbox.x_max),
        ("y", hitbox.y_min, hitbox.y_max),
        ("z", hitbox.z_min, hitbox.z_max),
    ] {
        if min > max {
            return Err(GridError::Configuration(format!(
                "object radius {} plus tolerance {} does not fit the tank along {} ({} > {})",
                object.r, tolerance, name, min, max
            )));
        }
    }
    if hitbox.r_max < 0.0 {
        return Err(GridError::Configuration(format!(
            "radial limit is negative ({})",
            hitbox.r_max
        )));
    }

    Ok(hitbox)
}
