//! Math type re-exports and transform utilities.
//!
//! Transforms are double precision `glam` matrices throughout. The attribute
//! store keeps them as 16 doubles in row-major order, so conversions live here
//! alongside the scale and interpolation helpers used by the animation core.

pub use glam::{DMat4, DQuat, DVec3, DVec4};

/// Driver value type (value of a dataref at a keyframe).
pub type DriverValue = f64;

/// Build a matrix from 16 row-major doubles.
///
/// Returns `None` if the slice does not hold exactly 16 values.
pub fn mat4_from_row_major(v: &[f64]) -> Option<DMat4> {
    if v.len() != 16 {
        return None;
    }
    // Row-major storage, glam is column-major: row i becomes column i's i-th component
    Some(DMat4::from_cols(
        DVec4::new(v[0], v[4], v[8], v[12]),
        DVec4::new(v[1], v[5], v[9], v[13]),
        DVec4::new(v[2], v[6], v[10], v[14]),
        DVec4::new(v[3], v[7], v[11], v[15]),
    ))
}

/// Flatten a matrix into 16 row-major doubles.
pub fn mat4_to_row_major(m: &DMat4) -> [f64; 16] {
    m.transpose().to_cols_array()
}

/// Per-axis scale of a transform: magnitudes of its three basis vectors.
#[inline]
pub fn basis_scale(m: &DMat4) -> DVec3 {
    DVec3::new(
        m.x_axis.truncate().length(),
        m.y_axis.truncate().length(),
        m.z_axis.truncate().length(),
    )
}

/// Interpolate two affine transforms at parameter `t`.
///
/// Rotation is slerped and translation (and any residual scale) lerped. `t` is
/// not clamped, so values outside `[0, 1]` extrapolate along the segment.
pub fn interpolate_rigid(a: &DMat4, b: &DMat4, t: f64) -> DMat4 {
    if t == 0.0 {
        return *a;
    }
    if t == 1.0 {
        return *b;
    }
    let (sa, ra, ta) = a.to_scale_rotation_translation();
    let (sb, rb, tb) = b.to_scale_rotation_translation();
    DMat4::from_scale_rotation_translation(sa.lerp(sb, t), ra.slerp(rb, t), ta.lerp(tb, t))
}

/// Check two matrices for element-wise equality within `eps`.
pub fn mat4_approx_eq(a: &DMat4, b: &DMat4, eps: f64) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| (x - y).abs() <= eps)
}

/// Format a number for display with at most `precision` decimals.
///
/// Trailing zeros are dropped and negative zero prints as `0`.
pub fn format_number(value: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
