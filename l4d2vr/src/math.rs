// Angle and vector helpers in host-application axes.
//
// The host uses a right-handed, Z-up frame: +X is forward, +Y is left, +Z is up.
// Angles are pitch/yaw/roll in degrees, where positive pitch looks down.

use std::ops::{Add, AddAssign};

use cgmath::{vec3, InnerSpace, Matrix3, Vector3, Zero};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Angles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Angles {
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Angles {
        Angles { pitch, yaw, roll }
    }

    pub fn zero() -> Angles {
        Angles::new(0.0, 0.0, 0.0)
    }

    ///
    /// Wraps each component into (-180, 180]
    ///
    pub fn normalized(self) -> Angles {
        Angles {
            pitch: normalize_angle(self.pitch),
            yaw: normalize_angle(self.yaw),
            roll: normalize_angle(self.roll),
        }
    }

    pub fn to_vec3(self) -> Vector3<f32> {
        vec3(self.pitch, self.yaw, self.roll)
    }

    pub fn from_vec3(v: Vector3<f32>) -> Angles {
        Angles::new(v.x, v.y, v.z)
    }
}

impl Add for Angles {
    type Output = Angles;

    fn add(self, rhs: Angles) -> Angles {
        Angles {
            pitch: self.pitch + rhs.pitch,
            yaw: self.yaw + rhs.yaw,
            roll: self.roll + rhs.roll,
        }
    }
}

impl AddAssign for Angles {
    fn add_assign(&mut self, rhs: Angles) {
        *self = *self + rhs;
    }
}

/// Orthonormal basis derived from a set of angles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Basis {
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl Default for Basis {
    fn default() -> Self {
        Basis {
            forward: vec3(1.0, 0.0, 0.0),
            right: vec3(0.0, -1.0, 0.0),
            up: vec3(0.0, 0.0, 1.0),
        }
    }
}

/// Wraps into (-180, 180]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle - 360.0 * (angle / 360.0).floor();
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Wraps into [0, 360)
pub fn wrap_360(angle: f32) -> f32 {
    let wrapped = angle - 360.0 * (angle / 360.0).floor();
    // floor() can leave exactly 360.0 behind for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub fn angle_vectors(angles: Angles) -> Basis {
    let (sy, cy) = angles.yaw.to_radians().sin_cos();
    let (sp, cp) = angles.pitch.to_radians().sin_cos();
    let (sr, cr) = angles.roll.to_radians().sin_cos();

    Basis {
        forward: vec3(cp * cy, cp * sy, -sp),
        right: vec3(
            -sr * sp * cy + cr * sy,
            -sr * sp * sy - cr * cy,
            -sr * cp,
        ),
        up: vec3(cr * sp * cy + sr * sy, cr * sp * sy - sr * cy, cr * cp),
    }
}

///
/// Inverse of angle_vectors: recovers pitch/yaw/roll from a forward vector and
/// an approximate up vector.
///
pub fn vector_angles(forward: Vector3<f32>, pseudo_up: Vector3<f32>) -> Angles {
    let left = pseudo_up.cross(forward);
    let left = if left.magnitude2() > 0.0 {
        left.normalize()
    } else {
        Vector3::zero()
    };

    let xy_dist = (forward.x * forward.x + forward.y * forward.y).sqrt();

    if xy_dist > 0.001 {
        let up_z = left.y * forward.x - left.x * forward.y;
        Angles {
            pitch: (-forward.z).atan2(xy_dist).to_degrees(),
            yaw: forward.y.atan2(forward.x).to_degrees(),
            roll: left.z.atan2(up_z).to_degrees(),
        }
    } else {
        // Gimbal lock: forward is mostly vertical, so yaw comes from the left vector
        Angles {
            pitch: (-forward.z).atan2(xy_dist).to_degrees(),
            yaw: (-left.x).atan2(left.y).to_degrees(),
            roll: 0.0,
        }
    }
}

/// Rotates `v` about `axis` by `degrees` (right-hand rule)
pub fn vector_rotate(v: Vector3<f32>, axis: Vector3<f32>, degrees: f32) -> Vector3<f32> {
    if axis.magnitude2() == 0.0 {
        return v;
    }
    let k = axis.normalize();
    let (s, c) = degrees.to_radians().sin_cos();
    v * c + k.cross(v) * s + k * k.dot(v) * (1.0 - c)
}

///
/// Rotates `point` about the vertical axis passing through `pivot`
///
pub fn pivot_xy(point: Vector3<f32>, pivot: Vector3<f32>, yaw_degrees: f32) -> Vector3<f32> {
    let (s, c) = yaw_degrees.to_radians().sin_cos();
    let x = point.x - pivot.x;
    let y = point.y - pivot.y;
    vec3(x * c - y * s + pivot.x, x * s + y * c + pivot.y, point.z)
}

/// Rotation matrix for a set of angles; columns are forward, left, up
pub fn angle_matrix(angles: Angles) -> Matrix3<f32> {
    let (sy, cy) = angles.yaw.to_radians().sin_cos();
    let (sp, cp) = angles.pitch.to_radians().sin_cos();
    let (sr, cr) = angles.roll.to_radians().sin_cos();

    Matrix3::from_cols(
        vec3(cp * cy, cp * sy, -sp),
        vec3(sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, sr * cp),
        vec3(cr * sp * cy + sr * sy, cr * sp * sy - sr * cy, cr * cp),
    )
}

pub fn matrix_angles(matrix: &Matrix3<f32>) -> Angles {
    let forward = matrix.x;
    let left = matrix.y;
    let up_z = matrix.z.z;

    let xy_dist = (forward.x * forward.x + forward.y * forward.y).sqrt();

    if xy_dist > 0.001 {
        Angles {
            pitch: (-forward.z).atan2(xy_dist).to_degrees(),
            yaw: forward.y.atan2(forward.x).to_degrees(),
            roll: left.z.atan2(up_z).to_degrees(),
        }
    } else {
        Angles {
            pitch: (-forward.z).atan2(xy_dist).to_degrees(),
            yaw: (-left.x).atan2(left.y).to_degrees(),
            roll: 0.0,
        }
    }
}

#[cfg(test)]
pub(crate) fn assert_close(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "expected {b}, got {a} (tolerance {eps})");
}

#[cfg(test)]
pub(crate) fn assert_vec_close(a: Vector3<f32>, b: Vector3<f32>, eps: f32) {
    assert!(
        (a - b).magnitude() <= eps,
        "expected {b:?}, got {a:?} (tolerance {eps})"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_360_stays_in_range() {
        for angle in [-720.0, -361.0, -360.0, -0.0001, 0.0, 45.0, 359.999, 360.0, 725.0] {
            let wrapped = wrap_360(angle);
            assert!((0.0..360.0).contains(&wrapped), "{angle} wrapped to {wrapped}");
        }
        assert_close(wrap_360(-90.0), 270.0, 1e-4);
        assert_close(wrap_360(450.0), 90.0, 1e-4);
    }

    #[test]
    fn test_normalize_angle() {
        assert_close(normalize_angle(270.0), -90.0, 1e-4);
        assert_close(normalize_angle(180.0), 180.0, 1e-4);
        assert_close(normalize_angle(-180.0), 180.0, 1e-4);
        assert_close(normalize_angle(90.0), 90.0, 1e-4);
    }

    #[test]
    fn test_pivot_round_trip() {
        let origin = vec3(3.0, -2.0, 1.0);
        let point = vec3(10.0, 4.0, -7.0);
        let mut yaw = 0.0;
        while yaw < 360.0 {
            let there = pivot_xy(point, origin, yaw);
            let back = pivot_xy(there, origin, -yaw);
            assert_vec_close(back, point, 1e-3);
            yaw += 7.5;
        }
    }

    #[test]
    fn test_pivot_quarter_turn() {
        let rotated = pivot_xy(vec3(1.0, 0.0, 5.0), Vector3::zero(), 90.0);
        assert_vec_close(rotated, vec3(0.0, 1.0, 5.0), 1e-5);
    }

    #[test]
    fn test_angle_vectors_identity() {
        let basis = angle_vectors(Angles::zero());
        assert_vec_close(basis.forward, vec3(1.0, 0.0, 0.0), 1e-6);
        assert_vec_close(basis.right, vec3(0.0, -1.0, 0.0), 1e-6);
        assert_vec_close(basis.up, vec3(0.0, 0.0, 1.0), 1e-6);
    }

    #[test]
    fn test_vector_angles_inverts_angle_vectors() {
        let angles = Angles::new(-20.0, 135.0, 10.0);
        let basis = angle_vectors(angles);
        let recovered = vector_angles(basis.forward, basis.up);
        assert_close(recovered.pitch, angles.pitch, 1e-3);
        assert_close(recovered.yaw, angles.yaw, 1e-3);
        assert_close(recovered.roll, angles.roll, 1e-3);
    }

    #[test]
    fn test_matrix_angles_inverts_angle_matrix() {
        let angles = Angles::new(30.0, -60.0, 15.0);
        let recovered = matrix_angles(&angle_matrix(angles));
        assert_close(recovered.pitch, angles.pitch, 1e-3);
        assert_close(recovered.yaw, angles.yaw, 1e-3);
        assert_close(recovered.roll, angles.roll, 1e-3);
    }

    #[test]
    fn test_vector_rotate_about_up() {
        let rotated = vector_rotate(vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0), 90.0);
        assert_vec_close(rotated, vec3(0.0, 1.0, 0.0), 1e-6);
    }
}
