// Tracked device poses: conversion from runtime axes into host axes, and the
// per-frame store of derived HMD / controller poses.
//
// The runtime reports right-handed, Y-up, -Z-forward matrices in metres.
// The host expects X-forward, Y-left, Z-up.

use cgmath::{vec3, Matrix4, Vector3, Zero};
use tracing::trace;

use crate::math::Angles;

/// Row-major 3x4 rigid transform, as the runtime reports it
pub type HmdMatrix34 = [[f32; 4]; 3];

pub const IDENTITY_HMD_MATRIX: HmdMatrix34 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

pub const HMD_DEVICE_INDEX: usize = 0;
pub const MAX_TRACKED_DEVICE_COUNT: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDevicePose {
    pub is_valid: bool,
    pub device_to_absolute: HmdMatrix34,
    pub velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
}

impl RawDevicePose {
    pub fn invalid() -> RawDevicePose {
        RawDevicePose {
            is_valid: false,
            device_to_absolute: IDENTITY_HMD_MATRIX,
            velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
        }
    }

    pub fn from_matrix(device_to_absolute: HmdMatrix34) -> RawDevicePose {
        RawDevicePose {
            is_valid: true,
            device_to_absolute,
            velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
        }
    }

    /// Translation column, still in runtime axes
    pub fn runtime_position(&self) -> Vector3<f32> {
        let m = &self.device_to_absolute;
        vec3(m[0][3], m[1][3], m[2][3])
    }
}

impl Default for RawDevicePose {
    fn default() -> Self {
        RawDevicePose::invalid()
    }
}

/// A device pose expressed in host axes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedPose {
    pub position: Vector3<f32>,
    pub angles: Angles,
    pub velocity: Vector3<f32>,
    /// Degrees per second
    pub angular_velocity: Angles,
}

impl Default for TrackedPose {
    fn default() -> Self {
        TrackedPose {
            position: Vector3::zero(),
            angles: Angles::zero(),
            velocity: Vector3::zero(),
            angular_velocity: Angles::zero(),
        }
    }
}

fn remap_axes(v: [f32; 3]) -> Vector3<f32> {
    vec3(-v[2], -v[0], v[1])
}

///
/// Converts a runtime pose into host axes. Invalid poses leave the previous
/// value in place, so consumers see the last known good pose.
///
pub fn to_host_pose(raw: &RawDevicePose, previous: &TrackedPose) -> TrackedPose {
    if !raw.is_valid {
        return *previous;
    }

    let m = &raw.device_to_absolute;
    let angular_velocity = remap_axes(raw.angular_velocity);

    TrackedPose {
        position: vec3(-m[2][3], -m[0][3], m[1][3]),
        angles: Angles {
            pitch: m[1][2].clamp(-1.0, 1.0).asin().to_degrees(),
            yaw: m[0][2].atan2(m[2][2]).to_degrees(),
            roll: (-m[1][0]).atan2(m[1][1]).to_degrees(),
        },
        velocity: remap_axes(raw.velocity),
        angular_velocity: Angles::new(
            angular_velocity.x.to_degrees(),
            angular_velocity.y.to_degrees(),
            angular_velocity.z.to_degrees(),
        ),
    }
}

///
/// Lifts a 3x4 runtime matrix into a homogeneous 4x4 matrix. No axis
/// remapping is applied.
///
pub fn hmd_matrix_to_matrix4(m: &HmdMatrix34) -> Matrix4<f32> {
    // cgmath takes column-major arguments
    Matrix4::new(
        m[0][0], m[1][0], m[2][0], 0.0, //
        m[0][1], m[1][1], m[2][1], 0.0, //
        m[0][2], m[1][2], m[2][2], 0.0, //
        m[0][3], m[1][3], m[2][3], 1.0,
    )
}

pub fn matrix4_to_hmd_matrix(m: &Matrix4<f32>) -> HmdMatrix34 {
    [
        [m.x.x, m.y.x, m.z.x, m.w.x],
        [m.x.y, m.y.y, m.z.y, m.w.y],
        [m.x.z, m.y.z, m.z.z, m.w.z],
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerRole {
    LeftHand,
    RightHand,
}

impl ControllerRole {
    pub fn input_source_path(&self) -> &'static str {
        match self {
            ControllerRole::LeftHand => "/user/hand/left",
            ControllerRole::RightHand => "/user/hand/right",
        }
    }
}

///
/// Latest raw poses for every device, plus the derived HMD and hand poses.
/// Refreshed exactly once per frame.
///
#[derive(Clone, Debug, Default)]
pub struct PoseStore {
    raw: Vec<RawDevicePose>,
    pub hmd: TrackedPose,
    pub left_controller: TrackedPose,
    pub right_controller: TrackedPose,
}

impl PoseStore {
    pub fn new() -> PoseStore {
        PoseStore::default()
    }

    ///
    /// Replaces this frame's poses. When `left_handed` is set the controller
    /// indices are swapped, so the dominant hand is always reported as right.
    ///
    pub fn refresh(
        &mut self,
        raw: Vec<RawDevicePose>,
        left_index: Option<usize>,
        right_index: Option<usize>,
        left_handed: bool,
    ) {
        self.raw = raw;

        let (left_index, right_index) = if left_handed {
            (right_index, left_index)
        } else {
            (left_index, right_index)
        };

        let hmd = to_host_pose(&self.raw_pose(Some(HMD_DEVICE_INDEX)), &self.hmd);
        let left = to_host_pose(&self.raw_pose(left_index), &self.left_controller);
        let right = to_host_pose(&self.raw_pose(right_index), &self.right_controller);
        trace!("hmd pose: {:?}", hmd);

        self.hmd = hmd;
        self.left_controller = left;
        self.right_controller = right;
    }

    /// Raw pose for a device index; missing devices read as invalid
    pub fn raw_pose(&self, index: Option<usize>) -> RawDevicePose {
        index
            .and_then(|i| self.raw.get(i).copied())
            .unwrap_or_else(RawDevicePose::invalid)
    }

    pub fn raw_hmd(&self) -> RawDevicePose {
        self.raw_pose(Some(HMD_DEVICE_INDEX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{assert_close, assert_vec_close};

    fn translated(x: f32, y: f32, z: f32) -> HmdMatrix34 {
        [[1.0, 0.0, 0.0, x], [0.0, 1.0, 0.0, y], [0.0, 0.0, 1.0, z]]
    }

    #[test]
    fn test_position_axis_mapping_is_exact() {
        let raw = RawDevicePose::from_matrix(translated(0.25, 1.75, -3.5));
        let pose = to_host_pose(&raw, &TrackedPose::default());

        assert_eq!(pose.position.x, 3.5);
        assert_eq!(pose.position.y, -0.25);
        assert_eq!(pose.position.z, 1.75);
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let mut raw = RawDevicePose::from_matrix(translated(0.1, 0.2, 0.3));
        raw.velocity = [1.0, 2.0, 3.0];
        raw.angular_velocity = [0.5, -0.5, 0.25];
        let a = to_host_pose(&raw, &TrackedPose::default());
        let b = to_host_pose(&raw, &TrackedPose::default());
        assert_eq!(a, b);
        assert_vec_close(a.velocity, vec3(-3.0, -1.0, 2.0), 1e-6);
        assert_close(a.angular_velocity.pitch, -0.25f32.to_degrees(), 1e-4);
    }

    #[test]
    fn test_invalid_pose_keeps_previous() {
        let previous = TrackedPose {
            position: vec3(1.0, 2.0, 3.0),
            ..TrackedPose::default()
        };
        let pose = to_host_pose(&RawDevicePose::invalid(), &previous);
        assert_eq!(pose, previous);
    }

    #[test]
    fn test_yaw_extraction() {
        // Rotation of 90 degrees about the runtime's vertical axis
        let (s, c) = 90f32.to_radians().sin_cos();
        let raw = RawDevicePose::from_matrix([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
        ]);
        let pose = to_host_pose(&raw, &TrackedPose::default());
        assert_close(pose.angles.yaw, 90.0, 1e-4);
        assert_close(pose.angles.pitch, 0.0, 1e-4);
        assert_close(pose.angles.roll, 0.0, 1e-4);
    }

    #[test]
    fn test_matrix_conversion_round_trip() {
        let m: HmdMatrix34 = [
            [0.0, -1.0, 0.0, 1.5],
            [1.0, 0.0, 0.0, -2.0],
            [0.0, 0.0, 1.0, 0.75],
        ];
        let m4 = hmd_matrix_to_matrix4(&m);
        assert_eq!(m4.w.x, 1.5);
        assert_eq!(m4.x.y, 1.0);
        assert_eq!(matrix4_to_hmd_matrix(&m4), m);
    }

    #[test]
    fn test_left_handed_swaps_controllers() {
        let poses = vec![
            RawDevicePose::from_matrix(IDENTITY_HMD_MATRIX),
            RawDevicePose::from_matrix(translated(-1.0, 0.0, 0.0)),
            RawDevicePose::from_matrix(translated(1.0, 0.0, 0.0)),
        ];

        let mut store = PoseStore::new();
        store.refresh(poses.clone(), Some(1), Some(2), false);
        assert_close(store.right_controller.position.y, -1.0, 1e-6);

        store.refresh(poses, Some(1), Some(2), true);
        assert_close(store.right_controller.position.y, 1.0, 1e-6);
    }

    #[test]
    fn test_unassigned_controller_keeps_last_pose() {
        let mut store = PoseStore::new();
        store.refresh(
            vec![
                RawDevicePose::from_matrix(IDENTITY_HMD_MATRIX),
                RawDevicePose::from_matrix(translated(0.0, 0.0, -2.0)),
            ],
            None,
            Some(1),
            false,
        );
        assert_close(store.right_controller.position.x, 2.0, 1e-6);

        store.refresh(vec![RawDevicePose::from_matrix(IDENTITY_HMD_MATRIX)], None, None, false);
        assert_close(store.right_controller.position.x, 2.0, 1e-6);
    }
}
