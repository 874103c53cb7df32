use cgmath::{Vector3, Zero};
use tracing::{debug, info};

use crate::math::{pivot_xy, wrap_360, Angles};

///
/// Owns the recenter origin and the accumulated rotation offset applied to
/// every derived position and angle.
///
#[derive(Clone, Debug)]
pub struct RecenterController {
    origin: Vector3<f32>,
    rotation_offset: Angles,
}

impl Default for RecenterController {
    fn default() -> Self {
        RecenterController::new()
    }
}

impl RecenterController {
    pub fn new() -> RecenterController {
        RecenterController {
            origin: Vector3::zero(),
            rotation_offset: Angles::zero(),
        }
    }

    /// Makes the current HMD position the new origin. The rotation offset is untouched.
    pub fn reset(&mut self, hmd_position: Vector3<f32>) {
        info!("recentering at {:?}", hmd_position);
        self.origin = hmd_position;
    }

    pub fn apply_yaw_delta(&mut self, degrees: f32) {
        if degrees == 0.0 {
            return;
        }
        self.rotation_offset.yaw = wrap_360(self.rotation_offset.yaw + degrees);
        debug!("rotation offset yaw: {}", self.rotation_offset.yaw);
    }

    pub fn origin(&self) -> Vector3<f32> {
        self.origin
    }

    pub fn rotation_offset(&self) -> Angles {
        self.rotation_offset
    }

    ///
    /// HMD position relative to the recenter origin: subtract the origin,
    /// pivot by the yaw offset, then scale into world units.
    ///
    pub fn hmd_relative(&self, hmd_position: Vector3<f32>, world_scale: f32) -> Vector3<f32> {
        self.rotate_unscaled(hmd_position - self.origin) * world_scale
    }

    /// A controller position expressed relative to the HMD, in world units
    pub fn controller_relative(
        &self,
        controller_position: Vector3<f32>,
        hmd_position: Vector3<f32>,
        world_scale: f32,
    ) -> Vector3<f32> {
        self.rotate_unscaled(controller_position - hmd_position) * world_scale
    }

    pub fn apply_to_angles(&self, angles: Angles) -> Angles {
        angles + self.rotation_offset
    }

    fn rotate_unscaled(&self, v: Vector3<f32>) -> Vector3<f32> {
        pivot_xy(v, Vector3::zero(), self.rotation_offset.yaw)
    }
}
