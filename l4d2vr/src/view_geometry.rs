// Per-frame camera and hand geometry derived from the tracked poses.

use cgmath::{vec3, Vector3, Zero};

use crate::{
    math::{angle_vectors, vector_angles, vector_rotate, Angles, Basis},
    pose::{HmdMatrix34, PoseStore, TrackedPose},
    recenter::RecenterController,
    runtime::{Eye, ProjectionRaw, TextureBounds},
    vr_config::EngineConfig,
};

/// Controllers are held tilted; forward and up are pitched down by this much
pub const CONTROLLER_GRIP_PITCH: f32 = -30.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EyeParameters {
    /// Interpupillary distance, metres
    pub ipd: f32,
    /// Eye depth relative to the head origin, metres
    pub eye_z: f32,
}

impl EyeParameters {
    /// Assumes the eyes sit symmetrically about the head
    pub fn from_eye_to_head(_left: &HmdMatrix34, right: &HmdMatrix34) -> EyeParameters {
        EyeParameters {
            ipd: right[0][3] * 2.0,
            eye_z: right[2][3],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewmodelOffset {
    pub position: Vector3<f32>,
    pub angles: Angles,
}

impl ViewmodelOffset {
    pub fn base() -> ViewmodelOffset {
        ViewmodelOffset {
            position: vec3(4.5, -1.0, 1.5),
            angles: Angles::zero(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> ViewmodelOffset {
        let base = ViewmodelOffset::base();
        ViewmodelOffset {
            position: base.position + config.viewmodel_pos_custom_offset,
            angles: base.angles + config.viewmodel_ang_custom_offset,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandGeometry {
    /// Position relative to the HMD, rotated by the yaw offset and in world units
    pub position_relative: Vector3<f32>,
    /// Basis after the grip pitch is applied
    pub basis: Basis,
    pub angles: Angles,
}

impl Default for HandGeometry {
    fn default() -> Self {
        HandGeometry {
            position_relative: Vector3::zero(),
            basis: Basis::default(),
            angles: Angles::zero(),
        }
    }
}

impl HandGeometry {
    fn compute(
        pose: &TrackedPose,
        hmd_position: Vector3<f32>,
        recenter: &RecenterController,
        vr_scale: f32,
    ) -> HandGeometry {
        let position_relative = recenter.controller_relative(pose.position, hmd_position, vr_scale);
        let tracked = angle_vectors(recenter.apply_to_angles(pose.angles));

        let forward = vector_rotate(tracked.forward, tracked.right, CONTROLLER_GRIP_PITCH);
        let up = vector_rotate(tracked.up, tracked.right, CONTROLLER_GRIP_PITCH);

        HandGeometry {
            position_relative,
            basis: Basis {
                forward,
                right: tracked.right,
                up,
            },
            angles: vector_angles(forward, up).normalized(),
        }
    }
}

///
/// Everything the host needs to place cameras, hands and the weapon model
/// for one frame. Built once per frame from a single pose refresh and config
/// snapshot.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ViewGeometry {
    pub hmd_pos_relative: Vector3<f32>,
    /// HMD angles with the rotation offset applied, not yet normalized
    pub hmd_angles: Angles,
    pub hmd_basis: Basis,
    pub left_hand: HandGeometry,
    pub right_hand: HandGeometry,
    pub eye: EyeParameters,
    vr_scale: f32,
    ipd_scale: f32,
    six_dof: bool,
    viewmodel_offset: ViewmodelOffset,
}

impl Default for ViewGeometry {
    fn default() -> Self {
        ViewGeometry::compute(
            &PoseStore::new(),
            &RecenterController::new(),
            EyeParameters::default(),
            &EngineConfig::default(),
        )
    }
}

impl ViewGeometry {
    pub fn compute(
        poses: &PoseStore,
        recenter: &RecenterController,
        eye: EyeParameters,
        config: &EngineConfig,
    ) -> ViewGeometry {
        let vr_scale = config.vr_scale;
        let hmd_angles = recenter.apply_to_angles(poses.hmd.angles);
        let hmd_position = poses.hmd.position;

        ViewGeometry {
            hmd_pos_relative: recenter.hmd_relative(hmd_position, vr_scale),
            hmd_angles,
            hmd_basis: angle_vectors(hmd_angles),
            left_hand: HandGeometry::compute(&poses.left_controller, hmd_position, recenter, vr_scale),
            right_hand: HandGeometry::compute(
                &poses.right_controller,
                hmd_position,
                recenter,
                vr_scale,
            ),
            eye,
            vr_scale,
            ipd_scale: config.ipd_scale,
            six_dof: config.six_dof,
            viewmodel_offset: ViewmodelOffset::from_config(config),
        }
    }

    pub fn view_angle(&self) -> Angles {
        self.hmd_angles.normalized()
    }

    fn head_offset(&self) -> Vector3<f32> {
        if self.six_dof {
            self.hmd_pos_relative
        } else {
            Vector3::zero()
        }
    }

    /// Centre eye position for a host camera origin
    pub fn view_origin(&self, setup_origin: Vector3<f32>) -> Vector3<f32> {
        setup_origin + self.head_offset() + self.hmd_basis.forward * -(self.eye.eye_z * self.vr_scale)
    }

    pub fn eye_origin(&self, eye: Eye, setup_origin: Vector3<f32>) -> Vector3<f32> {
        let half_ipd = self.hmd_basis.right * (self.eye.ipd * self.ipd_scale * self.vr_scale / 2.0);
        match eye {
            Eye::Left => self.view_origin(setup_origin) - half_ipd,
            Eye::Right => self.view_origin(setup_origin) + half_ipd,
        }
    }

    pub fn right_controller_abs_pos(&self, base: Vector3<f32>) -> Vector3<f32> {
        base + self.right_hand.position_relative + self.head_offset()
    }

    pub fn left_controller_abs_pos(&self, base: Vector3<f32>) -> Vector3<f32> {
        base + self.left_hand.position_relative + self.head_offset()
    }

    pub fn right_controller_abs_angle(&self) -> Angles {
        self.right_hand.angles
    }

    pub fn left_controller_abs_angle(&self) -> Angles {
        self.left_hand.angles
    }

    /// Right hand basis with the viewmodel angle offset applied: yaw, then pitch, then roll
    pub fn viewmodel_basis(&self) -> Basis {
        let offset = self.viewmodel_offset.angles;
        let Basis {
            mut forward,
            mut right,
            mut up,
        } = self.right_hand.basis;

        forward = vector_rotate(forward, up, offset.yaw);
        right = vector_rotate(right, up, offset.yaw);

        forward = vector_rotate(forward, right, offset.pitch);
        up = vector_rotate(up, right, offset.pitch);

        right = vector_rotate(right, forward, offset.roll);
        up = vector_rotate(up, forward, offset.roll);

        Basis { forward, right, up }
    }

    pub fn viewmodel_abs_pos(&self, base: Vector3<f32>) -> Vector3<f32> {
        let basis = self.viewmodel_basis();
        let offset = self.viewmodel_offset.position;
        self.right_controller_abs_pos(base)
            - basis.forward * offset.x
            - basis.right * offset.y
            - basis.up * offset.z
    }

    pub fn viewmodel_abs_angle(&self) -> Angles {
        let basis = self.viewmodel_basis();
        vector_angles(basis.forward, basis.up)
    }
}

/// Render target layout derived from the headset's projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    pub render_width: u32,
    pub render_height: u32,
    pub left_bounds: TextureBounds,
    pub right_bounds: TextureBounds,
    pub aspect: f32,
    /// Horizontal field of view, degrees
    pub fov: f32,
}

impl RenderParams {
    pub fn from_projection(
        render_size: (u32, u32),
        left: ProjectionRaw,
        right: ProjectionRaw,
    ) -> RenderParams {
        let tan_half_fov_x = [-left.left, left.right, -right.left, right.right]
            .into_iter()
            .fold(f32::MIN, f32::max);
        let tan_half_fov_y = [-left.top, left.bottom, -right.top, right.bottom]
            .into_iter()
            .fold(f32::MIN, f32::max);

        let bounds = |p: ProjectionRaw| TextureBounds {
            u_min: 0.5 + 0.5 * p.left / tan_half_fov_x,
            u_max: 0.5 + 0.5 * p.right / tan_half_fov_x,
            v_min: 0.5 - 0.5 * p.bottom / tan_half_fov_y,
            v_max: 0.5 - 0.5 * p.top / tan_half_fov_y,
        };

        RenderParams {
            render_width: render_size.0,
            render_height: render_size.1,
            left_bounds: bounds(left),
            right_bounds: bounds(right),
            aspect: tan_half_fov_x / tan_half_fov_y,
            fov: (2.0 * tan_half_fov_x.atan()).to_degrees(),
        }
    }

    pub fn bounds(&self, eye: Eye) -> TextureBounds {
        match eye {
            Eye::Left => self.left_bounds,
            Eye::Right => self.right_bounds,
        }
    }
}
