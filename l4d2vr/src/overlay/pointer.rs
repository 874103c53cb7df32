use cgmath::{Matrix4, SquareMatrix, Vector3};
use tracing::trace;

use crate::{
    host::MouseButton,
    input::InputEffect,
    overlay::{MenuOverlay, MenuSurface, OverlayHit, OverlayQuad},
    pose::{hmd_matrix_to_matrix4, ControllerRole, PoseStore},
    runtime::{OverlayEvent, VrRuntime},
};

pub const TIP_COMPONENT: &str = "tip";

/// A laser ray in tracking space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaserRay {
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerUpdate {
    pub hovering: bool,
    pub effects: Vec<InputEffect>,
}

///
/// Drives the host's 2D menu cursor from either controller's laser. While a
/// laser is on the menu overlay the overlay is interactive and the runtime's
/// pointer events are forwarded to the host; otherwise it is left passive so
/// menu actions reach the action system.
///
#[derive(Debug, Default)]
pub struct OverlayPointer {
    interactive: Option<bool>,
}

impl OverlayPointer {
    pub fn new() -> OverlayPointer {
        OverlayPointer::default()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive.unwrap_or(false)
    }

    pub fn update<R: VrRuntime + ?Sized>(
        &mut self,
        runtime: &mut R,
        poses: &PoseStore,
        overlay: &MenuOverlay,
        surface: &MenuSurface,
    ) -> PointerUpdate {
        // A hidden overlay keeps its last placement but can't be pointed at
        let visible = runtime.is_overlay_visible(overlay.handle());
        let hovering = visible
            && overlay.quad().map_or(false, |quad| {
                hover(&*runtime, poses, &quad, ControllerRole::LeftHand).is_some()
                    || hover(&*runtime, poses, &quad, ControllerRole::RightHand).is_some()
            });

        if self.interactive != Some(hovering) {
            trace!("menu overlay interactive: {hovering}");
            runtime.set_overlay_interactive(overlay.handle(), hovering);
            self.interactive = Some(hovering);
        }

        let mut effects = Vec::new();
        if hovering {
            while let Some(event) = runtime.poll_next_overlay_event(overlay.handle()) {
                effects.push(event_to_effect(event, surface));
            }
        }

        PointerUpdate { hovering, effects }
    }
}

///
/// Tip transform of the controller's render model, or identity when the
/// model or its tip component is unavailable
///
fn tip_transform<R: VrRuntime + ?Sized>(runtime: &R, role: ControllerRole) -> Matrix4<f32> {
    runtime
        .input_source_handle(role.input_source_path())
        .and_then(|source| {
            let model = runtime.render_model_name(role)?;
            runtime.component_local_transform(&model, TIP_COMPONENT, Some(source))
        })
        .map_or_else(Matrix4::identity, |tip| hmd_matrix_to_matrix4(&tip))
}

pub fn laser_ray<R: VrRuntime + ?Sized>(
    runtime: &R,
    poses: &PoseStore,
    role: ControllerRole,
) -> Option<LaserRay> {
    let index = runtime.controller_device_index(role)?;
    let pose = poses.raw_pose(Some(index));
    if !pose.is_valid {
        return None;
    }

    let composed = hmd_matrix_to_matrix4(&pose.device_to_absolute) * tip_transform(runtime, role);
    Some(LaserRay {
        origin: composed.w.truncate(),
        direction: -composed.z.truncate(),
    })
}

pub fn hover<R: VrRuntime + ?Sized>(
    runtime: &R,
    poses: &PoseStore,
    quad: &OverlayQuad,
    role: ControllerRole,
) -> Option<OverlayHit> {
    let ray = laser_ray(runtime, poses, role)?;
    quad.intersect(ray.origin, ray.direction)
}

/// Overlay mouse coordinates (origin bottom-left, render-target sized) to window coordinates
pub fn overlay_to_window(x: f32, y: f32, surface: &MenuSurface) -> (i32, i32) {
    let (window_w, window_h) = (surface.window.0 as f32, surface.window.1 as f32);
    let (render_w, render_h) = (surface.render.0 as f32, surface.render.1 as f32);

    if surface.in_game {
        let y = window_h - (y - (render_h - window_h));
        (x as i32, y as i32)
    } else {
        // The main menu fills the whole render target
        let x = x / render_w * window_w;
        let y = (render_h - y) / render_h * window_h;
        (x as i32, y as i32)
    }
}

fn event_to_effect(event: OverlayEvent, surface: &MenuSurface) -> InputEffect {
    match event {
        OverlayEvent::MouseMove { x, y } => {
            let (x, y) = overlay_to_window(x, y, surface);
            InputEffect::SetCursorPos { x, y }
        }
        OverlayEvent::MouseButtonDown => InputEffect::MouseButton {
            button: MouseButton::Left,
            down: true,
        },
        OverlayEvent::MouseButtonUp => InputEffect::MouseButton {
            button: MouseButton::Left,
            down: false,
        },
        OverlayEvent::ScrollDiscrete { ydelta } => InputEffect::MouseWheel(ydelta as i32),
    }
}
