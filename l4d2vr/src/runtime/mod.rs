// The VR runtime, as seen by the engine. Everything here is implemented by a
// thin binding over the vendor SDK (or by the simulated runtime in the
// desktop harness); the engine only talks to these traits.

use std::path::Path;

use bitflags::bitflags;

use crate::{
    error::SessionError,
    pose::{ControllerRole, HmdMatrix34, RawDevicePose},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionSetHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputSourceHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitalActionData {
    pub state: bool,
    /// True when `state` differs from the previous action update
    pub changed: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnalogActionData {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingUniverse {
    Seated,
    Standing,
    RawAndUncalibrated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

/// Tangents of the half-angles of an eye's view frustum
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjectionRaw {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureBounds {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl TextureBounds {
    pub const FULL: TextureBounds = TextureBounds {
        u_min: 0.0,
        v_min: 0.0,
        u_max: 1.0,
        v_max: 1.0,
    };
}

impl Default for TextureBounds {
    fn default() -> Self {
        TextureBounds::FULL
    }
}

/// Pointer input the runtime routes to an interactive overlay
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayEvent {
    /// Position in overlay mouse coordinates (origin bottom-left, scaled by the mouse scale)
    MouseMove { x: f32, y: f32 },
    MouseButtonDown,
    MouseButtonUp,
    ScrollDiscrete { ydelta: f32 },
}

bitflags! {
    pub struct OverlayFlags: u32 {
        const SEND_VR_DISCRETE_SCROLL_EVENTS = 1 << 0;
        const MAKE_OVERLAYS_INTERACTIVE_IF_VISIBLE = 1 << 1;
        const INPUT_METHOD_MOUSE = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlaySettings {
    pub flags: OverlayFlags,
    pub mouse_scale: (f32, f32),
    pub curvature: f32,
}

pub trait PoseSource {
    /// Blocks until the compositor is ready, then returns one pose per device index
    fn wait_get_poses(&mut self) -> Vec<RawDevicePose>;
    fn tracking_space(&self) -> TrackingUniverse;
    fn controller_device_index(&self, role: ControllerRole) -> Option<usize>;
    fn eye_to_head_transform(&self, eye: Eye) -> HmdMatrix34;
    fn projection_raw(&self, eye: Eye) -> ProjectionRaw;
    fn recommended_render_target_size(&self) -> (u32, u32);
}

pub trait ActionSource {
    fn set_action_manifest(&mut self, path: &Path) -> Result<(), SessionError>;
    fn action_handle(&mut self, path: &str) -> Result<ActionHandle, SessionError>;
    fn action_set_handle(&mut self, path: &str) -> Result<ActionSetHandle, SessionError>;
    /// Takes the per-frame action snapshot that the reads below return
    fn update_action_state(&mut self, set: ActionSetHandle);
    fn digital_action(&self, handle: ActionHandle) -> Option<DigitalActionData>;
    fn analog_action(&self, handle: ActionHandle) -> Option<AnalogActionData>;
    fn input_source_handle(&self, path: &str) -> Option<InputSourceHandle>;
}

pub trait OverlaySystem {
    fn create_overlay(
        &mut self,
        key: &str,
        name: &str,
        settings: &OverlaySettings,
    ) -> Result<OverlayHandle, SessionError>;
    fn set_overlay_transform_absolute(
        &mut self,
        overlay: OverlayHandle,
        space: TrackingUniverse,
        transform: &HmdMatrix34,
    );
    fn set_overlay_width_in_meters(&mut self, overlay: OverlayHandle, width: f32);
    fn set_overlay_interactive(&mut self, overlay: OverlayHandle, interactive: bool);
    fn set_overlay_texture_bounds(&mut self, overlay: OverlayHandle, bounds: TextureBounds);
    fn set_overlay_texel_aspect(&mut self, overlay: OverlayHandle, aspect: f32);
    fn show_overlay(&mut self, overlay: OverlayHandle);
    fn hide_overlay(&mut self, overlay: OverlayHandle);
    fn is_overlay_visible(&self, overlay: OverlayHandle) -> bool;
    fn poll_next_overlay_event(&mut self, overlay: OverlayHandle) -> Option<OverlayEvent>;
}

pub trait RenderModels {
    fn render_model_name(&self, role: ControllerRole) -> Option<String>;
    /// Transform of a named model component relative to the controller
    fn component_local_transform(
        &self,
        model: &str,
        component: &str,
        input_source: Option<InputSourceHandle>,
    ) -> Option<HmdMatrix34>;
}

pub trait VrRuntime: PoseSource + ActionSource + OverlaySystem + RenderModels {}

impl<T: PoseSource + ActionSource + OverlaySystem + RenderModels> VrRuntime for T {}
