// A VR runtime that plays back a scripted session instead of talking to a
// headset: the head sways gently, the hands stay at chest height, and
// actions follow the timeline.

use std::{
    collections::{HashMap, VecDeque},
    path::Path,
};

use l4d2vr::{
    error::SessionError,
    input::Action,
    pose::{ControllerRole, HmdMatrix34, RawDevicePose},
    runtime::{
        ActionHandle, ActionSetHandle, ActionSource, AnalogActionData, DigitalActionData, Eye,
        InputSourceHandle, OverlayEvent, OverlayHandle, OverlaySettings, OverlaySystem,
        PoseSource, ProjectionRaw, RenderModels, TextureBounds, TrackingUniverse,
    },
};
use tracing::{debug, info, warn};

use crate::timeline::{ScriptedInput, Timeline};

const RENDER_SIZE: (u32, u32) = (2016, 2240);
const IPD: f32 = 0.063;
const HEAD_HEIGHT: f32 = 1.7;
const HAND_HEIGHT: f32 = 1.3;

const LEFT_HAND_INDEX: usize = 1;
const RIGHT_HAND_INDEX: usize = 2;

/// Rotation about the runtime's vertical axis, then a tilt about its X axis, then a translation
fn yaw_pitch_matrix(yaw_degrees: f32, pitch_degrees: f32, position: [f32; 3]) -> HmdMatrix34 {
    let (sy, cy) = yaw_degrees.to_radians().sin_cos();
    let (sp, cp) = pitch_degrees.to_radians().sin_cos();
    [
        [cy, sy * sp, sy * cp, position[0]],
        [0.0, cp, -sp, position[1]],
        [-sy, cy * sp, cy * cp, position[2]],
    ]
}

struct SimulatedOverlay {
    key: String,
    visible: bool,
    interactive: bool,
    events: VecDeque<OverlayEvent>,
}

pub struct SimulatedRuntime {
    timeline: Timeline,
    frame: u64,
    actions: Vec<Action>,
    digital: HashMap<ActionHandle, DigitalActionData>,
    analog: HashMap<ActionHandle, AnalogActionData>,
    overlays: Vec<SimulatedOverlay>,
}

impl SimulatedRuntime {
    pub fn new(timeline: Timeline) -> SimulatedRuntime {
        SimulatedRuntime {
            timeline,
            frame: 0,
            actions: Vec::new(),
            digital: HashMap::new(),
            analog: HashMap::new(),
            overlays: Vec::new(),
        }
    }

    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    fn handle_for(&self, action: Action) -> Option<ActionHandle> {
        self.actions
            .iter()
            .position(|a| *a == action)
            .map(|index| ActionHandle(index as u64 + 1))
    }

    fn apply(&mut self, input: ScriptedInput) {
        match input {
            ScriptedInput::Digital { action, pressed } => {
                let Some(handle) = self.handle_for(action) else {
                    warn!("timeline uses unregistered action {}", action.name());
                    return;
                };
                debug!("{} {}", action.name(), if pressed { "pressed" } else { "released" });
                self.digital.insert(
                    handle,
                    DigitalActionData {
                        state: pressed,
                        changed: true,
                    },
                );
            }
            ScriptedInput::Analog { action, x, y } => {
                if let Some(handle) = self.handle_for(action) {
                    self.analog.insert(handle, AnalogActionData { x, y });
                }
            }
            ScriptedInput::MenuPointer(event) => {
                if let Some(overlay) = self.overlays.iter_mut().find(|o| o.visible) {
                    overlay.events.push_back(event);
                }
            }
        }
    }
}

impl PoseSource for SimulatedRuntime {
    fn wait_get_poses(&mut self) -> Vec<RawDevicePose> {
        let t = self.frame as f32 * 0.02;
        let head_yaw = 10.0 * t.sin();

        vec![
            RawDevicePose::from_matrix(yaw_pitch_matrix(head_yaw, 0.0, [0.0, HEAD_HEIGHT, 0.0])),
            RawDevicePose::from_matrix(yaw_pitch_matrix(0.0, 0.0, [-0.2, HAND_HEIGHT, -0.3])),
            RawDevicePose::from_matrix(yaw_pitch_matrix(
                0.0,
                5.0 * (t * 0.5).sin(),
                [0.2, HAND_HEIGHT, -0.3],
            )),
        ]
    }

    fn tracking_space(&self) -> TrackingUniverse {
        TrackingUniverse::Standing
    }

    fn controller_device_index(&self, role: ControllerRole) -> Option<usize> {
        match role {
            ControllerRole::LeftHand => Some(LEFT_HAND_INDEX),
            ControllerRole::RightHand => Some(RIGHT_HAND_INDEX),
        }
    }

    fn eye_to_head_transform(&self, eye: Eye) -> HmdMatrix34 {
        let x = match eye {
            Eye::Left => -IPD / 2.0,
            Eye::Right => IPD / 2.0,
        };
        [[1.0, 0.0, 0.0, x], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.015]]
    }

    fn projection_raw(&self, eye: Eye) -> ProjectionRaw {
        // Slightly asymmetric, as most headsets report
        match eye {
            Eye::Left => ProjectionRaw {
                left: -1.39,
                right: 1.24,
                top: -1.47,
                bottom: 1.45,
            },
            Eye::Right => ProjectionRaw {
                left: -1.24,
                right: 1.39,
                top: -1.47,
                bottom: 1.45,
            },
        }
    }

    fn recommended_render_target_size(&self) -> (u32, u32) {
        RENDER_SIZE
    }
}

impl ActionSource for SimulatedRuntime {
    fn set_action_manifest(&mut self, path: &Path) -> Result<(), SessionError> {
        if !path.exists() {
            warn!("action manifest {:?} not found; using built-in bindings", path);
        }
        Ok(())
    }

    fn action_handle(&mut self, path: &str) -> Result<ActionHandle, SessionError> {
        let action =
            Action::from_path(path).ok_or_else(|| SessionError::UnknownAction(path.to_owned()))?;
        if let Some(handle) = self.handle_for(action) {
            return Ok(handle);
        }
        self.actions.push(action);
        Ok(ActionHandle(self.actions.len() as u64))
    }

    fn action_set_handle(&mut self, _path: &str) -> Result<ActionSetHandle, SessionError> {
        Ok(ActionSetHandle(1))
    }

    fn update_action_state(&mut self, _set: ActionSetHandle) {
        for data in self.digital.values_mut() {
            data.changed = false;
        }
        for input in self.timeline.inputs_at(self.frame) {
            self.apply(input);
        }
    }

    fn digital_action(&self, handle: ActionHandle) -> Option<DigitalActionData> {
        Some(self.digital.get(&handle).copied().unwrap_or_default())
    }

    fn analog_action(&self, handle: ActionHandle) -> Option<AnalogActionData> {
        Some(self.analog.get(&handle).copied().unwrap_or_default())
    }

    fn input_source_handle(&self, path: &str) -> Option<InputSourceHandle> {
        match path {
            "/user/hand/left" => Some(InputSourceHandle(1)),
            "/user/hand/right" => Some(InputSourceHandle(2)),
            _ => None,
        }
    }
}

impl OverlaySystem for SimulatedRuntime {
    fn create_overlay(
        &mut self,
        key: &str,
        name: &str,
        settings: &OverlaySettings,
    ) -> Result<OverlayHandle, SessionError> {
        info!("created overlay '{name}' ({key}) with {:?}", settings.flags);
        self.overlays.push(SimulatedOverlay {
            key: key.to_owned(),
            visible: false,
            interactive: false,
            events: VecDeque::new(),
        });
        Ok(OverlayHandle(self.overlays.len() as u64))
    }

    fn set_overlay_transform_absolute(
        &mut self,
        overlay: OverlayHandle,
        _space: TrackingUniverse,
        transform: &HmdMatrix34,
    ) {
        if let Some(o) = self.overlay(overlay) {
            debug!(
                "overlay {} moved to ({:.2}, {:.2}, {:.2})",
                o.key, transform[0][3], transform[1][3], transform[2][3]
            );
        }
    }

    fn set_overlay_width_in_meters(&mut self, _overlay: OverlayHandle, _width: f32) {}

    fn set_overlay_interactive(&mut self, overlay: OverlayHandle, interactive: bool) {
        if let Some(o) = self.overlay_mut(overlay) {
            o.interactive = interactive;
        }
    }

    fn set_overlay_texture_bounds(&mut self, _overlay: OverlayHandle, _bounds: TextureBounds) {}

    fn set_overlay_texel_aspect(&mut self, _overlay: OverlayHandle, _aspect: f32) {}

    fn show_overlay(&mut self, overlay: OverlayHandle) {
        if let Some(o) = self.overlay_mut(overlay) {
            if !o.visible {
                info!("overlay {} shown", o.key);
            }
            o.visible = true;
        }
    }

    fn hide_overlay(&mut self, overlay: OverlayHandle) {
        if let Some(o) = self.overlay_mut(overlay) {
            if o.visible {
                info!("overlay {} hidden", o.key);
            }
            o.visible = false;
        }
    }

    fn is_overlay_visible(&self, overlay: OverlayHandle) -> bool {
        self.overlay(overlay).map_or(false, |o| o.visible)
    }

    fn poll_next_overlay_event(&mut self, overlay: OverlayHandle) -> Option<OverlayEvent> {
        let o = self.overlay_mut(overlay)?;
        if o.interactive {
            o.events.pop_front()
        } else {
            None
        }
    }
}

impl SimulatedRuntime {
    fn overlay(&self, overlay: OverlayHandle) -> Option<&SimulatedOverlay> {
        (overlay.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.overlays.get(index))
    }

    fn overlay_mut(&mut self, overlay: OverlayHandle) -> Option<&mut SimulatedOverlay> {
        (overlay.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.overlays.get_mut(index))
    }
}

impl RenderModels for SimulatedRuntime {
    fn render_model_name(&self, _role: ControllerRole) -> Option<String> {
        Some("simulated_controller".to_owned())
    }

    fn component_local_transform(
        &self,
        _model: &str,
        component: &str,
        _input_source: Option<InputSourceHandle>,
    ) -> Option<HmdMatrix34> {
        // The tip sits a few centimetres ahead of the grip
        (component == "tip").then_some([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, -0.01],
            [0.0, 0.0, 1.0, -0.05],
        ])
    }
}
