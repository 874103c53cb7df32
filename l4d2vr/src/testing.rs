// Scripted stand-ins for the VR runtime and the host, used by unit tests.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
};

use crate::{
    error::SessionError,
    host::{
        EntityHandle, HostInput, HostWorld, KeyAction, MouseButton, Portal, Ray, TraceFilter,
        TraceMask, TraceResult, VirtualKey,
    },
    input::{Action, ACTION_SET_PATH},
    pose::{ControllerRole, HmdMatrix34, RawDevicePose, IDENTITY_HMD_MATRIX},
    runtime::{
        ActionHandle, ActionSetHandle, ActionSource, AnalogActionData, DigitalActionData, Eye,
        InputSourceHandle, OverlayEvent, OverlayHandle, OverlaySettings, OverlaySystem,
        PoseSource, ProjectionRaw, RenderModels, TextureBounds, TrackingUniverse,
    },
};

#[derive(Clone, Debug)]
pub struct FakeOverlay {
    pub key: String,
    pub settings: OverlaySettings,
    pub transform: Option<HmdMatrix34>,
    pub width: f32,
    pub interactive: bool,
    pub bounds: TextureBounds,
    pub texel_aspect: f32,
    pub visible: bool,
    pub show_count: u32,
    events: VecDeque<OverlayEvent>,
}

pub struct FakeRuntime {
    pub poses: Vec<RawDevicePose>,
    pub left_index: Option<usize>,
    pub right_index: Option<usize>,
    pub tip: Option<HmdMatrix34>,
    pub render_size: (u32, u32),
    pub projection: ProjectionRaw,
    pub ipd: f32,
    pub fail_manifest: bool,
    pub fail_overlays: bool,
    pub missing_action: Option<Action>,
    pub manifest: Option<PathBuf>,
    pub wait_count: u32,
    pub action_updates: u32,

    pending_digital: HashMap<Action, bool>,
    pending_analog: HashMap<Action, (f32, f32)>,
    digital: HashMap<ActionHandle, DigitalActionData>,
    analog: HashMap<ActionHandle, AnalogActionData>,
    overlays: Vec<FakeOverlay>,
}

fn action_handle_for(action: Action) -> ActionHandle {
    let index = Action::ALL.iter().position(|a| *a == action).unwrap_or(0);
    ActionHandle(index as u64 + 1)
}

impl FakeRuntime {
    pub fn new() -> FakeRuntime {
        FakeRuntime {
            poses: vec![RawDevicePose::from_matrix(IDENTITY_HMD_MATRIX)],
            left_index: None,
            right_index: None,
            tip: None,
            render_size: (2000, 2000),
            projection: ProjectionRaw {
                left: -1.0,
                right: 1.0,
                top: -1.0,
                bottom: 1.0,
            },
            ipd: 0.064,
            fail_manifest: false,
            fail_overlays: false,
            missing_action: None,
            manifest: None,
            wait_count: 0,
            action_updates: 0,
            pending_digital: HashMap::new(),
            pending_analog: HashMap::new(),
            digital: HashMap::new(),
            analog: HashMap::new(),
            overlays: Vec::new(),
        }
    }

    /// Takes effect at the next `update_action_state`
    pub fn set_digital(&mut self, action: Action, pressed: bool) {
        self.pending_digital.insert(action, pressed);
    }

    pub fn set_analog(&mut self, action: Action, x: f32, y: f32) {
        self.pending_analog.insert(action, (x, y));
    }

    pub fn push_overlay_event(&mut self, overlay: OverlayHandle, event: OverlayEvent) {
        self.overlay_mut(overlay).events.push_back(event);
    }

    pub fn overlay(&self, overlay: OverlayHandle) -> &FakeOverlay {
        &self.overlays[overlay.0 as usize - 1]
    }

    pub fn overlay_by_key(&self, key: &str) -> Option<&FakeOverlay> {
        self.overlays.iter().find(|o| o.key == key)
    }

    fn overlay_mut(&mut self, overlay: OverlayHandle) -> &mut FakeOverlay {
        &mut self.overlays[overlay.0 as usize - 1]
    }
}

impl PoseSource for FakeRuntime {
    fn wait_get_poses(&mut self) -> Vec<RawDevicePose> {
        self.wait_count += 1;
        self.poses.clone()
    }

    fn tracking_space(&self) -> TrackingUniverse {
        TrackingUniverse::Standing
    }

    fn controller_device_index(&self, role: ControllerRole) -> Option<usize> {
        match role {
            ControllerRole::LeftHand => self.left_index,
            ControllerRole::RightHand => self.right_index,
        }
    }

    fn eye_to_head_transform(&self, eye: Eye) -> HmdMatrix34 {
        let x = match eye {
            Eye::Left => -self.ipd / 2.0,
            Eye::Right => self.ipd / 2.0,
        };
        [[1.0, 0.0, 0.0, x], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]]
    }

    fn projection_raw(&self, _eye: Eye) -> ProjectionRaw {
        self.projection
    }

    fn recommended_render_target_size(&self) -> (u32, u32) {
        self.render_size
    }
}

impl ActionSource for FakeRuntime {
    fn set_action_manifest(&mut self, path: &Path) -> Result<(), SessionError> {
        if self.fail_manifest {
            return Err(SessionError::ActionManifest {
                path: path.to_path_buf(),
                reason: "manifest rejected".to_owned(),
            });
        }
        self.manifest = Some(path.to_path_buf());
        Ok(())
    }

    fn action_handle(&mut self, path: &str) -> Result<ActionHandle, SessionError> {
        match Action::from_path(path) {
            Some(action) if Some(action) != self.missing_action => Ok(action_handle_for(action)),
            _ => Err(SessionError::UnknownAction(path.to_owned())),
        }
    }

    fn action_set_handle(&mut self, path: &str) -> Result<ActionSetHandle, SessionError> {
        if path == ACTION_SET_PATH {
            Ok(ActionSetHandle(1))
        } else {
            Err(SessionError::UnknownAction(path.to_owned()))
        }
    }

    fn update_action_state(&mut self, _set: ActionSetHandle) {
        self.action_updates += 1;

        for (action, pressed) in &self.pending_digital {
            let handle = action_handle_for(*action);
            let previous = self.digital.get(&handle).map_or(false, |d| d.state);
            self.digital.insert(
                handle,
                DigitalActionData {
                    state: *pressed,
                    changed: *pressed != previous,
                },
            );
        }

        for (action, (x, y)) in &self.pending_analog {
            self.analog
                .insert(action_handle_for(*action), AnalogActionData { x: *x, y: *y });
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

impl OverlaySystem for FakeRuntime {
    fn create_overlay(
        &mut self,
        key: &str,
        _name: &str,
        settings: &OverlaySettings,
    ) -> Result<OverlayHandle, SessionError> {
        if self.fail_overlays {
            return Err(SessionError::Overlay(format!("cannot create {key}")));
        }
        self.overlays.push(FakeOverlay {
            key: key.to_owned(),
            settings: *settings,
            transform: None,
            width: 1.0,
            interactive: false,
            bounds: TextureBounds::FULL,
            texel_aspect: 1.0,
            visible: false,
            show_count: 0,
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
        self.overlay_mut(overlay).transform = Some(*transform);
    }

    fn set_overlay_width_in_meters(&mut self, overlay: OverlayHandle, width: f32) {
        self.overlay_mut(overlay).width = width;
    }

    fn set_overlay_interactive(&mut self, overlay: OverlayHandle, interactive: bool) {
        self.overlay_mut(overlay).interactive = interactive;
    }

    fn set_overlay_texture_bounds(&mut self, overlay: OverlayHandle, bounds: TextureBounds) {
        self.overlay_mut(overlay).bounds = bounds;
    }

    fn set_overlay_texel_aspect(&mut self, overlay: OverlayHandle, aspect: f32) {
        self.overlay_mut(overlay).texel_aspect = aspect;
    }

    fn show_overlay(&mut self, overlay: OverlayHandle) {
        let overlay = self.overlay_mut(overlay);
        overlay.visible = true;
        overlay.show_count += 1;
    }

    fn hide_overlay(&mut self, overlay: OverlayHandle) {
        self.overlay_mut(overlay).visible = false;
    }

    fn is_overlay_visible(&self, overlay: OverlayHandle) -> bool {
        self.overlay(overlay).visible
    }

    fn poll_next_overlay_event(&mut self, overlay: OverlayHandle) -> Option<OverlayEvent> {
        self.overlay_mut(overlay).events.pop_front()
    }
}

impl RenderModels for FakeRuntime {
    fn render_model_name(&self, _role: ControllerRole) -> Option<String> {
        self.tip.map(|_| "fake_controller".to_owned())
    }

    fn component_local_transform(
        &self,
        _model: &str,
        component: &str,
        _input_source: Option<InputSourceHandle>,
    ) -> Option<HmdMatrix34> {
        if component == "tip" {
            self.tip
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct RecordingHost {
    pub commands: Vec<String>,
    pub keys: Vec<(VirtualKey, KeyAction)>,
    pub mouse_buttons: Vec<(MouseButton, bool)>,
    pub cursor: Vec<(i32, i32)>,
    pub wheel: Vec<i32>,
    pub window: (u32, u32),
    pub in_game: bool,
    pub cursor_visible: bool,
}

impl RecordingHost {
    pub fn new() -> RecordingHost {
        RecordingHost {
            commands: Vec::new(),
            keys: Vec::new(),
            mouse_buttons: Vec::new(),
            cursor: Vec::new(),
            wheel: Vec::new(),
            window: (1920, 1080),
            in_game: true,
            cursor_visible: false,
        }
    }
}

impl HostInput for RecordingHost {
    fn client_cmd_unrestricted(&mut self, command: &str) {
        self.commands.push(command.to_owned());
    }

    fn send_key(&mut self, key: VirtualKey, action: KeyAction) {
        self.keys.push((key, action));
    }

    fn send_mouse_button(&mut self, button: MouseButton, down: bool) {
        self.mouse_buttons.push((button, down));
    }

    fn set_cursor_pos(&mut self, x: i32, y: i32) {
        self.cursor.push((x, y));
    }

    fn mouse_wheeled(&mut self, delta: i32) {
        self.wheel.push(delta);
    }

    fn window_size(&self) -> (u32, u32) {
        self.window
    }

    fn is_in_game(&self) -> bool {
        self.in_game
    }

    fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }
}

pub struct FakeWorld {
    pub player: Option<EntityHandle>,
    /// Fraction where traces stop; `None` means nothing is hit
    pub hit_fraction: Option<f32>,
    pub portal: Option<Portal>,
    pub portal_fraction: f32,
    traces: RefCell<Vec<(Ray, TraceMask, TraceFilter)>>,
    portal_search: Cell<f32>,
}

impl FakeWorld {
    pub fn new() -> FakeWorld {
        FakeWorld {
            player: Some(EntityHandle(1)),
            hit_fraction: None,
            portal: None,
            portal_fraction: 0.5,
            traces: RefCell::new(Vec::new()),
            portal_search: Cell::new(0.0),
        }
    }

    pub fn traces(&self) -> Vec<(Ray, TraceMask, TraceFilter)> {
        self.traces.borrow().clone()
    }

    pub fn last_portal_search(&self) -> f32 {
        self.portal_search.get()
    }
}

impl HostWorld for FakeWorld {
    fn local_player(&self) -> Option<EntityHandle> {
        self.player
    }

    fn trace_ray(&self, ray: &Ray, mask: TraceMask, filter: &TraceFilter) -> TraceResult {
        self.traces.borrow_mut().push((*ray, mask, *filter));
        let fraction = self.hit_fraction.unwrap_or(1.0);
        TraceResult {
            end_pos: ray.at(fraction),
            fraction,
            did_hit: self.hit_fraction.is_some(),
        }
    }

    fn first_portal_along_ray(&self, _ray: &Ray, max_fraction: f32) -> Option<Portal> {
        self.portal_search.set(max_fraction);
        self.portal
    }

    fn intersect_ray_with_portal(&self, _ray: &Ray, _portal: &Portal) -> f32 {
        self.portal_fraction
    }
}
