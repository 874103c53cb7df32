pub mod config_watcher;
pub mod error;
pub mod host;
pub mod input;
pub mod macros;
pub mod math;
pub mod overlay;
pub mod pose;
pub mod recenter;
pub mod runtime;
pub mod time;
pub mod turn;
pub mod view_geometry;
pub mod vr_config;
pub mod world_ray;

#[cfg(test)]
mod testing;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use cgmath::{Vector3, Zero};
use tracing::{debug, info, span, trace, warn, Level};

use crate::{
    config_watcher::{ConfigPoller, ConfigWatcher},
    error::SessionError,
    host::{HostInput, HostWorld, KeyAction},
    input::{ActionDispatcher, ActionHandles, GameInputContext, InputEffect, ACTION_MANIFEST_FILE},
    math::Angles,
    overlay::{HudOverlay, MenuOverlay, MenuSurface, OverlayPointer},
    pose::{ControllerRole, PoseStore},
    recenter::RecenterController,
    runtime::{Eye, VrRuntime},
    time::Time,
    view_geometry::{EyeParameters, RenderParams, ViewGeometry},
    vr_config::{EngineConfig, LiveConfig, DEFAULT_CONFIG_FILE},
};

/// Experimental feature that enables the floating HUD overlay
pub const HUD_OVERLAY_FEATURE: &str = "hud_overlay";

pub fn resource_path(install_dir: &Path, relative: &str) -> PathBuf {
    install_dir.join(relative)
}

pub struct EngineOptions {
    pub install_dir: PathBuf,
    /// Overrides `VR/config.txt` under the install directory
    pub config_file: Option<PathBuf>,
    /// Overrides the action manifest under the install directory
    pub action_manifest: Option<PathBuf>,
    pub watch_config: bool,
    pub experimental_features: HashSet<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("."),
            config_file: None,
            action_manifest: None,
            watch_config: true,
            experimental_features: HashSet::new(),
        }
    }
}

impl EngineOptions {
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| resource_path(&self.install_dir, DEFAULT_CONFIG_FILE))
    }

    pub fn action_manifest_path(&self) -> PathBuf {
        self.action_manifest
            .clone()
            .unwrap_or_else(|| resource_path(&self.install_dir, ACTION_MANIFEST_FILE))
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.experimental_features.contains(feature)
    }
}

///
/// One VR session. Owns the runtime, the host bindings and every piece of
/// per-frame state; the host calls `update` once per frame and then reads
/// camera, hand and weapon transforms back out.
///
pub struct VrEngine<R: VrRuntime, H: HostInput, W: HostWorld> {
    options: EngineOptions,
    runtime: R,
    host: H,
    world: W,

    live_config: LiveConfig,
    config: Arc<EngineConfig>,
    watcher: Option<ConfigWatcher>,

    render: RenderParams,
    eye: EyeParameters,
    poses: PoseStore,
    recenter: RecenterController,
    geometry: ViewGeometry,

    dispatcher: ActionDispatcher,
    menu: MenuOverlay,
    hud: Option<HudOverlay>,
    pointer: OverlayPointer,
    menu_input_active: bool,

    setup_origin: Vector3<f32>,
    aim_point: Option<Vector3<f32>>,
    frame_count: u64,
}

fn load_initial_config(path: &Path) -> EngineConfig {
    match vr_config::load(path) {
        Ok(report) => {
            info!(
                "loaded config from {:?} ({} fields defaulted)",
                path,
                report.diagnostics().count()
            );
            report.config
        }
        Err(err) => {
            warn!("{err}; using default config");
            EngineConfig::default()
        }
    }
}

impl<R: VrRuntime, H: HostInput, W: HostWorld> VrEngine<R, H, W> {
    pub fn init(
        mut runtime: R,
        host: H,
        world: W,
        options: EngineOptions,
    ) -> Result<VrEngine<R, H, W>, SessionError> {
        let render = RenderParams::from_projection(
            runtime.recommended_render_target_size(),
            runtime.projection_raw(Eye::Left),
            runtime.projection_raw(Eye::Right),
        );
        info!(
            "render target {}x{}, fov {:.1}, aspect {:.3}",
            render.render_width, render.render_height, render.fov, render.aspect
        );

        let eye = EyeParameters::from_eye_to_head(
            &runtime.eye_to_head_transform(Eye::Left),
            &runtime.eye_to_head_transform(Eye::Right),
        );
        debug!("eye parameters: {:?}", eye);

        let manifest = options.action_manifest_path();
        runtime.set_action_manifest(&manifest)?;
        let handles = ActionHandles::resolve(&mut runtime)?;

        let menu = MenuOverlay::create(&mut runtime, (render.render_width, render.render_height))?;
        let hud_enabled = options.has_feature(HUD_OVERLAY_FEATURE);
        let hud = if hud_enabled {
            Some(HudOverlay::create(&mut runtime)?)
        } else {
            None
        };

        let config_path = options.config_path();
        let live_config = LiveConfig::new(load_initial_config(&config_path));
        let watcher = if options.watch_config {
            match ConfigWatcher::spawn(ConfigPoller::primed(&config_path), live_config.clone()) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    warn!("config hot reload unavailable: {err}");
                    None
                }
            }
        } else {
            None
        };
        let config = live_config.snapshot();

        let mut engine = VrEngine {
            options,
            runtime,
            host,
            world,
            live_config,
            config,
            watcher,
            render,
            eye,
            poses: PoseStore::new(),
            recenter: RecenterController::new(),
            geometry: ViewGeometry::default(),
            dispatcher: ActionDispatcher::new(handles, hud_enabled),
            menu,
            hud,
            pointer: OverlayPointer::new(),
            menu_input_active: false,
            setup_origin: Vector3::zero(),
            aim_point: None,
            frame_count: 0,
        };

        engine.refresh_tracking();
        info!("VR session ready");
        Ok(engine)
    }

    ///
    /// Advances one frame. `rendered_new_frame` is false while the host is
    /// not producing stereo frames (menus, loading), which is when the menu
    /// overlay is shown.
    ///
    pub fn update(&mut self, time: &Time, rendered_new_frame: bool) {
        let span = span!(Level::INFO, "update");
        let _enter = span.enter();
        self.frame_count += 1;

        self.config = self.live_config.snapshot();
        let surface = self.menu_surface();

        if rendered_new_frame {
            self.menu.hide(&mut self.runtime);
        } else {
            let hmd = self.poses.raw_hmd().device_to_absolute;
            let space = self.runtime.tracking_space();
            self.menu.present(&mut self.runtime, space, &hmd, &surface);
        }

        crate::profile!("l4d2vr.update.tracking", self.refresh_tracking());

        let effects = if self.host.is_cursor_visible() {
            self.process_menu_input(&surface)
        } else {
            self.process_game_input(time)
        };

        for effect in effects {
            self.apply_effect(effect, &surface);
        }
    }

    fn menu_surface(&self) -> MenuSurface {
        MenuSurface {
            in_game: self.host.is_in_game(),
            window: self.host.window_size(),
            render: (self.render.render_width, self.render.render_height),
        }
    }

    /// Poses, action snapshot, derived geometry and aim point for this frame
    fn refresh_tracking(&mut self) {
        let raw = self.runtime.wait_get_poses();
        self.runtime
            .update_action_state(self.dispatcher.handles().set());

        self.poses.refresh(
            raw,
            self.runtime
                .controller_device_index(ControllerRole::LeftHand),
            self.runtime
                .controller_device_index(ControllerRole::RightHand),
            self.config.left_handed,
        );

        self.geometry = ViewGeometry::compute(&self.poses, &self.recenter, self.eye, &self.config);

        self.aim_point = self.world.local_player().map(|player| {
            world_ray::trace_aim(
                &self.world,
                player,
                self.right_controller_abs_pos(),
                self.geometry.right_hand.basis.forward,
            )
        });
    }

    fn process_menu_input(&mut self, surface: &MenuSurface) -> Vec<InputEffect> {
        let mut effects = Vec::new();
        if !self.menu_input_active {
            debug!("input switched to menu");
            effects.extend(self.dispatcher.release_held());
            self.menu_input_active = true;
        }

        let pointer = self
            .pointer
            .update(&mut self.runtime, &self.poses, &self.menu, surface);
        effects.extend(pointer.effects);

        if !pointer.hovering {
            effects.extend(self.dispatcher.process_menu_keys(&self.runtime));
        }
        effects
    }

    fn process_game_input(&mut self, time: &Time) -> Vec<InputEffect> {
        if self.menu_input_active {
            debug!("input switched to game");
            self.menu_input_active = false;
        }

        let ctx = GameInputContext {
            delta_ms: time.delta_ms(),
            config: &self.config,
            right_controller_pitch: self.geometry.right_hand.angles.pitch,
        };
        self.dispatcher.process_game_input(&self.runtime, &ctx)
    }

    fn apply_effect(&mut self, effect: InputEffect, surface: &MenuSurface) {
        trace!("applying {:?}", effect);
        match effect {
            InputEffect::ClientCommand(command) => self.host.client_cmd_unrestricted(&command),
            InputEffect::KeyTap(key) => {
                self.host.send_key(key, KeyAction::Down);
                self.host.send_key(key, KeyAction::Up);
            }
            InputEffect::MouseButton { button, down } => self.host.send_mouse_button(button, down),
            InputEffect::SetCursorPos { x, y } => self.host.set_cursor_pos(x, y),
            InputEffect::MouseWheel(delta) => self.host.mouse_wheeled(delta),
            InputEffect::RotateYaw(degrees) => self.recenter.apply_yaw_delta(degrees),
            InputEffect::ResetPosition => self.recenter.reset(self.poses.hmd.position),
            InputEffect::RepositionOverlays => {
                let hmd = self.poses.raw_hmd().device_to_absolute;
                let space = self.runtime.tracking_space();
                self.menu.reposition(&mut self.runtime, space, &hmd, surface);
            }
            InputEffect::SetHudVisible(visible) => {
                let Some(hud) = &self.hud else { return };
                if visible {
                    let hmd = self.poses.raw_hmd().device_to_absolute;
                    let space = self.runtime.tracking_space();
                    hud.show(
                        &mut self.runtime,
                        space,
                        &hmd,
                        self.config.hud_distance,
                        self.config.hud_size,
                        self.config.hud_always_visible,
                    );
                } else {
                    hud.hide(&mut self.runtime);
                }
            }
        }
    }

    /// Base position of the player's camera in the world, supplied by the host each frame
    pub fn set_setup_origin(&mut self, origin: Vector3<f32>) {
        self.setup_origin = origin;
    }

    pub fn setup_origin(&self) -> Vector3<f32> {
        self.setup_origin
    }

    pub fn view_origin(&self) -> Vector3<f32> {
        self.geometry.view_origin(self.setup_origin)
    }

    pub fn eye_origin(&self, eye: Eye) -> Vector3<f32> {
        self.geometry.eye_origin(eye, self.setup_origin)
    }

    pub fn view_angle(&self) -> Angles {
        self.geometry.view_angle()
    }

    pub fn right_controller_abs_pos(&self) -> Vector3<f32> {
        self.geometry.right_controller_abs_pos(self.setup_origin)
    }

    pub fn left_controller_abs_pos(&self) -> Vector3<f32> {
        self.geometry.left_controller_abs_pos(self.setup_origin)
    }

    pub fn right_controller_abs_angle(&self) -> Angles {
        self.geometry.right_controller_abs_angle()
    }

    pub fn left_controller_abs_angle(&self) -> Angles {
        self.geometry.left_controller_abs_angle()
    }

    pub fn viewmodel_abs_pos(&self) -> Vector3<f32> {
        self.geometry.viewmodel_abs_pos(self.setup_origin)
    }

    pub fn viewmodel_abs_angle(&self) -> Angles {
        self.geometry.viewmodel_abs_angle()
    }

    /// Where the right controller's aim ray meets the world, when a local player exists
    pub fn aim_point(&self) -> Option<Vector3<f32>> {
        self.aim_point
    }

    pub fn draws_laser_sight(&self) -> bool {
        self.config.draws_laser_sight()
    }

    /// Resolves an eye position that may sit behind a portal; unchanged without a local player
    pub fn trace_eye(
        &self,
        camera_pos: Vector3<f32>,
        eye_pos: Vector3<f32>,
        eye_angles: Angles,
    ) -> (Vector3<f32>, Angles) {
        match self.world.local_player() {
            Some(player) => {
                world_ray::trace_eye(&self.world, player, camera_pos, eye_pos, eye_angles)
            }
            None => (eye_pos, eye_angles),
        }
    }

    /// The config snapshot this frame was computed with
    pub fn config(&self) -> Arc<EngineConfig> {
        self.config.clone()
    }

    pub fn live_config(&self) -> &LiveConfig {
        &self.live_config
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn render_params(&self) -> RenderParams {
        self.render
    }

    pub fn geometry(&self) -> &ViewGeometry {
        &self.geometry
    }

    pub fn poses(&self) -> &PoseStore {
        &self.poses
    }

    pub fn recenter(&self) -> &RecenterController {
        &self.recenter
    }

    pub fn menu_overlay(&self) -> &MenuOverlay {
        &self.menu
    }

    pub fn hud_overlay(&self) -> Option<&HudOverlay> {
        self.hud.as_ref()
    }

    pub fn is_pointer_on_menu(&self) -> bool {
        self.pointer.is_interactive()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_watching_config(&self) -> bool {
        self.watcher.as_ref().map_or(false, |w| w.is_running())
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Stops the config watcher and releases anything still held in game
    pub fn shutdown(&mut self) {
        for effect in self.dispatcher.release_held() {
            if let InputEffect::ClientCommand(command) = effect {
                self.host.client_cmd_unrestricted(&command);
            }
        }
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        info!("VR session shut down after {} frames", self.frame_count);
    }
}
