use std::collections::HashSet;

use tracing::{debug, trace};

use crate::{
    host::VirtualKey,
    input::{
        actions::{Action, ActionHandles},
        InputEffect,
    },
    runtime::ActionSource,
    turn::{TurnController, TurnState},
    vr_config::EngineConfig,
};

/// Actions that hold a host command for as long as they are held
const PRESS_RELEASE_ACTIONS: [(Action, &str, &str); 6] = [
    (Action::PrimaryAttack, "+attack", "-attack"),
    (Action::SecondaryAttack, "+attack2", "-attack2"),
    (Action::Jump, "+jump", "-jump"),
    (Action::Crouch, "+duck", "-duck"),
    (Action::Use, "+use", "-use"),
    (Action::Reload, "+reload", "-reload"),
];

const SCOREBOARD_COMMANDS: (&str, &str) = ("+showscores", "-showscores");

const MENU_ARROW_KEYS: [(Action, VirtualKey); 4] = [
    (Action::MenuUp, VirtualKey::Up),
    (Action::MenuDown, VirtualKey::Down),
    (Action::MenuLeft, VirtualKey::Left),
    (Action::MenuRight, VirtualKey::Right),
];

// Pointing the right controller steeply up or down also brings up the HUD
const HUD_PITCH_DOWN: f32 = 60.0;
const HUD_PITCH_UP: f32 = -45.0;

pub struct GameInputContext<'a> {
    pub delta_ms: f32,
    pub config: &'a EngineConfig,
    pub right_controller_pitch: f32,
}

///
/// Turns the runtime's per-frame action snapshot into host commands.
///
/// Commands fire on transitions only: a press/release pair emits its start
/// verb once when pressed and its stop verb once when released, and one-shot
/// actions fire on the press.
///
pub struct ActionDispatcher {
    handles: ActionHandles,
    held: HashSet<Action>,
    turn: TurnController,
    hud_enabled: bool,
    hud_visible: bool,
}

impl ActionDispatcher {
    pub fn new(handles: ActionHandles, hud_enabled: bool) -> ActionDispatcher {
        ActionDispatcher {
            handles,
            held: HashSet::new(),
            turn: TurnController::new(),
            hud_enabled,
            hud_visible: false,
        }
    }

    pub fn handles(&self) -> &ActionHandles {
        &self.handles
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn.state()
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// (pressed, changed) for this frame; a failed read is (false, false)
    pub fn poll_digital(&self, source: &dyn ActionSource, action: Action) -> (bool, bool) {
        self.handles
            .get(action)
            .and_then(|handle| source.digital_action(handle))
            .map_or((false, false), |data| (data.state, data.changed))
    }

    pub fn poll_analog(&self, source: &dyn ActionSource, action: Action) -> Option<(f32, f32)> {
        self.handles
            .get(action)
            .and_then(|handle| source.analog_action(handle))
            .map(|data| (data.x, data.y))
    }

    fn just_pressed(&self, source: &dyn ActionSource, action: Action) -> bool {
        let (state, changed) = self.poll_digital(source, action);
        changed && state
    }

    pub fn process_game_input(
        &mut self,
        source: &dyn ActionSource,
        ctx: &GameInputContext,
    ) -> Vec<InputEffect> {
        let mut effects = Vec::new();

        if let Some((x, _)) = self.poll_analog(source, Action::Turn) {
            let yaw_delta = self.turn.update(x, ctx.delta_ms, ctx.config.turn_mode());
            if yaw_delta != 0.0 {
                effects.push(InputEffect::RotateYaw(yaw_delta));
            }
        }

        for (action, start, stop) in PRESS_RELEASE_ACTIONS {
            self.press_release(source, action, start, stop, &mut effects);
        }

        if self.just_pressed(source, Action::PrevItem) {
            effects.push(InputEffect::command("invprev"));
        } else if self.just_pressed(source, Action::NextItem) {
            effects.push(InputEffect::command("invnext"));
        }

        if self.just_pressed(source, Action::ResetPosition) {
            effects.push(InputEffect::ResetPosition);
        }

        if self.just_pressed(source, Action::Flashlight) {
            effects.push(InputEffect::command("impulse 100"));
        }

        if self.just_pressed(source, Action::Spray) {
            effects.push(InputEffect::command("impulse 201"));
        }

        if self.hud_enabled {
            self.update_hud(source, ctx, &mut effects);
        }

        if self.just_pressed(source, Action::Pause) {
            effects.push(InputEffect::command("gameui_activate"));
            effects.push(InputEffect::RepositionOverlays);
        }

        if !effects.is_empty() {
            trace!("game input effects: {:?}", effects);
        }
        effects
    }

    fn press_release(
        &mut self,
        source: &dyn ActionSource,
        action: Action,
        start: &str,
        stop: &str,
        effects: &mut Vec<InputEffect>,
    ) {
        let (state, changed) = self.poll_digital(source, action);
        if !changed {
            return;
        }

        if state && self.held.insert(action) {
            effects.push(InputEffect::command(start));
        } else if !state && self.held.remove(&action) {
            effects.push(InputEffect::command(stop));
        }
    }

    fn update_hud(
        &mut self,
        source: &dyn ActionSource,
        ctx: &GameInputContext,
        effects: &mut Vec<InputEffect>,
    ) {
        let (start, stop) = SCOREBOARD_COMMANDS;
        self.press_release(source, Action::Scoreboard, start, stop, effects);

        let (show_hud, _) = self.poll_digital(source, Action::ShowHud);
        let (scoreboard, _) = self.poll_digital(source, Action::Scoreboard);
        let pitch = ctx.right_controller_pitch;
        let controller_vertical = pitch > HUD_PITCH_DOWN || pitch < HUD_PITCH_UP;

        let wanted =
            show_hud || scoreboard || controller_vertical || ctx.config.hud_always_visible;
        if wanted != self.hud_visible {
            debug!("hud visible: {wanted}");
            self.hud_visible = wanted;
            effects.push(InputEffect::SetHudVisible(wanted));
        }
    }

    /// Digital menu navigation, used while the cursor is visible and no laser is on the overlay
    pub fn process_menu_keys(&self, source: &dyn ActionSource) -> Vec<InputEffect> {
        let mut effects = Vec::new();

        if self.just_pressed(source, Action::MenuSelect) {
            effects.push(InputEffect::KeyTap(VirtualKey::Return));
        }

        if self.just_pressed(source, Action::MenuBack) || self.just_pressed(source, Action::Pause) {
            effects.push(InputEffect::KeyTap(VirtualKey::Escape));
        }

        for (action, key) in MENU_ARROW_KEYS {
            if self.just_pressed(source, action) {
                effects.push(InputEffect::KeyTap(key));
            }
        }

        effects
    }

    ///
    /// Emits the stop verb for everything still held. Used when input moves to
    /// the menu, where releases are never seen by the game-input path.
    ///
    pub fn release_held(&mut self) -> Vec<InputEffect> {
        let mut effects = Vec::new();

        for (action, _, stop) in PRESS_RELEASE_ACTIONS {
            if self.held.remove(&action) {
                effects.push(InputEffect::command(stop));
            }
        }

        if self.held.remove(&Action::Scoreboard) {
            effects.push(InputEffect::command(SCOREBOARD_COMMANDS.1));
        }

        effects
    }
}
