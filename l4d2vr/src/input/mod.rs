// Mapping from VR actions to host input.

mod actions;
mod dispatcher;

pub use actions::{Action, ActionHandles, ACTION_MANIFEST_FILE, ACTION_SET_PATH};
pub use dispatcher::{ActionDispatcher, GameInputContext};

use crate::host::{MouseButton, VirtualKey};

/// Something the engine should do to the host (or to itself) as a result of input
#[derive(Clone, Debug, PartialEq)]
pub enum InputEffect {
    ClientCommand(String),
    KeyTap(VirtualKey),
    MouseButton { button: MouseButton, down: bool },
    SetCursorPos { x: i32, y: i32 },
    MouseWheel(i32),
    RotateYaw(f32),
    ResetPosition,
    RepositionOverlays,
    SetHudVisible(bool),
}

impl InputEffect {
    pub fn command(command: &str) -> InputEffect {
        InputEffect::ClientCommand(command.to_owned())
    }
}
