use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    error::SessionError,
    runtime::{ActionHandle, ActionSetHandle, ActionSource},
};

pub const ACTION_SET_PATH: &str = "/actions/main";
pub const ACTION_MANIFEST_FILE: &str = "VR/SteamVRActionManifest/action_manifest.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    ActivateVr,
    Jump,
    PrimaryAttack,
    Reload,
    Use,
    Walk,
    Turn,
    SecondaryAttack,
    NextItem,
    PrevItem,
    ResetPosition,
    Crouch,
    Flashlight,
    MenuSelect,
    MenuBack,
    MenuUp,
    MenuDown,
    MenuLeft,
    MenuRight,
    Spray,
    Scoreboard,
    ShowHud,
    Pause,
}

impl Action {
    pub const ALL: [Action; 23] = [
        Action::ActivateVr,
        Action::Jump,
        Action::PrimaryAttack,
        Action::Reload,
        Action::Use,
        Action::Walk,
        Action::Turn,
        Action::SecondaryAttack,
        Action::NextItem,
        Action::PrevItem,
        Action::ResetPosition,
        Action::Crouch,
        Action::Flashlight,
        Action::MenuSelect,
        Action::MenuBack,
        Action::MenuUp,
        Action::MenuDown,
        Action::MenuLeft,
        Action::MenuRight,
        Action::Spray,
        Action::Scoreboard,
        Action::ShowHud,
        Action::Pause,
    ];

    /// Name used in the action manifest
    pub fn name(&self) -> &'static str {
        match self {
            Action::ActivateVr => "ActivateVR",
            Action::Jump => "Jump",
            Action::PrimaryAttack => "PrimaryAttack",
            Action::Reload => "Reload",
            Action::Use => "Use",
            Action::Walk => "Walk",
            Action::Turn => "Turn",
            Action::SecondaryAttack => "SecondaryAttack",
            Action::NextItem => "NextItem",
            Action::PrevItem => "PrevItem",
            Action::ResetPosition => "ResetPosition",
            Action::Crouch => "Crouch",
            Action::Flashlight => "Flashlight",
            Action::MenuSelect => "MenuSelect",
            Action::MenuBack => "MenuBack",
            Action::MenuUp => "MenuUp",
            Action::MenuDown => "MenuDown",
            Action::MenuLeft => "MenuLeft",
            Action::MenuRight => "MenuRight",
            Action::Spray => "Spray",
            Action::Scoreboard => "Scoreboard",
            Action::ShowHud => "ShowHUD",
            Action::Pause => "Pause",
        }
    }

    pub fn path(&self) -> String {
        format!("{ACTION_SET_PATH}/in/{}", self.name())
    }

    /// Looks up an action from its full manifest path
    pub fn from_path(path: &str) -> Option<Action> {
        ACTIONS_BY_PATH.get(path).copied()
    }
}

static ACTIONS_BY_PATH: Lazy<HashMap<String, Action>> =
    Lazy::new(|| Action::ALL.iter().map(|a| (a.path(), *a)).collect());

/// Every action handle, resolved once at session start
#[derive(Clone, Debug)]
pub struct ActionHandles {
    set: ActionSetHandle,
    handles: HashMap<Action, ActionHandle>,
}

impl ActionHandles {
    pub fn resolve(source: &mut dyn ActionSource) -> Result<ActionHandles, SessionError> {
        let set = source.action_set_handle(ACTION_SET_PATH)?;

        let mut handles = HashMap::new();
        for action in Action::ALL {
            let handle = source.action_handle(&action.path())?;
            debug!("resolved action {} -> {:?}", action.name(), handle);
            handles.insert(action, handle);
        }

        Ok(ActionHandles { set, handles })
    }

    pub fn set(&self) -> ActionSetHandle {
        self.set
    }

    pub fn get(&self, action: Action) -> Option<ActionHandle> {
        self.handles.get(&action).copied()
    }
}
