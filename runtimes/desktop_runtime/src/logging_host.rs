// Host input that logs what the engine asks for, and models just enough of
// the game UI to react: `gameui_activate` opens the menu, Escape closes it.

use l4d2vr::host::{HostInput, KeyAction, MouseButton, VirtualKey};
use tracing::info;

pub struct LoggingHost {
    window: (u32, u32),
    in_game: bool,
    cursor_visible: bool,
    cursor: (i32, i32),
    commands_sent: u32,
}

impl LoggingHost {
    pub fn new(window: (u32, u32)) -> LoggingHost {
        LoggingHost {
            window,
            in_game: true,
            cursor_visible: false,
            cursor: (0, 0),
            commands_sent: 0,
        }
    }

    pub fn commands_sent(&self) -> u32 {
        self.commands_sent
    }

    pub fn cursor(&self) -> (i32, i32) {
        self.cursor
    }
}

impl HostInput for LoggingHost {
    fn client_cmd_unrestricted(&mut self, command: &str) {
        info!("command: {command}");
        self.commands_sent += 1;
        if command == "gameui_activate" {
            self.cursor_visible = true;
        }
    }

    fn send_key(&mut self, key: VirtualKey, action: KeyAction) {
        info!("key {:?} {:?}", key, action);
        if key == VirtualKey::Escape && action == KeyAction::Up {
            self.cursor_visible = false;
        }
    }

    fn send_mouse_button(&mut self, button: MouseButton, down: bool) {
        info!("mouse {:?} {}", button, if down { "down" } else { "up" });
    }

    fn set_cursor_pos(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
        info!("cursor at ({x}, {y})");
    }

    fn mouse_wheeled(&mut self, delta: i32) {
        info!("mouse wheel {delta}");
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
