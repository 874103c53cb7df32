use l4d2vr::{input::Action, runtime::OverlayEvent};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScriptedInput {
    Digital { action: Action, pressed: bool },
    Analog { action: Action, x: f32, y: f32 },
    /// Delivered to whichever overlay is visible, once it is interactive
    MenuPointer(OverlayEvent),
}

/// Frame-indexed input script for the simulated runtime
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    events: Vec<(u64, ScriptedInput)>,
}

impl Timeline {
    pub fn new() -> Timeline {
        Timeline::default()
    }

    pub fn at(mut self, frame: u64, input: ScriptedInput) -> Timeline {
        self.events.push((frame, input));
        self
    }

    /// Presses `action` at `frame` and releases it `hold` frames later
    pub fn tap(self, frame: u64, hold: u64, action: Action) -> Timeline {
        self.at(
            frame,
            ScriptedInput::Digital {
                action,
                pressed: true,
            },
        )
        .at(
            frame + hold,
            ScriptedInput::Digital {
                action,
                pressed: false,
            },
        )
    }

    pub fn stick(self, frame: u64, action: Action, x: f32, y: f32) -> Timeline {
        self.at(frame, ScriptedInput::Analog { action, x, y })
    }

    pub fn pointer(self, frame: u64, event: OverlayEvent) -> Timeline {
        self.at(frame, ScriptedInput::MenuPointer(event))
    }

    pub fn inputs_at(&self, frame: u64) -> Vec<ScriptedInput> {
        self.events
            .iter()
            .filter(|(at, _)| *at == frame)
            .map(|(_, input)| *input)
            .collect()
    }

    pub fn last_frame(&self) -> u64 {
        self.events.iter().map(|(at, _)| *at).max().unwrap_or(0)
    }

    ///
    /// A short session: jump, turn, fire, recenter, then pause into the menu,
    /// click around with the laser and back out.
    ///
    pub fn demo() -> Timeline {
        Timeline::new()
            .tap(10, 15, Action::Jump)
            .stick(40, Action::Turn, 0.8, 0.0)
            .stick(55, Action::Turn, 0.0, 0.0)
            .tap(70, 20, Action::PrimaryAttack)
            .tap(100, 2, Action::ResetPosition)
            .tap(120, 2, Action::Pause)
            .pointer(130, OverlayEvent::MouseMove { x: 1008.0, y: 1680.0 })
            .pointer(131, OverlayEvent::MouseButtonDown)
            .pointer(132, OverlayEvent::MouseButtonUp)
            .pointer(133, OverlayEvent::ScrollDiscrete { ydelta: -1.0 })
            .tap(150, 2, Action::MenuDown)
            .tap(170, 2, Action::MenuBack)
            .tap(190, 2, Action::Flashlight)
            .tap(200, 10, Action::Scoreboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_schedules_press_and_release() {
        let timeline = Timeline::new().tap(5, 3, Action::Jump);
        assert_eq!(
            timeline.inputs_at(5),
            vec![ScriptedInput::Digital {
                action: Action::Jump,
                pressed: true
            }]
        );
        assert_eq!(
            timeline.inputs_at(8),
            vec![ScriptedInput::Digital {
                action: Action::Jump,
                pressed: false
            }]
        );
        assert!(timeline.inputs_at(6).is_empty());
        assert_eq!(timeline.last_frame(), 8);
    }

    #[test]
    fn test_demo_fits_default_run() {
        assert!(Timeline::demo().last_frame() < 240);
    }
}
