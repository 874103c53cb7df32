use tracing::trace;

pub const SMOOTH_TURN_DEADZONE: f32 = 0.2;
pub const SNAP_TURN_THRESHOLD: f32 = 0.5;
pub const SNAP_TURN_RELEASE: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Pressed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurnMode {
    Smooth {
        /// Degrees per millisecond at full deflection
        degrees_per_ms: f32,
    },
    Snap {
        angle: f32,
    },
}

///
/// Converts the turn axis into a yaw delta, once per frame.
///
/// Pushing the stick right (positive x) turns the view right, which is a
/// negative yaw delta in host axes.
///
#[derive(Clone, Debug)]
pub struct TurnController {
    state: TurnState,
}

impl Default for TurnController {
    fn default() -> Self {
        TurnController::new()
    }
}

impl TurnController {
    pub fn new() -> TurnController {
        TurnController {
            state: TurnState::Idle,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn update(&mut self, axis_x: f32, delta_ms: f32, mode: TurnMode) -> f32 {
        let delta = match mode {
            TurnMode::Smooth { degrees_per_ms } => {
                // Smooth turning has no notion of a held stick
                self.state = TurnState::Idle;
                smooth_turn_delta(axis_x, delta_ms, degrees_per_ms)
            }
            TurnMode::Snap { angle } => self.snap_turn_delta(axis_x, angle),
        };

        if delta != 0.0 {
            trace!("turn delta: {delta}");
        }
        delta
    }

    fn snap_turn_delta(&mut self, axis_x: f32, angle: f32) -> f32 {
        match self.state {
            TurnState::Idle if axis_x > SNAP_TURN_THRESHOLD => {
                self.state = TurnState::Pressed;
                -angle
            }
            TurnState::Idle if axis_x < -SNAP_TURN_THRESHOLD => {
                self.state = TurnState::Pressed;
                angle
            }
            _ => {
                if axis_x.abs() < SNAP_TURN_RELEASE {
                    self.state = TurnState::Idle;
                }
                0.0
            }
        }
    }
}

fn smooth_turn_delta(axis_x: f32, delta_ms: f32, degrees_per_ms: f32) -> f32 {
    let normalized = (axis_x.abs() - SMOOTH_TURN_DEADZONE) / (1.0 - SMOOTH_TURN_DEADZONE);

    if axis_x > SMOOTH_TURN_DEADZONE {
        -degrees_per_ms * delta_ms * normalized
    } else if axis_x < -SMOOTH_TURN_DEADZONE {
        degrees_per_ms * delta_ms * normalized
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::assert_close;

    const SNAP: TurnMode = TurnMode::Snap { angle: 45.0 };
    const SMOOTH: TurnMode = TurnMode::Smooth {
        degrees_per_ms: 0.15,
    };

    #[test]
    fn test_snap_fires_once_per_press() {
        let mut turn = TurnController::new();
        let trace = [0.0, 0.2, 0.4, 0.55, 0.6, 0.6, 0.6, 0.45, 0.35, 0.1];
        let fired: Vec<f32> = trace
            .iter()
            .map(|x| turn.update(*x, 11.0, SNAP))
            .filter(|d| *d != 0.0)
            .collect();

        assert_eq!(fired, vec![-45.0]);
        assert_eq!(turn.state(), TurnState::Idle);
    }

    #[test]
    fn test_snap_hysteresis_band() {
        let mut turn = TurnController::new();
        assert_eq!(turn.update(-0.7, 11.0, SNAP), 45.0);
        // Dropping into the band between release and threshold keeps it pressed
        assert_eq!(turn.update(-0.4, 11.0, SNAP), 0.0);
        assert_eq!(turn.update(-0.6, 11.0, SNAP), 0.0);
        assert_eq!(turn.state(), TurnState::Pressed);
        assert_eq!(turn.update(-0.29, 11.0, SNAP), 0.0);
        assert_eq!(turn.state(), TurnState::Idle);
        assert_eq!(turn.update(-0.6, 11.0, SNAP), 45.0);
    }

    #[test]
    fn test_smooth_deadzone_boundary_is_zero() {
        let mut turn = TurnController::new();
        assert_eq!(turn.update(0.2, 16.0, SMOOTH), 0.0);
        assert_eq!(turn.update(-0.2, 16.0, SMOOTH), 0.0);
        assert_eq!(turn.update(0.05, 16.0, SMOOTH), 0.0);
    }

    #[test]
    fn test_smooth_full_deflection_uses_full_rate() {
        let mut turn = TurnController::new();
        assert_close(turn.update(1.0, 16.0, SMOOTH), -0.15 * 16.0, 1e-5);
        assert_close(turn.update(-1.0, 10.0, SMOOTH), 0.15 * 10.0, 1e-5);
    }

    #[test]
    fn test_smooth_is_renormalized() {
        let mut turn = TurnController::new();
        // Halfway between the deadzone and full deflection
        assert_close(turn.update(0.6, 10.0, SMOOTH), -0.15 * 10.0 * 0.5, 1e-5);
    }
}
