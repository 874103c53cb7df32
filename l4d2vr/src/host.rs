// The host application: input injection and world queries.

use bitflags::bitflags;
use cgmath::{Matrix4, Vector3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    Return,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
}

pub trait HostInput {
    /// Runs a console command, bypassing the host's command restrictions
    fn client_cmd_unrestricted(&mut self, command: &str);
    fn send_key(&mut self, key: VirtualKey, action: KeyAction);
    fn send_mouse_button(&mut self, button: MouseButton, down: bool);
    /// Window client coordinates, origin top-left
    fn set_cursor_pos(&mut self, x: i32, y: i32);
    fn mouse_wheeled(&mut self, delta: i32);
    fn window_size(&self) -> (u32, u32);
    fn is_in_game(&self) -> bool;
    fn is_cursor_visible(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub start: Vector3<f32>,
    pub delta: Vector3<f32>,
}

impl Ray {
    pub fn between(start: Vector3<f32>, end: Vector3<f32>) -> Ray {
        Ray {
            start,
            delta: end - start,
        }
    }

    pub fn at(&self, fraction: f32) -> Vector3<f32> {
        self.start + self.delta * fraction
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceResult {
    pub end_pos: Vector3<f32>,
    pub fraction: f32,
    pub did_hit: bool,
}

bitflags! {
    pub struct TraceMask: u32 {
        const SOLID = 0x1;
        const WINDOW = 0x2;
        const GRATE = 0x8;
        const MOVEABLE = 0x4000;
        const MONSTER = 0x2000000;
        const DEBRIS = 0x4000000;
        const HITBOX = 0x40000000;

        const SHOT = Self::SOLID.bits
            | Self::MOVEABLE.bits
            | Self::MONSTER.bits
            | Self::WINDOW.bits
            | Self::DEBRIS.bits
            | Self::HITBOX.bits;
        const SHOT_HULL = Self::SOLID.bits
            | Self::MOVEABLE.bits
            | Self::MONSTER.bits
            | Self::WINDOW.bits
            | Self::DEBRIS.bits
            | Self::GRATE.bits;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceFilter {
    pub skip: EntityHandle,
    pub ignore_npcs: bool,
    pub ignore_players: bool,
}

impl TraceFilter {
    /// Skips `skip` and every NPC and player
    pub fn skip_characters(skip: EntityHandle) -> TraceFilter {
        TraceFilter {
            skip,
            ignore_npcs: true,
            ignore_players: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Portal {
    /// Maps points on this side of the portal to the linked side
    pub this_to_linked: Matrix4<f32>,
}

pub trait HostWorld {
    fn local_player(&self) -> Option<EntityHandle>;
    fn trace_ray(&self, ray: &Ray, mask: TraceMask, filter: &TraceFilter) -> TraceResult;
    fn first_portal_along_ray(&self, ray: &Ray, max_fraction: f32) -> Option<Portal>;
    /// Fraction along `ray` where it crosses the portal plane
    fn intersect_ray_with_portal(&self, ray: &Ray, portal: &Portal) -> f32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    #[test]
    fn test_shot_masks() {
        assert_eq!(TraceMask::SHOT.bits(), 0x46004003);
        assert_eq!(TraceMask::SHOT_HULL.bits(), 0x600400b);
        assert!(!TraceMask::SHOT.contains(TraceMask::GRATE));
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::between(vec3(1.0, 0.0, 0.0), vec3(3.0, 4.0, 0.0));
        assert_eq!(ray.at(0.5), vec3(2.0, 2.0, 0.0));
    }
}
