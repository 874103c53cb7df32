// Where the menu and HUD overlays sit in tracking space. All positions here
// are in runtime axes (Y up, -Z forward), since overlay transforms are handed
// straight back to the runtime.

use cgmath::{vec3, InnerSpace, Vector3};
use tracing::debug;

use crate::{
    error::SessionError,
    overlay::OverlayQuad,
    pose::{hmd_matrix_to_matrix4, HmdMatrix34},
    runtime::{
        OverlayFlags, OverlayHandle, OverlaySettings, OverlaySystem, TextureBounds,
        TrackingUniverse,
    },
};

pub const MENU_OVERLAY_KEY: &str = "MainMenu";
pub const HUD_OVERLAY_KEY: &str = "HUD";

const MENU_DISTANCE: f32 = 3.0;
const OVERLAY_DROP: f32 = 0.25;
const MENU_HEIGHT: f32 = 1.5;
const MENU_CURVATURE: f32 = 0.15;

/// Size of the host window and of the render target, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuSurface {
    pub in_game: bool,
    pub window: (u32, u32),
    pub render: (u32, u32),
}

impl MenuSurface {
    fn width_ratio(&self) -> f32 {
        self.window.0 as f32 / self.render.0.max(1) as f32
    }

    fn height_ratio(&self) -> f32 {
        self.window.1 as f32 / self.render.1.max(1) as f32
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlacement {
    pub transform: HmdMatrix34,
    pub width: f32,
}

/// HMD forward flattened onto the floor plane
fn level_forward(hmd: &HmdMatrix34) -> Vector3<f32> {
    let forward = vec3(-hmd[0][2], 0.0, -hmd[2][2]);
    if forward.magnitude2() > 0.0 {
        forward.normalize()
    } else {
        vec3(0.0, 0.0, -1.0)
    }
}

///
/// Places an overlay `distance` metres ahead of the HMD, slightly below eye
/// height, turned to face the HMD's yaw. `x_scale` and `y_scale` stretch the
/// overlay's local axes.
///
fn placed_in_front(hmd: &HmdMatrix34, distance: f32, x_scale: f32, y_scale: f32) -> HmdMatrix34 {
    let hmd_position = vec3(hmd[0][3], hmd[1][3], hmd[2][3]);
    let position = hmd_position + level_forward(hmd) * distance;
    let (sin, cos) = hmd[0][2].atan2(hmd[2][2]).sin_cos();

    [
        [x_scale * cos, 0.0, sin, position.x],
        [0.0, y_scale, 0.0, position.y - OVERLAY_DROP],
        [-sin * x_scale, 0.0, cos, position.z],
    ]
}

pub fn menu_overlay_placement(hmd: &HmdMatrix34, surface: &MenuSurface) -> OverlayPlacement {
    OverlayPlacement {
        transform: placed_in_front(
            hmd,
            MENU_DISTANCE,
            surface.width_ratio(),
            surface.height_ratio(),
        ),
        width: MENU_HEIGHT / surface.height_ratio(),
    }
}

pub fn hud_overlay_placement(hmd: &HmdMatrix34, distance: f32, size: f32) -> OverlayPlacement {
    OverlayPlacement {
        transform: placed_in_front(hmd, distance, 1.0, 1.0),
        width: size,
    }
}

///
/// In game the host only draws its menu into the window-sized corner of the
/// render target, so only that part of the texture is shown.
///
pub fn menu_texture_bounds(surface: &MenuSurface) -> (TextureBounds, f32) {
    if surface.in_game {
        let bounds = TextureBounds {
            u_min: 0.0,
            v_min: 0.0,
            u_max: surface.width_ratio(),
            v_max: surface.height_ratio(),
        };
        let texel_aspect = if bounds.u_max > 0.0 {
            bounds.v_max / bounds.u_max
        } else {
            1.0
        };
        (bounds, texel_aspect)
    } else {
        (TextureBounds::FULL, 1.0)
    }
}

pub struct MenuOverlay {
    handle: OverlayHandle,
    placement: Option<OverlayPlacement>,
    /// Height over width of the visible part of the texture
    visible_aspect: f32,
}

impl MenuOverlay {
    pub fn create(
        overlays: &mut dyn OverlaySystem,
        render: (u32, u32),
    ) -> Result<MenuOverlay, SessionError> {
        let settings = OverlaySettings {
            flags: OverlayFlags::SEND_VR_DISCRETE_SCROLL_EVENTS | OverlayFlags::INPUT_METHOD_MOUSE,
            mouse_scale: (render.0 as f32, render.1 as f32),
            curvature: MENU_CURVATURE,
        };
        let handle = overlays.create_overlay(MENU_OVERLAY_KEY, "Main Menu", &settings)?;

        Ok(MenuOverlay {
            handle,
            placement: None,
            visible_aspect: render.1 as f32 / render.0.max(1) as f32,
        })
    }

    pub fn handle(&self) -> OverlayHandle {
        self.handle
    }

    pub fn placement(&self) -> Option<OverlayPlacement> {
        self.placement
    }

    pub fn reposition(
        &mut self,
        overlays: &mut dyn OverlaySystem,
        space: TrackingUniverse,
        hmd: &HmdMatrix34,
        surface: &MenuSurface,
    ) {
        let placement = menu_overlay_placement(hmd, surface);
        overlays.set_overlay_transform_absolute(self.handle, space, &placement.transform);
        overlays.set_overlay_width_in_meters(self.handle, placement.width);
        debug!("menu overlay placed at {:?}", placement);
        self.placement = Some(placement);
    }

    ///
    /// Shows the overlay with the texture bounds for the current surface,
    /// repositioning it first if it was hidden.
    ///
    pub fn present(
        &mut self,
        overlays: &mut dyn OverlaySystem,
        space: TrackingUniverse,
        hmd: &HmdMatrix34,
        surface: &MenuSurface,
    ) {
        if !overlays.is_overlay_visible(self.handle) {
            self.reposition(overlays, space, hmd, surface);
        }

        let (bounds, texel_aspect) = menu_texture_bounds(surface);
        overlays.set_overlay_texel_aspect(self.handle, texel_aspect);
        overlays.set_overlay_texture_bounds(self.handle, bounds);
        overlays.show_overlay(self.handle);

        let visible_width = (bounds.u_max - bounds.u_min) * surface.render.0 as f32;
        let visible_height = (bounds.v_max - bounds.v_min) * surface.render.1 as f32;
        if visible_width > 0.0 {
            self.visible_aspect = visible_height / visible_width;
        }
    }

    pub fn hide(&self, overlays: &mut dyn OverlaySystem) {
        overlays.hide_overlay(self.handle);
    }

    /// The overlay rectangle for laser hit-testing, once it has been placed
    pub fn quad(&self) -> Option<OverlayQuad> {
        self.placement.map(|placement| OverlayQuad {
            transform: hmd_matrix_to_matrix4(&placement.transform),
            width: placement.width,
            height: placement.width * self.visible_aspect,
        })
    }
}

pub struct HudOverlay {
    handle: OverlayHandle,
}

impl HudOverlay {
    pub fn create(overlays: &mut dyn OverlaySystem) -> Result<HudOverlay, SessionError> {
        let settings = OverlaySettings {
            flags: OverlayFlags::empty(),
            mouse_scale: (1.0, 1.0),
            curvature: 0.0,
        };
        let handle = overlays.create_overlay(HUD_OVERLAY_KEY, "HUD", &settings)?;
        Ok(HudOverlay { handle })
    }

    pub fn handle(&self) -> OverlayHandle {
        self.handle
    }

    pub fn show(
        &self,
        overlays: &mut dyn OverlaySystem,
        space: TrackingUniverse,
        hmd: &HmdMatrix34,
        distance: f32,
        size: f32,
        always_visible: bool,
    ) {
        if always_visible || !overlays.is_overlay_visible(self.handle) {
            let placement = hud_overlay_placement(hmd, distance, size);
            overlays.set_overlay_transform_absolute(self.handle, space, &placement.transform);
            overlays.set_overlay_width_in_meters(self.handle, placement.width);
        }
        overlays.show_overlay(self.handle);
    }

    pub fn hide(&self, overlays: &mut dyn OverlaySystem) {
        overlays.hide_overlay(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::assert_close;

    const SURFACE: MenuSurface = MenuSurface {
        in_game: true,
        window: (1920, 1080),
        render: (2160, 2160),
    };

    fn yawed_hmd(degrees: f32, position: [f32; 3]) -> HmdMatrix34 {
        let (s, c) = degrees.to_radians().sin_cos();
        [
            [c, 0.0, s, position[0]],
            [0.0, 1.0, 0.0, position[1]],
            [-s, 0.0, c, position[2]],
        ]
    }

    #[test]
    fn test_menu_sits_three_metres_ahead_and_below() {
        let placement = menu_overlay_placement(&yawed_hmd(0.0, [0.5, 1.7, 0.0]), &SURFACE);
        let m = placement.transform;
        assert_close(m[0][3], 0.5, 1e-5);
        assert_close(m[1][3], 1.45, 1e-5);
        assert_close(m[2][3], -3.0, 1e-5);
        assert_close(m[0][0], 1920.0 / 2160.0, 1e-5);
        assert_close(m[1][1], 1080.0 / 2160.0, 1e-5);
        assert_close(placement.width, 1.5 * 2160.0 / 1080.0, 1e-4);
    }

    #[test]
    fn test_menu_follows_hmd_yaw() {
        let placement = menu_overlay_placement(&yawed_hmd(90.0, [0.0, 0.0, 0.0]), &SURFACE);
        let m = placement.transform;
        // Looking down -X: the overlay lands at -X and faces +X
        assert_close(m[0][3], -3.0, 1e-4);
        assert_close(m[2][3], 0.0, 1e-4);
        assert_close(m[0][2], 1.0, 1e-5);
        assert_close(m[2][2], 0.0, 1e-5);
    }

    #[test]
    fn test_pitch_does_not_move_overlay_vertically() {
        let (s, c) = 30f32.to_radians().sin_cos();
        // Looking up 30 degrees
        let hmd = [[1.0, 0.0, 0.0, 0.0], [0.0, c, -s, 1.0], [0.0, s, c, 0.0]];
        let placement = menu_overlay_placement(&hmd, &SURFACE);
        assert_close(placement.transform[1][3], 0.75, 1e-5);
        assert_close(placement.transform[2][3], -3.0, 1e-4);
    }

    #[test]
    fn test_texture_bounds_in_game() {
        let (bounds, aspect) = menu_texture_bounds(&SURFACE);
        assert_close(bounds.u_max, 1920.0 / 2160.0, 1e-6);
        assert_close(bounds.v_max, 0.5, 1e-6);
        assert_close(aspect, 0.5 / (1920.0 / 2160.0), 1e-5);
    }

    #[test]
    fn test_texture_bounds_zero_width_window() {
        let surface = MenuSurface {
            window: (0, 1080),
            ..SURFACE
        };
        let (bounds, aspect) = menu_texture_bounds(&surface);
        assert_eq!(bounds.u_max, 0.0);
        assert_eq!(aspect, 1.0);
    }

    #[test]
    fn test_texture_bounds_main_menu() {
        let surface = MenuSurface {
            in_game: false,
            ..SURFACE
        };
        assert_eq!(menu_texture_bounds(&surface), (TextureBounds::FULL, 1.0));
    }

    #[test]
    fn test_hud_placement_is_unscaled() {
        let placement = hud_overlay_placement(&yawed_hmd(0.0, [0.0, 1.5, 0.0]), 1.3, 4.0);
        assert_close(placement.transform[0][0], 1.0, 1e-6);
        assert_close(placement.transform[2][3], -1.3, 1e-5);
        assert_close(placement.width, 4.0, 1e-6);
    }
}
