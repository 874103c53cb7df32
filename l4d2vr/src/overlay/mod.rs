// Compositor overlays: the floating menu screen, the optional HUD, and the
// controller laser that drives the host's cursor over the menu.

mod intersection;
mod placement;
mod pointer;

pub use intersection::{OverlayHit, OverlayQuad};
pub use placement::{
    hud_overlay_placement, menu_overlay_placement, menu_texture_bounds, HudOverlay, MenuOverlay,
    MenuSurface, OverlayPlacement, HUD_OVERLAY_KEY, MENU_OVERLAY_KEY,
};
pub use pointer::{
    hover, laser_ray, overlay_to_window, LaserRay, OverlayPointer, PointerUpdate, TIP_COMPONENT,
};
