// Ray queries against the host world: where the weapon is pointing, and where
// the eye ends up when the camera looks through a portal.

use cgmath::{Matrix3, Point3, Transform, Vector3};
use tracing::trace;

use crate::{
    host::{EntityHandle, HostWorld, Portal, Ray, TraceFilter, TraceMask},
    math::{angle_matrix, matrix_angles, Angles},
};

/// Longest trace the host accepts, in world units
pub const MAX_TRACE_LENGTH: f32 = 56755.84;

/// Extra fraction searched past the trace end for a portal surface
const PORTAL_SEARCH_SLACK: f32 = 0.01;

pub fn trace_aim<W: HostWorld + ?Sized>(
    world: &W,
    player: EntityHandle,
    start: Vector3<f32>,
    forward: Vector3<f32>,
) -> Vector3<f32> {
    let ray = Ray::between(start, start + forward * MAX_TRACE_LENGTH);
    let result = world.trace_ray(
        &ray,
        TraceMask::SHOT | TraceMask::SHOT_HULL,
        &TraceFilter::skip_characters(player),
    );
    result.end_pos
}

fn portal_rotation(portal: &Portal) -> Matrix3<f32> {
    let m = &portal.this_to_linked;
    Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate())
}

/// Orientation as seen from the linked side of `portal`
pub fn angles_through_portal(portal: &Portal, angles: Angles) -> Angles {
    matrix_angles(&(portal_rotation(portal) * angle_matrix(angles)))
}

///
/// Moves the eye through a portal sitting between the camera and the eye.
/// Returns the eye unchanged when the trace is clear or no portal is found.
///
pub fn trace_eye<W: HostWorld + ?Sized>(
    world: &W,
    player: EntityHandle,
    camera_pos: Vector3<f32>,
    eye_pos: Vector3<f32>,
    eye_angles: Angles,
) -> (Vector3<f32>, Angles) {
    let ray = Ray::between(camera_pos, eye_pos);
    let result = world.trace_ray(
        &ray,
        TraceMask::SHOT | TraceMask::SHOT_HULL,
        &TraceFilter::skip_characters(player),
    );

    let portal = match world.first_portal_along_ray(&ray, result.fraction + PORTAL_SEARCH_SLACK) {
        Some(portal) if result.did_hit => portal,
        _ => return (eye_pos, eye_angles),
    };

    let fraction = world.intersect_ray_with_portal(&ray, &portal);
    let hit = ray.at(fraction);
    let linked = portal.this_to_linked.transform_point(Point3::new(hit.x, hit.y, hit.z));
    trace!("eye passes through portal at {:?}", hit);

    (
        Vector3::new(linked.x, linked.y, linked.z),
        angles_through_portal(&portal, eye_angles),
    )
}
