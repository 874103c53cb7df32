// A world with nothing in it but a floor at z = 0 and one portal: a plane
// at x = PORTAL_X that sends anything crossing it `PORTAL_OFFSET` along +Y.

use cgmath::{vec3, Matrix4};
use l4d2vr::host::{EntityHandle, HostWorld, Portal, Ray, TraceFilter, TraceMask, TraceResult};

pub const PORTAL_X: f32 = 96.0;
const PORTAL_OFFSET: f32 = 1024.0;

pub struct FlatWorld {
    player: EntityHandle,
}

impl Default for FlatWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatWorld {
    pub fn new() -> FlatWorld {
        FlatWorld {
            player: EntityHandle(1),
        }
    }

    fn portal(&self) -> Portal {
        Portal {
            this_to_linked: Matrix4::from_translation(vec3(0.0, PORTAL_OFFSET, 0.0)),
        }
    }

    /// Fraction along `ray` where it meets the portal plane, if it does
    fn portal_crossing(ray: &Ray) -> Option<f32> {
        if ray.delta.x.abs() < f32::EPSILON {
            return None;
        }
        let fraction = (PORTAL_X - ray.start.x) / ray.delta.x;
        (0.0..=1.0).contains(&fraction).then_some(fraction)
    }
}

impl HostWorld for FlatWorld {
    fn local_player(&self) -> Option<EntityHandle> {
        Some(self.player)
    }

    fn trace_ray(&self, ray: &Ray, _mask: TraceMask, _filter: &TraceFilter) -> TraceResult {
        let floor = if ray.delta.z < 0.0 && ray.start.z >= 0.0 {
            Some(ray.start.z / -ray.delta.z).filter(|f| *f <= 1.0)
        } else {
            None
        };
        let hit = [floor, FlatWorld::portal_crossing(ray)]
            .into_iter()
            .flatten()
            .reduce(f32::min);

        let fraction = hit.unwrap_or(1.0);
        TraceResult {
            end_pos: ray.at(fraction),
            fraction,
            did_hit: hit.is_some(),
        }
    }

    fn first_portal_along_ray(&self, ray: &Ray, max_fraction: f32) -> Option<Portal> {
        FlatWorld::portal_crossing(ray)
            .filter(|f| *f <= max_fraction)
            .map(|_| self.portal())
    }

    fn intersect_ray_with_portal(&self, ray: &Ray, _portal: &Portal) -> f32 {
        FlatWorld::portal_crossing(ray).unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(world: &FlatWorld, ray: &Ray) -> TraceResult {
        world.trace_ray(
            ray,
            TraceMask::SHOT,
            &TraceFilter::skip_characters(EntityHandle(1)),
        )
    }

    #[test]
    fn test_downward_ray_hits_floor() {
        let world = FlatWorld::new();
        let result = trace(&world, &Ray::between(vec3(0.0, 0.0, 64.0), vec3(0.0, 0.0, -64.0)));
        assert!(result.did_hit);
        assert_eq!(result.fraction, 0.5);
        assert_eq!(result.end_pos, vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_level_ray_stops_at_portal() {
        let world = FlatWorld::new();
        let ray = Ray::between(vec3(0.0, 0.0, 64.0), vec3(192.0, 0.0, 64.0));
        let result = trace(&world, &ray);
        assert!(result.did_hit);
        assert_eq!(result.fraction, 0.5);
        assert!(world.first_portal_along_ray(&ray, 0.51).is_some());
        assert!(world.first_portal_along_ray(&ray, 0.4).is_none());
    }

    #[test]
    fn test_short_ray_misses_everything() {
        let world = FlatWorld::new();
        let result = trace(&world, &Ray::between(vec3(0.0, 0.0, 64.0), vec3(10.0, 0.0, 64.0)));
        assert!(!result.did_hit);
        assert_eq!(result.end_pos, vec3(10.0, 0.0, 64.0));
    }

    #[test]
    fn test_default_world_has_local_player() {
        assert_eq!(FlatWorld::default().local_player(), Some(EntityHandle(1)));
    }
}
