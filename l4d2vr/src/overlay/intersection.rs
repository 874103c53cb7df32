use cgmath::{vec2, InnerSpace, Matrix4, SquareMatrix, Vector2, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayHit {
    /// Distance from the ray origin, in tracking-space metres
    pub distance: f32,
    /// Texture coordinates of the hit; (0, 0) is the top-left corner
    pub uv: Vector2<f32>,
    pub point: Vector3<f32>,
}

///
/// A flat overlay in tracking space: a `width` x `height` rectangle centred on
/// the origin of `transform`, lying in its local XY plane.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayQuad {
    pub transform: Matrix4<f32>,
    pub width: f32,
    pub height: f32,
}

impl OverlayQuad {
    pub fn intersect(&self, origin: Vector3<f32>, direction: Vector3<f32>) -> Option<OverlayHit> {
        let inverse = self.transform.invert()?;

        // Transform ray into overlay-local space
        let local_origin = (inverse * origin.extend(1.0)).truncate();
        let local_dir = (inverse * direction.extend(0.0)).truncate();

        if local_dir.z.abs() < 1e-8 {
            return None;
        }

        // Same parameter in both spaces, since the transform is affine
        let t = -local_origin.z / local_dir.z;
        if t < 0.0 {
            return None;
        }

        let hit = local_origin + local_dir * t;
        let half_width = self.width * 0.5;
        let half_height = self.height * 0.5;

        if hit.x < -half_width || hit.x > half_width || hit.y < -half_height || hit.y > half_height
        {
            return None;
        }

        Some(OverlayHit {
            distance: (direction * t).magnitude(),
            uv: vec2(
                (hit.x + half_width) / self.width,
                (half_height - hit.y) / self.height,
            ),
            point: origin + direction * t,
        })
    }
}
