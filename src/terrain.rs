// ==============================================================================
// terrain.rs — READ-ONLY GROUND SAMPLING
// ------------------------------------------------------------------------------
// The vehicle never owns terrain; it borrows a `&dyn TerrainQuery` for each
// step and samples it many times per tick (4 wheels + 8 hull corners).
//
//   height_at(x, z)   world Y of the surface
//   normal_at(x, z)   unit, upward-facing surface normal
//   surface_at(x, z)  material (friction multiplier)
//
// Implementations:
//   FlatTerrain        constant height
//   SlopeTerrain       analytic tilted plane
//   HeightFieldTerrain parry height field (via rapier3d), sampled by raycast
// ==============================================================================

use rapier3d::na::{DMatrix, Point3, Vector3};
use rapier3d::parry::query::{Ray, RayCast};
use rapier3d::parry::shape::HeightField;
use serde::{Deserialize, Serialize};

use crate::math::{safe_normalize, Vec3, WORLD_UP};

/// Ground material under a contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub friction: f32,  // multiplies tire grip (1 = tarmac)
}

impl Default for Surface {
    fn default() -> Self { Self { friction: 1.0 } }
}

pub trait TerrainQuery {
    fn height_at(&self, x: f32, z: f32) -> f32;

    /// Central-difference normal; implementations with an analytic normal
    /// should override.
    fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        const H: f32 = 0.1;
        let ddx = (self.height_at(x + H, z) - self.height_at(x - H, z)) / (2.0 * H);
        let ddz = (self.height_at(x, z + H) - self.height_at(x, z - H)) / (2.0 * H);
        safe_normalize(Vec3::new(-ddx, 1.0, -ddz), WORLD_UP)
    }

    fn surface_at(&self, _x: f32, _z: f32) -> Surface {
        Surface::default()
    }
}

// ============================================
// ----- flat ---------------------------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub height: f32,
    pub surface: Surface,
}

impl FlatTerrain {
    pub fn new(height: f32) -> Self {
        Self { height, surface: Surface::default() }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.surface.friction = friction;
        self
    }
}

impl Default for FlatTerrain {
    fn default() -> Self { Self::new(0.0) }
}

impl TerrainQuery for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> f32 { self.height }
    fn normal_at(&self, _x: f32, _z: f32) -> Vec3 { WORLD_UP }
    fn surface_at(&self, _x: f32, _z: f32) -> Surface { self.surface }
}

// ============================================
// ----- slope --------------------------------
// ============================================

/// Infinite plane `y = base + gx·x + gz·z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeTerrain {
    pub base: f32,
    pub gradient_x: f32,    // dh/dx
    pub gradient_z: f32,    // dh/dz
    pub surface: Surface,
}

impl SlopeTerrain {
    pub fn new(base: f32, gradient_x: f32, gradient_z: f32) -> Self {
        Self { base, gradient_x, gradient_z, surface: Surface::default() }
    }

    /// Plane rising along +Z at `angle` radians.
    pub fn incline_z(angle: f32) -> Self {
        Self::new(0.0, 0.0, angle.tan())
    }
}

impl TerrainQuery for SlopeTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.base + self.gradient_x * x + self.gradient_z * z
    }

    fn normal_at(&self, _x: f32, _z: f32) -> Vec3 {
        safe_normalize(Vec3::new(-self.gradient_x, 1.0, -self.gradient_z), WORLD_UP)
    }

    fn surface_at(&self, _x: f32, _z: f32) -> Surface { self.surface }
}

// ============================================
// ----- height field -------------------------
// ============================================

/// Regular grid terrain backed by parry's triangulated `HeightField`.
///
/// Heights are row-major: `nx` columns along X, `nz` rows along Z, vertex
/// `(col, row)` sits at `origin + (col·cell, h, row·cell)`. Queries outside
/// the grid clamp to its border.
#[derive(Clone)]
pub struct HeightFieldTerrain {
    shape: HeightField,
    center: Vec3,       // world position of the shape's local origin
    half_x: f32,
    half_z: f32,
    min_y: f32,
    max_y: f32,
    cell: f32,
    pub surface: Surface,
}

impl HeightFieldTerrain {
    /// Returns `None` when the grid is smaller than 2×2, `heights.len()`
    /// does not match, or any value is non-finite.
    pub fn new(origin: Vec3, nx: usize, nz: usize, cell: f32, heights: &[f32]) -> Option<Self> {
        if nx < 2 || nz < 2 || heights.len() != nx * nz || !(cell > 0.0) {
            return None;
        }
        if heights.iter().any(|h| !h.is_finite()) {
            return None;
        }

        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for &h in heights {
            min_y = min_y.min(h);
            max_y = max_y.max(h);
        }

        let size_x = cell * (nx - 1) as f32;
        let size_z = cell * (nz - 1) as f32;
        let matrix = DMatrix::from_fn(nz, nx, |row, col| heights[row * nx + col]);
        let shape = HeightField::new(matrix, Vector3::new(size_x, 1.0, size_z));

        Some(Self {
            shape,
            center: origin + Vec3::new(size_x * 0.5, 0.0, size_z * 0.5),
            half_x: size_x * 0.5,
            half_z: size_z * 0.5,
            min_y,
            max_y,
            cell,
            surface: Surface::default(),
        })
    }

    /// Build from a height function sampled at every grid vertex.
    pub fn from_fn(
        origin: Vec3,
        nx: usize,
        nz: usize,
        cell: f32,
        mut f: impl FnMut(f32, f32) -> f32,
    ) -> Option<Self> {
        let mut heights = Vec::with_capacity(nx * nz);
        for row in 0..nz {
            for col in 0..nx {
                heights.push(f(origin.x + col as f32 * cell, origin.z + row as f32 * cell));
            }
        }
        Self::new(origin, nx, nz, cell, &heights)
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.surface.friction = friction;
        self
    }

    fn local_height(&self, lx: f32, lz: f32) -> Option<f32> {
        let top = self.max_y + 1.0;
        let ray = Ray::new(Point3::new(lx, top, lz), Vector3::new(0.0, -1.0, 0.0));
        let max_toi = self.max_y - self.min_y + 2.0;
        self.shape
            .cast_local_ray(&ray, max_toi, true)
            .map(|toi| top - toi)
    }
}

impl TerrainQuery for HeightFieldTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        // stay just inside the border so the ray always lands on a triangle
        let lx = (x - self.center.x).clamp(-self.half_x + 1e-4, self.half_x - 1e-4);
        let lz = (z - self.center.z).clamp(-self.half_z + 1e-4, self.half_z - 1e-4);
        match self.local_height(lx, lz) {
            Some(h) => self.center.y + h,
            None => {
                log::trace!("height field ray missed at ({x}, {z})");
                self.center.y + self.min_y
            }
        }
    }

    fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let h = self.cell;
        let ddx = (self.height_at(x + h, z) - self.height_at(x - h, z)) / (2.0 * h);
        let ddz = (self.height_at(x, z + h) - self.height_at(x, z - h)) / (2.0 * h);
        safe_normalize(Vec3::new(-ddx, 1.0, -ddz), WORLD_UP)
    }

    fn surface_at(&self, _x: f32, _z: f32) -> Surface { self.surface }
}

impl std::fmt::Debug for HeightFieldTerrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightFieldTerrain")
            .field("center", &self.center)
            .field("half_x", &self.half_x)
            .field("half_z", &self.half_z)
            .field("cell", &self.cell)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_normal_is_unit_and_upward() {
        let slope = SlopeTerrain::incline_z(0.2);
        let n = slope.normal_at(3.0, -7.0);
        assert!((n.norm() - 1.0).abs() < 1e-6);
        assert!(n.y > 0.0);
        // climbing +Z: normal leans back toward -Z
        assert!(n.z < 0.0);
        assert!((slope.height_at(0.0, 10.0) - 10.0 * 0.2f32.tan()).abs() < 1e-5);
    }

    #[test]
    fn default_normal_matches_analytic_on_a_plane() {
        struct Plane;
        impl TerrainQuery for Plane {
            fn height_at(&self, x: f32, _z: f32) -> f32 { 0.5 * x }
        }
        let n = Plane.normal_at(1.0, 1.0);
        let expected = Vec3::new(-0.5, 1.0, 0.0).normalize();
        assert!((n - expected).norm() < 1e-4);
    }

    #[test]
    fn flat_height_field_returns_its_height() {
        let hf = HeightFieldTerrain::new(Vec3::new(-10.0, 2.0, -10.0), 5, 5, 5.0, &[1.5; 25])
            .expect("valid grid");
        for (x, z) in [(0.0, 0.0), (-9.0, 9.0), (3.3, -4.1)] {
            assert!((hf.height_at(x, z) - 3.5).abs() < 1e-4, "at ({x}, {z})");
            assert!((hf.normal_at(x, z) - WORLD_UP).norm() < 1e-4);
        }
    }

    #[test]
    fn tilted_height_field_interpolates_between_vertices() {
        // a plane is reproduced exactly by any triangulation
        let hf = HeightFieldTerrain::from_fn(Vec3::zeros(), 9, 9, 1.0, |x, z| 0.25 * x + 0.1 * z)
            .expect("valid grid");

        for (x, z) in [(2.0, 2.0), (2.5, 3.5), (4.25, 6.75)] {
            let expect = 0.25 * x + 0.1 * z;
            assert!((hf.height_at(x, z) - expect).abs() < 1e-3, "at ({x}, {z})");
        }

        let n = hf.normal_at(4.0, 4.0);
        let expected = Vec3::new(-0.25, 1.0, -0.1).normalize();
        assert!((n - expected).norm() < 1e-3);
    }

    #[test]
    fn height_field_clamps_outside_the_grid() {
        let hf = HeightFieldTerrain::from_fn(Vec3::zeros(), 3, 3, 1.0, |x, _| x).expect("valid grid");
        assert!((hf.height_at(50.0, 1.0) - 2.0).abs() < 1e-3);
        assert!(hf.height_at(-50.0, 1.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_grids_are_rejected() {
        assert!(HeightFieldTerrain::new(Vec3::zeros(), 1, 4, 1.0, &[0.0; 4]).is_none());
        assert!(HeightFieldTerrain::new(Vec3::zeros(), 2, 2, 1.0, &[0.0; 3]).is_none());
        assert!(HeightFieldTerrain::new(Vec3::zeros(), 2, 2, 1.0, &[0.0, f32::NAN, 0.0, 0.0]).is_none());
    }
}
