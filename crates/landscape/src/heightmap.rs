//! Heightmap sampling.
//!
//! Elevation is FBm OpenSimplex2 noise evaluated in noise space
//! (`(world + offset) / scale`) and stretched by `height`. Normals come from
//! central finite differences, so every field that implements
//! [`ElevationField`] gets consistent normals for free.

use bevy::prelude::*;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

/// Half-width of the finite-difference stencil used for normals.
pub const NORMAL_SAMPLE_OFFSET: f32 = 0.1;

const NOISE_OCTAVES: i32 = 4;
const NOISE_GAIN: f32 = 0.5;
const NOISE_LACUNARITY: f32 = 2.0;

/// A pure elevation function over the XZ plane.
pub trait ElevationField: Send + Sync + 'static {
    fn elevation(&self, x: f32, z: f32) -> f32;

    /// Unit surface normal from the cross product of the Z and X tangents.
    fn normal(&self, x: f32, z: f32) -> Vec3 {
        let e = NORMAL_SAMPLE_OFFSET;
        let dx = self.elevation(x + e, z) - self.elevation(x - e, z);
        let dz = self.elevation(x, z + e) - self.elevation(x, z - e);
        let tangent_x = Vec3::new(2.0 * e, dx, 0.0);
        let tangent_z = Vec3::new(0.0, dz, 2.0 * e);
        tangent_z.cross(tangent_x).normalize_or(Vec3::Y)
    }
}

/// Noise parameters shared by every patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightmapConfig {
    pub noise_offset: Vec2,
    /// Amplitude in world units.
    pub height: f32,
    /// Horizontal world units per noise unit.
    pub scale: f32,
    pub seed: i32,
}

/// The noise-backed elevation field.
pub struct Heightmap {
    config: HeightmapConfig,
    noise: FastNoiseLite,
}

impl Heightmap {
    pub fn new(config: HeightmapConfig) -> Self {
        let mut noise = FastNoiseLite::with_seed(config.seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(1.0));
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(NOISE_OCTAVES));
        noise.set_fractal_gain(Some(NOISE_GAIN));
        noise.set_fractal_lacunarity(Some(NOISE_LACUNARITY));
        Self { config, noise }
    }

    pub fn config(&self) -> &HeightmapConfig {
        &self.config
    }
}

impl ElevationField for Heightmap {
    fn elevation(&self, x: f32, z: f32) -> f32 {
        let nx = (x + self.config.noise_offset.x) / self.config.scale;
        let nz = (z + self.config.noise_offset.y) / self.config.scale;
        self.noise.get_noise_2d(nx, nz) * self.config.height
    }
}

/// A flat or tilted plane, `y = base + slope_x * x + slope_z * z`.
///
/// Useful wherever a predictable surface is needed, such as tests and
/// benchmarks that must not depend on noise output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneField {
    pub base: f32,
    pub slope_x: f32,
    pub slope_z: f32,
}

impl PlaneField {
    pub fn flat(base: f32) -> Self {
        Self {
            base,
            slope_x: 0.0,
            slope_z: 0.0,
        }
    }
}

impl ElevationField for PlaneField {
    fn elevation(&self, x: f32, z: f32) -> f32 {
        self.base + self.slope_x * x + self.slope_z * z
    }
}
