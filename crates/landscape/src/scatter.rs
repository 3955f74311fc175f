//! Dense small objects scattered over a patch at build time.

use bevy::prelude::*;

use crate::config::TreeScatterConfig;
use crate::patch::PatchGeometry;
use crate::random_stream::RandomStream;
use crate::scene::{SceneInstance, SceneryKind, TemplateId};

/// Declarative placement rule attached to a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterObjectSpec {
    pub kind: SceneryKind,
    pub template: TemplateId,
    /// Placement attempts per build.
    pub count: u32,
    pub min_size: Vec3,
    pub max_size: Vec3,
    /// Use the X size for Z as well.
    pub lock_xz_scale: bool,
    pub min_height: f32,
    pub max_height: f32,
    /// Largest accepted `1 - normal.y`.
    pub max_slope: f32,
}

impl ScatterObjectSpec {
    pub fn trees(config: &TreeScatterConfig, template: TemplateId) -> Self {
        Self {
            kind: SceneryKind::Tree,
            template,
            count: config.count,
            min_size: Vec3::from_array(config.min_size),
            max_size: Vec3::from_array(config.max_size),
            lock_xz_scale: config.lock_xz_scale,
            min_height: config.min_height,
            max_height: config.max_height,
            max_slope: config.max_slope,
        }
    }

    pub fn accepts(&self, elevation: f32, normal: Vec3) -> bool {
        (self.min_height..=self.max_height).contains(&elevation)
            && 1.0 - normal.y <= self.max_slope
    }

    /// Instances for one build of `geometry`.
    ///
    /// Every attempt draws the same six samples whether or not it is
    /// accepted, so the stream position depends only on `count`.
    pub fn place(&self, geometry: &PatchGeometry, rng: &mut RandomStream) -> Vec<SceneInstance> {
        let mut placed = Vec::new();
        for _ in 0..self.count {
            let x = geometry.origin.x + rng.range(0.0, geometry.width);
            let z = geometry.origin.z + rng.range(0.0, geometry.depth);
            let sx = rng.range(self.min_size.x, self.max_size.x);
            let sy = rng.range(self.min_size.y, self.max_size.y);
            let sz = rng.range(self.min_size.z, self.max_size.z);
            let heading = rng.range(0.0, std::f32::consts::TAU);

            let (Some(y), Some(normal)) = (geometry.elevation_at(x, z), geometry.normal_at(x, z))
            else {
                continue;
            };
            if !self.accepts(y, normal) {
                continue;
            }
            let scale = if self.lock_xz_scale {
                Vec3::new(sx, sy, sx)
            } else {
                Vec3::new(sx, sy, sz)
            };
            placed.push(SceneInstance {
                kind: self.kind,
                template: self.template,
                transform: Transform::from_xyz(x, y, z)
                    .with_rotation(Quat::from_rotation_y(heading))
                    .with_scale(scale),
                cast_shadow: true,
                receive_shadow: false,
            });
        }
        placed
    }
}
