//! Terrain patches: fixed-size tiles of sampled geometry.
//!
//! A patch is addressed by its grid column and absolute row index; its world
//! origin is computed from those integers so repeated relocation never
//! accumulates floating-point error. Geometry is built whole into a fresh
//! `Arc<PatchGeometry>` and only then swapped in, so anything holding the
//! previous `Arc` keeps a complete, consistent grid.

use std::sync::Arc;

use bevy::prelude::*;

use crate::config::LandscapeConfig;
use crate::heightmap::ElevationField;
use crate::random_stream::{patch_seed, RandomStream};
use crate::scatter::ScatterObjectSpec;
use crate::scene::{InstanceHandle, SceneGraph};

/// Stable identity of a patch for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(pub u32);

/// A surface point: world position plus unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Dimensions shared by every patch of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchLayout {
    pub offset_x: f32,
    pub offset_z: f32,
    pub width: f32,
    pub depth: f32,
    pub segments: u32,
    pub sample_spacing: f32,
}

impl PatchLayout {
    pub fn from_config(config: &LandscapeConfig) -> Self {
        Self {
            offset_x: config.grid_offset_x(),
            offset_z: config.grid_offset_z,
            width: config.patch_width,
            depth: config.patch_depth,
            segments: config.patch_segments,
            sample_spacing: config.coarse_sample_spacing,
        }
    }

    /// World origin (minimum X/Z corner) of the patch at `(column, row_index)`.
    pub fn origin(&self, column: usize, row_index: i64) -> Vec3 {
        Vec3::new(
            self.offset_x + column as f32 * self.width,
            0.0,
            self.offset_z + row_index as f32 * self.depth,
        )
    }
}

/// Regular vertex grid with elevation and normal per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchGeometry {
    pub origin: Vec3,
    pub width: f32,
    pub depth: f32,
    pub segments: u32,
    /// Row-major, `(segments + 1)^2` entries, Z rows of X vertices.
    pub heights: Vec<f32>,
    pub normals: Vec<Vec3>,
}

impl PatchGeometry {
    pub fn build(
        layout: &PatchLayout,
        column: usize,
        row_index: i64,
        field: &dyn ElevationField,
    ) -> Self {
        let origin = layout.origin(column, row_index);
        let side = layout.segments as usize + 1;
        let step_x = layout.width / layout.segments as f32;
        let step_z = layout.depth / layout.segments as f32;

        let mut heights = Vec::with_capacity(side * side);
        let mut normals = Vec::with_capacity(side * side);
        for iz in 0..side {
            let z = origin.z + iz as f32 * step_z;
            for ix in 0..side {
                let x = origin.x + ix as f32 * step_x;
                heights.push(field.elevation(x, z));
                normals.push(field.normal(x, z));
            }
        }

        Self {
            origin,
            width: layout.width,
            depth: layout.depth,
            segments: layout.segments,
            heights,
            normals,
        }
    }

    pub fn side(&self) -> usize {
        self.segments as usize + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.heights.len()
    }

    /// World position of vertex `(ix, iz)`.
    pub fn vertex(&self, ix: usize, iz: usize) -> Vec3 {
        let step_x = self.width / self.segments as f32;
        let step_z = self.depth / self.segments as f32;
        Vec3::new(
            self.origin.x + ix as f32 * step_x,
            self.heights[iz * self.side() + ix],
            self.origin.z + iz as f32 * step_z,
        )
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.origin.x
            && x < self.origin.x + self.width
            && z >= self.origin.z
            && z < self.origin.z + self.depth
    }

    /// Cell indices and fractional offsets of `(x, z)`, if inside.
    fn cell(&self, x: f32, z: f32) -> Option<(usize, usize, f32, f32)> {
        if !self.contains(x, z) {
            return None;
        }
        let last = self.segments as usize - 1;
        let fx = (x - self.origin.x) / self.width * self.segments as f32;
        let fz = (z - self.origin.z) / self.depth * self.segments as f32;
        let ix = (fx.floor() as usize).min(last);
        let iz = (fz.floor() as usize).min(last);
        Some((ix, iz, fx - ix as f32, fz - iz as f32))
    }

    pub fn elevation_at(&self, x: f32, z: f32) -> Option<f32> {
        let (ix, iz, tx, tz) = self.cell(x, z)?;
        let side = self.side();
        let h = |ix: usize, iz: usize| self.heights[iz * side + ix];
        let near = h(ix, iz) + (h(ix + 1, iz) - h(ix, iz)) * tx;
        let far = h(ix, iz + 1) + (h(ix + 1, iz + 1) - h(ix, iz + 1)) * tx;
        Some(near + (far - near) * tz)
    }

    pub fn normal_at(&self, x: f32, z: f32) -> Option<Vec3> {
        let (ix, iz, tx, tz) = self.cell(x, z)?;
        let side = self.side();
        let n = |ix: usize, iz: usize| self.normals[iz * side + ix];
        let near = n(ix, iz).lerp(n(ix + 1, iz), tx);
        let far = n(ix, iz + 1).lerp(n(ix + 1, iz + 1), tx);
        Some(near.lerp(far, tz).normalize_or(Vec3::Y))
    }
}

/// One tile of the landscape, reused for the whole session.
pub struct TerrainPatch {
    id: PatchId,
    column: usize,
    row_index: i64,
    layout: PatchLayout,
    world_seed: u64,
    field: Arc<dyn ElevationField>,
    geometry: Arc<PatchGeometry>,
    scatter: Vec<ScatterObjectSpec>,
    scatter_instances: Vec<InstanceHandle>,
    rebuilds: u32,
}

impl TerrainPatch {
    /// Create the patch and run its first build.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PatchId,
        layout: PatchLayout,
        column: usize,
        row_index: i64,
        world_seed: u64,
        field: Arc<dyn ElevationField>,
        scatter: Vec<ScatterObjectSpec>,
        scene: &mut dyn SceneGraph,
    ) -> Self {
        let geometry = Arc::new(PatchGeometry::build(&layout, column, row_index, field.as_ref()));
        let mut patch = Self {
            id,
            column,
            row_index,
            layout,
            world_seed,
            field,
            geometry,
            scatter,
            scatter_instances: Vec::new(),
            rebuilds: 0,
        };
        patch.publish(scene);
        patch
    }

    pub fn id(&self) -> PatchId {
        self.id
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn row_index(&self) -> i64 {
        self.row_index
    }

    pub fn origin(&self) -> Vec3 {
        self.geometry.origin
    }

    pub fn width(&self) -> f32 {
        self.layout.width
    }

    pub fn depth(&self) -> f32 {
        self.layout.depth
    }

    pub fn geometry(&self) -> &Arc<PatchGeometry> {
        &self.geometry
    }

    pub fn scatter_instances(&self) -> &[InstanceHandle] {
        &self.scatter_instances
    }

    /// Number of completed builds, including the initial one.
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    /// Move the patch to `row_index` and regenerate it there.
    pub fn rebuild(&mut self, row_index: i64, scene: &mut dyn SceneGraph) {
        let geometry = PatchGeometry::build(&self.layout, self.column, row_index, self.field.as_ref());
        self.row_index = row_index;
        self.geometry = Arc::new(geometry);
        self.publish(scene);
    }

    /// Replace scatter instances for the current geometry and announce it.
    fn publish(&mut self, scene: &mut dyn SceneGraph) {
        for handle in self.scatter_instances.drain(..) {
            scene.remove(handle);
        }
        let mut rng = RandomStream::new(patch_seed(self.world_seed, self.column, self.row_index));
        for spec in &self.scatter {
            for instance in spec.place(&self.geometry, &mut rng) {
                self.scatter_instances.push(scene.instantiate(instance));
            }
        }
        self.rebuilds += 1;
        scene.patch_rebuilt(self.id, Arc::clone(&self.geometry));
    }

    pub fn contains_world_position(&self, p: Vec3) -> bool {
        self.geometry.contains(p.x, p.z)
    }

    pub fn elevation(&self, p: Vec3) -> Option<f32> {
        self.geometry.elevation_at(p.x, p.z)
    }

    pub fn normal(&self, p: Vec3) -> Option<Vec3> {
        self.geometry.normal_at(p.x, p.z)
    }

    /// `p` snapped onto the surface.
    pub fn surface_position(&self, p: Vec3) -> Option<Vec3> {
        self.elevation(p).map(|y| Vec3::new(p.x, y, p.z))
    }

    pub fn surface_point(&self, p: Vec3) -> Option<SampledPoint> {
        Some(SampledPoint {
            position: self.surface_position(p)?,
            normal: self.normal(p)?,
        })
    }

    /// Reduced-resolution samples over the footprint, taken straight from
    /// the field at cell centres of a `sample_spacing` lattice.
    pub fn coarse_samples(&self) -> impl Iterator<Item = SampledPoint> + Clone + '_ {
        let field = self.field.as_ref();
        let origin = self.geometry.origin;
        let nx = ((self.layout.width / self.layout.sample_spacing).floor() as usize).max(1);
        let nz = ((self.layout.depth / self.layout.sample_spacing).floor() as usize).max(1);
        let step_x = self.layout.width / nx as f32;
        let step_z = self.layout.depth / nz as f32;
        (0..nz).flat_map(move |iz| {
            (0..nx).map(move |ix| {
                let x = origin.x + (ix as f32 + 0.5) * step_x;
                let z = origin.z + (iz as f32 + 0.5) * step_z;
                SampledPoint {
                    position: Vec3::new(x, field.elevation(x, z), z),
                    normal: field.normal(x, z),
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeScatterConfig;
    use crate::heightmap::PlaneField;
    use crate::scene::{SceneChange, SceneLedger, SceneryKind, TemplateId};

    fn layout() -> PatchLayout {
        PatchLayout {
            offset_x: -192.0,
            offset_z: -128.0,
            width: 64.0,
            depth: 64.0,
            segments: 16,
            sample_spacing: 8.0,
        }
    }

    fn ramp() -> Arc<dyn ElevationField> {
        Arc::new(PlaneField {
            base: 2.0,
            slope_x: 0.25,
            slope_z: -0.1,
        })
    }

    fn bare_patch(scene: &mut SceneLedger) -> TerrainPatch {
        TerrainPatch::new(PatchId(0), layout(), 1, 0, 42, ramp(), Vec::new(), scene)
    }

    #[test]
    fn test_origin_from_indices() {
        let l = layout();
        assert_eq!(l.origin(0, 0), Vec3::new(-192.0, 0.0, -128.0));
        assert_eq!(l.origin(5, 12), Vec3::new(128.0, 0.0, 640.0));
    }

    #[test]
    fn test_geometry_vertex_grid() {
        let geometry = PatchGeometry::build(&layout(), 0, 0, ramp().as_ref());
        assert_eq!(geometry.side(), 17);
        assert_eq!(geometry.vertex_count(), 289);
        assert_eq!(geometry.normals.len(), 289);
        let corner = geometry.vertex(16, 16);
        assert_eq!(corner.x, -128.0);
        assert_eq!(corner.z, -64.0);
    }

    #[test]
    fn test_contains_is_half_open() {
        let mut scene = SceneLedger::default();
        let patch = bare_patch(&mut scene);
        // column 1 spans x in [-128, -64), z in [-128, -64)
        assert!(patch.contains_world_position(Vec3::new(-128.0, 0.0, -128.0)));
        assert!(patch.contains_world_position(Vec3::new(-64.5, 99.0, -64.5)));
        assert!(!patch.contains_world_position(Vec3::new(-64.0, 0.0, -100.0)));
        assert!(!patch.contains_world_position(Vec3::new(-100.0, 0.0, -64.0)));
        assert!(!patch.contains_world_position(Vec3::new(-128.1, 0.0, -100.0)));
    }

    #[test]
    fn test_bilinear_reproduces_plane() {
        let mut scene = SceneLedger::default();
        let patch = bare_patch(&mut scene);
        let field = PlaneField {
            base: 2.0,
            slope_x: 0.25,
            slope_z: -0.1,
        };
        for (x, z) in [(-127.0, -127.0), (-100.3, -90.7), (-64.01, -64.01)] {
            let p = Vec3::new(x, 0.0, z);
            let y = patch.elevation(p).expect("inside patch");
            assert!((y - field.elevation(x, z)).abs() < 1e-3, "at ({x}, {z}) got {y}");
            let n = patch.normal(p).expect("inside patch");
            assert!((n - field.normal(x, z)).length() < 1e-4);
        }
    }

    #[test]
    fn test_queries_outside_return_none() {
        let mut scene = SceneLedger::default();
        let patch = bare_patch(&mut scene);
        let outside = Vec3::new(500.0, 0.0, 500.0);
        assert!(patch.elevation(outside).is_none());
        assert!(patch.normal(outside).is_none());
        assert!(patch.surface_point(outside).is_none());
    }

    #[test]
    fn test_rebuild_moves_and_swaps_geometry() {
        let mut scene = SceneLedger::default();
        let mut patch = bare_patch(&mut scene);
        let before = Arc::clone(patch.geometry());
        patch.rebuild(12, &mut scene);
        assert_eq!(patch.row_index(), 12);
        assert_eq!(patch.origin().z, -128.0 + 12.0 * 64.0);
        assert_eq!(patch.rebuilds(), 2);
        // The old geometry is untouched; readers holding it see the old tile.
        assert_eq!(before.origin.z, -128.0);
        assert!(!Arc::ptr_eq(&before, patch.geometry()));
        let rebuilt = scene
            .drain_changes()
            .into_iter()
            .filter(|c| matches!(c, SceneChange::PatchRebuilt(PatchId(0), _)))
            .count();
        assert_eq!(rebuilt, 2);
    }

    #[test]
    fn test_rebuild_at_same_row_is_deterministic() {
        let mut scene = SceneLedger::default();
        let trees = ScatterObjectSpec::trees(&TreeScatterConfig::default(), TemplateId(0));
        let mut patch = TerrainPatch::new(
            PatchId(3),
            layout(),
            2,
            4,
            42,
            Arc::new(PlaneField::flat(5.0)),
            vec![trees],
            &mut scene,
        );
        let first: Vec<_> = patch
            .scatter_instances()
            .iter()
            .filter_map(|h| scene.get(*h).cloned())
            .collect();
        patch.rebuild(4, &mut scene);
        let second: Vec<_> = patch
            .scatter_instances()
            .iter()
            .filter_map(|h| scene.get(*h).cloned())
            .collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
        // Old trees were removed, not duplicated.
        assert_eq!(scene.count_of(SceneryKind::Tree), first.len());
    }

    #[test]
    fn test_coarse_samples_cover_footprint() {
        let mut scene = SceneLedger::default();
        let patch = bare_patch(&mut scene);
        let samples: Vec<_> = patch.coarse_samples().collect();
        assert_eq!(samples.len(), 64);
        for s in &samples {
            assert!(patch.contains_world_position(s.position));
        }
        assert_eq!(samples[0].position.x, -124.0);
        assert_eq!(samples[0].position.z, -124.0);
    }

    #[test]
    fn test_coarse_samples_restartable() {
        let mut scene = SceneLedger::default();
        let patch = bare_patch(&mut scene);
        let iter = patch.coarse_samples();
        let a: Vec<_> = iter.clone().collect();
        let b: Vec<_> = iter.collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_coarse_spacing_larger_than_patch() {
        let mut scene = SceneLedger::default();
        let wide = PatchLayout {
            sample_spacing: 1000.0,
            ..layout()
        };
        let patch = TerrainPatch::new(PatchId(0), wide, 0, 0, 1, ramp(), Vec::new(), &mut scene);
        assert_eq!(patch.coarse_samples().count(), 1);
    }
}
