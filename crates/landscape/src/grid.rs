//! The ring of patches that streams along +Z.
//!
//! Patches are stored row-slot major: slot `s` holds the patches whose
//! absolute row index is congruent to `s` modulo the row count. A shift
//! recycles the trailing slot `forward_index % rows` to `rows` rows further
//! on, so the grid always covers rows `forward_index .. forward_index + rows`.

use std::sync::Arc;

use bevy::prelude::*;

use crate::classifier::{classify, SpawnRules};
use crate::heightmap::ElevationField;
use crate::patch::{PatchId, PatchLayout, SampledPoint, TerrainPatch};
use crate::placement::{place_row_scenery, LandscapeProbe};
use crate::random_stream::RandomStream;
use crate::scatter::ScatterObjectSpec;
use crate::scene::{InstanceHandle, SceneGraph, SceneryTemplates};

/// Integer cell of a world position, rounded to the nearest patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub col: i64,
    pub row: i64,
}

/// Everything a shift needs besides the grid itself.
pub struct ShiftContext<'a> {
    pub rng: &'a mut RandomStream,
    pub rules: &'a SpawnRules,
    pub templates: &'a SceneryTemplates,
    pub scene: &'a mut dyn SceneGraph,
}

pub struct TerrainGrid {
    layout: PatchLayout,
    rows: usize,
    columns: usize,
    patches: Vec<TerrainPatch>,
    /// Scenery placed for each row slot, removed when the slot is recycled.
    row_scenery: Vec<Vec<InstanceHandle>>,
    forward_index: i64,
}

impl TerrainGrid {
    /// Build every patch, then place scenery for each row front to back.
    pub fn new(
        layout: PatchLayout,
        rows: usize,
        columns: usize,
        world_seed: u64,
        field: Arc<dyn ElevationField>,
        scatter: Vec<ScatterObjectSpec>,
        ctx: ShiftContext<'_>,
    ) -> Self {
        let mut patches = Vec::with_capacity(rows * columns);
        for slot in 0..rows {
            for column in 0..columns {
                patches.push(TerrainPatch::new(
                    PatchId(patches.len() as u32),
                    layout,
                    column,
                    slot as i64,
                    world_seed,
                    Arc::clone(&field),
                    scatter.clone(),
                    ctx.scene,
                ));
            }
        }

        let mut grid = Self {
            layout,
            rows,
            columns,
            patches,
            row_scenery: vec![Vec::new(); rows],
            forward_index: 0,
        };
        let ShiftContext {
            rng,
            rules,
            templates,
            scene,
        } = ctx;
        for slot in 0..rows {
            grid.populate_row(slot, rng, rules, templates, scene);
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn layout(&self) -> &PatchLayout {
        &self.layout
    }

    pub fn patches(&self) -> &[TerrainPatch] {
        &self.patches
    }

    /// Shifts performed since construction.
    pub fn forward_index(&self) -> i64 {
        self.forward_index
    }

    /// Scenery handles currently owned by `slot`.
    pub fn row_scenery(&self, slot: usize) -> &[InstanceHandle] {
        &self.row_scenery[slot]
    }

    fn row(&self, slot: usize) -> &[TerrainPatch] {
        &self.patches[slot * self.columns..(slot + 1) * self.columns]
    }

    /// Advance `row_delta` rows, one recycled row at a time.
    pub fn shift(&mut self, row_delta: usize, ctx: ShiftContext<'_>) {
        let ShiftContext {
            rng,
            rules,
            templates,
            scene,
        } = ctx;
        for _ in 0..row_delta {
            let slot = self.forward_index.rem_euclid(self.rows as i64) as usize;
            for handle in self.row_scenery[slot].drain(..) {
                scene.remove(handle);
            }
            let columns = self.columns;
            let rows = self.rows as i64;
            for patch in &mut self.patches[slot * columns..(slot + 1) * columns] {
                patch.rebuild(patch.row_index() + rows, scene);
            }
            self.populate_row(slot, rng, rules, templates, scene);
            self.forward_index += 1;
            debug!(
                "TerrainGrid: recycled slot {} to row {}",
                slot,
                self.forward_index + rows - 1
            );
        }
    }

    fn populate_row(
        &mut self,
        slot: usize,
        rng: &mut RandomStream,
        rules: &SpawnRules,
        templates: &SceneryTemplates,
        scene: &mut dyn SceneGraph,
    ) {
        let samples = self.row(slot).iter().flat_map(|p| p.coarse_samples());
        let candidates = classify(samples, rules);
        let placed = place_row_scenery(&candidates, rng, &*self, rules, templates, scene);
        self.row_scenery[slot] = placed;
    }

    /// Surface point under `p`, or `None` outside the landscape.
    pub fn query(&self, p: Vec3) -> Option<SampledPoint> {
        self.patches
            .iter()
            .find(|patch| patch.contains_world_position(p))
            .and_then(|patch| patch.surface_point(p))
    }

    pub fn grid_index_for(&self, p: Vec3) -> GridIndex {
        GridIndex {
            col: (p.x / self.layout.width).round() as i64,
            row: (p.z / self.layout.depth).round() as i64,
        }
    }

    /// Shifts needed before the row under `p` is no longer ahead of the grid.
    pub fn rows_due(&self, p: Vec3) -> usize {
        (self.grid_index_for(p).row - self.forward_index).max(0) as usize
    }

    pub fn landscape_width(&self) -> f32 {
        self.columns as f32 * self.layout.width
    }

    pub fn landscape_depth(&self) -> f32 {
        self.rows as f32 * self.layout.depth
    }

    pub fn midpoint_x(&self) -> f32 {
        self.landscape_width() * 0.5 + self.layout.offset_x
    }

    /// The XZ rectangle currently covered, with Y mapped to world Z.
    pub fn bounds(&self) -> Rect {
        let min = self.layout.origin(0, self.forward_index);
        Rect::new(
            min.x,
            min.z,
            min.x + self.landscape_width(),
            min.z + self.landscape_depth(),
        )
    }
}

impl LandscapeProbe for TerrainGrid {
    fn probe(&self, p: Vec3) -> Option<SampledPoint> {
        self.query(p)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::heightmap::PlaneField;
    use crate::scene::{MeshTemplates, SceneLedger, SceneryKind};

    struct Fixture {
        rng: RandomStream,
        rules: SpawnRules,
        templates: SceneryTemplates,
        scene: SceneLedger,
    }

    impl Fixture {
        fn new(rules: SpawnRules) -> Self {
            Self {
                rng: RandomStream::new(42),
                rules,
                templates: SceneryTemplates::resolve(&MeshTemplates::standard())
                    .expect("standard templates"),
                scene: SceneLedger::default(),
            }
        }

        fn ctx(&mut self) -> ShiftContext<'_> {
            ShiftContext {
                rng: &mut self.rng,
                rules: &self.rules,
                templates: &self.templates,
                scene: &mut self.scene,
            }
        }
    }

    fn layout() -> PatchLayout {
        PatchLayout {
            offset_x: -192.0,
            offset_z: -128.0,
            width: 64.0,
            depth: 64.0,
            segments: 2,
            sample_spacing: 32.0,
        }
    }

    fn grid_on(field: PlaneField, fixture: &mut Fixture) -> TerrainGrid {
        TerrainGrid::new(layout(), 12, 6, 42, Arc::new(field), Vec::new(), fixture.ctx())
    }

    fn assert_tiles(grid: &TerrainGrid) {
        let f = grid.forward_index();
        let cells: HashSet<(usize, i64)> = grid
            .patches()
            .iter()
            .map(|p| (p.column(), p.row_index()))
            .collect();
        assert_eq!(cells.len(), grid.rows() * grid.columns());
        for row in f..f + grid.rows() as i64 {
            for col in 0..grid.columns() {
                assert!(cells.contains(&(col, row)), "missing ({col}, {row})");
            }
        }
        for p in grid.patches() {
            let expected = grid.layout().origin(p.column(), p.row_index());
            assert_eq!(p.origin(), expected);
        }
    }

    #[test]
    fn test_initial_grid_tiles() {
        let mut fx = Fixture::new(SpawnRules::default());
        let grid = grid_on(PlaneField::flat(5.0), &mut fx);
        assert_eq!(grid.patches().len(), 72);
        assert_tiles(&grid);
        let b = grid.bounds();
        assert_eq!(b.min, Vec2::new(-192.0, -128.0));
        assert_eq!(b.max, Vec2::new(192.0, 640.0));
        assert_eq!(grid.midpoint_x(), 0.0);
    }

    #[test]
    fn test_shift_keeps_tiling() {
        let mut fx = Fixture::new(SpawnRules::default());
        let mut grid = grid_on(PlaneField::flat(5.0), &mut fx);
        for delta in [1, 3, 0, 12, 25] {
            grid.shift(delta, fx.ctx());
            assert_tiles(&grid);
        }
        assert_eq!(grid.forward_index(), 41);
        assert_eq!(grid.bounds().min.y, -128.0 + 41.0 * 64.0);
    }

    #[test]
    fn test_zero_shift_is_noop() {
        let mut fx = Fixture::new(SpawnRules::default());
        let mut grid = grid_on(PlaneField::flat(5.0), &mut fx);
        fx.scene.drain_changes();
        let word = fx.rng.word_pos();
        grid.shift(0, fx.ctx());
        assert_eq!(grid.forward_index(), 0);
        assert_eq!(fx.rng.word_pos(), word);
        assert!(fx.scene.pending().is_empty());
    }

    #[test]
    fn test_patches_reused_over_1000_shifts() {
        let rules = SpawnRules {
            church_spawn_chance: 1.0,
            ..SpawnRules::default()
        };
        let mut fx = Fixture::new(rules);
        let mut grid = grid_on(PlaneField::flat(5.0), &mut fx);
        for _ in 0..1000 {
            grid.shift(1, fx.ctx());
        }
        let ids: HashSet<PatchId> = grid.patches().iter().map(|p| p.id()).collect();
        assert_eq!(ids.len(), 72);
        assert_eq!(grid.patches().len(), 72);
        assert_tiles(&grid);
        // One church per live row; recycled rows took theirs with them.
        assert_eq!(fx.scene.count_of(SceneryKind::Church), 12);
    }

    #[test]
    fn test_shift_rebuilds_trailing_row_only() {
        let mut fx = Fixture::new(SpawnRules::default());
        let mut grid = grid_on(PlaneField::flat(5.0), &mut fx);
        grid.shift(1, fx.ctx());
        for p in grid.patches() {
            let expected = if p.row_index() == 12 { 2 } else { 1 };
            assert_eq!(p.rebuilds(), expected);
        }
        assert!(grid.patches()[..6].iter().all(|p| p.row_index() == 12));
    }

    #[test]
    fn test_query_inside_and_outside() {
        let mut fx = Fixture::new(SpawnRules::default());
        let field = PlaneField {
            base: 1.0,
            slope_x: 0.0,
            slope_z: 0.5,
        };
        let grid = grid_on(field, &mut fx);
        let hit = grid.query(Vec3::new(10.0, 300.0, 20.0)).expect("inside");
        assert!((hit.position.y - 11.0).abs() < 1e-3);
        assert_eq!(hit.position.x, 10.0);
        assert!(hit.normal.z < 0.0);

        assert!(grid.query(Vec3::new(192.0, 0.0, 0.0)).is_none());
        assert!(grid.query(Vec3::new(0.0, 0.0, -129.0)).is_none());
        assert!(grid.query(Vec3::new(0.0, 0.0, 640.0)).is_none());
        assert!(grid.query(Vec3::new(-192.0, 0.0, -128.0)).is_some());
    }

    #[test]
    fn test_grid_index_rounds() {
        let mut fx = Fixture::new(SpawnRules::default());
        let grid = grid_on(PlaneField::flat(5.0), &mut fx);
        assert_eq!(
            grid.grid_index_for(Vec3::new(31.0, 0.0, 33.0)),
            GridIndex { col: 0, row: 1 }
        );
        assert_eq!(
            grid.grid_index_for(Vec3::new(-100.0, 0.0, -20.0)),
            GridIndex { col: -2, row: 0 }
        );
        assert_eq!(grid.rows_due(Vec3::new(0.0, 0.0, -500.0)), 0);
        assert_eq!(grid.rows_due(Vec3::new(0.0, 0.0, 200.0)), 3);
    }

    #[test]
    fn test_same_seed_same_world() {
        let rules = SpawnRules {
            church_spawn_chance: 0.5,
            ..SpawnRules::default()
        };
        let field = PlaneField {
            base: -10.0,
            slope_x: 0.0,
            slope_z: 0.01,
        };
        let run = || {
            let mut fx = Fixture::new(rules);
            let mut grid = grid_on(field, &mut fx);
            grid.shift(20, fx.ctx());
            fx.scene
                .live()
                .map(|(_, i)| i.clone())
                .collect::<Vec<_>>()
        };
        let a = run();
        assert!(!a.is_empty());
        assert_eq!(a, run());
    }
}
