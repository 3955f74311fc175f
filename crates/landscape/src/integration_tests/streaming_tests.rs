//! Integration tests for streaming the grid under a moving viewpoint.

use std::collections::HashSet;

use bevy::prelude::*;

use super::quick_config;
use crate::scene::{SceneChange, SceneryKind};
use crate::test_harness::TestLandscape;

#[test]
fn test_startup_builds_full_grid() {
    let mut land = TestLandscape::with_change_consumer(quick_config());
    let grid = land.world_state().grid();
    assert_eq!(grid.patches().len(), 72);
    assert_eq!(grid.forward_index(), 0);
    let rebuilt: HashSet<_> = land
        .take_changes()
        .into_iter()
        .filter_map(|c| match c {
            SceneChange::PatchRebuilt(id, _) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(rebuilt.len(), 72);
}

#[test]
fn test_unread_changes_do_not_pile_up() {
    let mut land = TestLandscape::with_config(quick_config());
    assert!(land.ledger().pending().is_empty());
    for row in 1..=50 {
        land.fly_to(Vec3::new(0.0, 60.0, row as f32 * 64.0));
        assert!(land.ledger().pending().is_empty(), "queue kept at row {row}");
    }
    assert_eq!(land.world_state().grid().forward_index(), 50);
    // Discarding the queue leaves the live scenery intact.
    assert!(land.count_of(SceneryKind::Tree) > 0);
}

#[test]
fn test_consumer_receives_each_recycled_row() {
    let mut land = TestLandscape::with_change_consumer(quick_config());
    land.take_changes();
    land.fly_to(Vec3::new(0.0, 60.0, 128.0));
    let rebuilt = land
        .take_changes()
        .into_iter()
        .filter(|c| matches!(c, SceneChange::PatchRebuilt(..)))
        .count();
    assert_eq!(rebuilt, 2 * 6);
    assert!(land.ledger().pending().is_empty());
}

#[test]
fn test_flying_forward_keeps_viewpoint_row_covered() {
    let mut land = TestLandscape::with_config(quick_config());
    land.fly_forward(1000.0, 16.0);

    let state = land.world_state();
    let grid = state.grid();
    let row = grid.grid_index_for(land.viewpoint()).row;
    assert_eq!(grid.forward_index(), row);
    let bounds = grid.bounds();
    assert!(bounds.min.y <= land.viewpoint().z && land.viewpoint().z < bounds.max.y);
    assert!(state.query(Vec3::new(0.0, 0.0, land.viewpoint().z)).is_some());
}

#[test]
fn test_patches_tile_after_flight() {
    let mut land = TestLandscape::with_config(quick_config());
    land.fly_forward(2048.0, 64.0);

    let grid = land.world_state().grid();
    let f = grid.forward_index();
    let cells: HashSet<(usize, i64)> = grid
        .patches()
        .iter()
        .map(|p| (p.column(), p.row_index()))
        .collect();
    assert_eq!(cells.len(), 72);
    assert!(cells.iter().all(|&(_, row)| (f..f + 12).contains(&row)));
}

#[test]
fn test_water_plane_tracks_grid() {
    let mut land = TestLandscape::with_config(quick_config());
    let start = land.water().center_z;
    land.fly_forward(640.0, 32.0);
    let shifts = land.world_state().grid().forward_index();
    assert!(shifts > 0);
    assert_eq!(land.water().center_z, start + shifts as f32 * 64.0);
    assert_eq!(land.water(), land.world_state().water());
}

#[test]
fn test_recycled_rows_take_their_scenery() {
    let mut land = TestLandscape::with_config(quick_config());
    land.fly_forward(6400.0, 64.0);

    let state = land.world_state();
    let grid = state.grid();
    let owned: usize = (0..grid.rows()).map(|slot| grid.row_scenery(slot).len()).sum();
    let placed = land.count_of(SceneryKind::Boat)
        + land.count_of(SceneryKind::Pier)
        + land.count_of(SceneryKind::Church);
    assert_eq!(owned, placed);
    // Trees belong to patches; at most one full rule's worth per patch.
    let per_patch = state.config().trees.count as usize;
    assert!(land.count_of(SceneryKind::Tree) <= 72 * per_patch);
}

#[test]
fn test_standing_still_does_not_shift() {
    let mut land = TestLandscape::with_config(quick_config());
    land.fly_to(Vec3::new(0.0, 60.0, 20.0));
    let draws = land.world_state().terrain_draws();
    land.update(10);
    assert_eq!(land.world_state().grid().forward_index(), 0);
    assert_eq!(land.world_state().terrain_draws(), draws);
}
