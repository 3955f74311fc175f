//! Probabilistic scenery for a newly revealed row: boat clusters, piers and
//! the occasional church.
//!
//! All decisions come from the single terrain stream in a fixed order, so a
//! seed and a sequence of shifts reproduce the same world:
//!
//! 1. dock event; if it fires, a boat cluster (when there are boat
//!    candidates) and then a pier count followed by one attempt per pier
//!    (when there are pier candidates),
//! 2. church event; if it fires and there are building candidates, one church.

use std::f32::consts::{FRAC_PI_2, TAU};

use bevy::prelude::*;

use crate::classifier::{SpawnCandidateSet, SpawnRules};
use crate::patch::SampledPoint;
use crate::random_stream::RandomStream;
use crate::scene::{InstanceHandle, SceneGraph, SceneInstance, SceneryKind, SceneryTemplates};

/// Spacing between consecutive boats of a cluster.
pub const BOAT_SPACING: f32 = 5.0;
/// How far out from the shore a pier needs open water.
pub const PIER_CLEARANCE: f32 = 20.0;
/// Fraction of the boat depth the water beyond a pier must exceed.
pub const PIER_DEPTH_FACTOR: f32 = 0.75;
pub const PIER_DECK_HEIGHT: f32 = 1.5;
pub const PIER_SCALE: f32 = 1.5;
pub const CHURCH_ELEVATION: f32 = 4.0;
pub const CHURCH_SCALE: f32 = 1.5;

/// Point lookups into the landscape, used to test water depth off a shore.
pub trait LandscapeProbe {
    fn probe(&self, p: Vec3) -> Option<SampledPoint>;
}

/// Place the scenery for one row and return the handles of what was spawned.
pub fn place_row_scenery(
    candidates: &SpawnCandidateSet,
    rng: &mut RandomStream,
    probe: &dyn LandscapeProbe,
    rules: &SpawnRules,
    templates: &SceneryTemplates,
    scene: &mut dyn SceneGraph,
) -> Vec<InstanceHandle> {
    let mut placed = Vec::new();

    if rng.chance(rules.dock_spawn_chance) {
        if !candidates.boats.is_empty() {
            for boat in boat_cluster(&candidates.boats, rng, rules, templates) {
                placed.push(scene.instantiate(boat));
            }
        }

        let piers = rng.count(1.0, 3.0);
        if !candidates.piers.is_empty() {
            for _ in 0..piers {
                let site = candidates.piers[rng.pick_index(candidates.piers.len())];
                if let Some(pier) = pier_at(&site, probe, rules, templates) {
                    placed.push(scene.instantiate(pier));
                }
            }
        }
    }

    if rng.chance(rules.church_spawn_chance) && !candidates.buildings.is_empty() {
        let site = candidates.buildings[rng.pick_index(candidates.buildings.len())];
        placed.push(scene.instantiate(church_at(&site, templates)));
    }

    placed
}

fn boat_cluster(
    sites: &[SampledPoint],
    rng: &mut RandomStream,
    rules: &SpawnRules,
    templates: &SceneryTemplates,
) -> Vec<SceneInstance> {
    let count = rng.count(1.0, 5.0);
    let anchor = sites[rng.pick_index(sites.len())].position;
    (0..count)
        .map(|i| {
            let angle = rng.range(0.0, TAU);
            let scale = rng.range(0.5, 0.75);
            let heading = rng.range(0.0, TAU);
            let dist = i as f32 * BOAT_SPACING;
            let translation = Vec3::new(
                anchor.x + angle.cos() * dist,
                rules.water_level + 0.5 * scale,
                anchor.z + angle.sin() * dist,
            );
            SceneInstance {
                kind: SceneryKind::Boat,
                template: templates.boat,
                transform: Transform::from_translation(translation)
                    .with_rotation(Quat::from_rotation_y(heading))
                    .with_scale(Vec3::splat(scale)),
                cast_shadow: true,
                receive_shadow: false,
            }
        })
        .collect()
}

/// A pier at `site`, if the water beyond it is deep enough.
fn pier_at(
    site: &SampledPoint,
    probe: &dyn LandscapeProbe,
    rules: &SpawnRules,
    templates: &SceneryTemplates,
) -> Option<SceneInstance> {
    let n = site.normal;
    let outward = Vec2::new(n.x, n.z).try_normalize()?;
    let rise = 1.0 - n.y;
    if rise <= 0.0 {
        return None;
    }

    let offshore = Vec3::new(
        site.position.x + outward.x * PIER_CLEARANCE,
        rules.water_level,
        site.position.z + outward.y * PIER_CLEARANCE,
    );
    let beyond = probe.probe(offshore)?;
    if beyond.position.y >= rules.boat_depth_threshold * PIER_DEPTH_FACTOR {
        return None;
    }

    let above_water = site.position.y - rules.water_level;
    let shore = Vec3::new(n.x, 0.0, n.z) * (above_water / rise * 0.5);
    let heading = n.x.atan2(n.z);
    Some(SceneInstance {
        kind: SceneryKind::Pier,
        template: templates.pier,
        transform: Transform::from_xyz(
            site.position.x + shore.x,
            rules.water_level + PIER_DECK_HEIGHT,
            site.position.z + shore.z,
        )
        .with_rotation(Quat::from_rotation_z(heading + FRAC_PI_2))
        .with_scale(Vec3::splat(PIER_SCALE)),
        cast_shadow: true,
        receive_shadow: false,
    })
}

fn church_at(site: &SampledPoint, templates: &SceneryTemplates) -> SceneInstance {
    let heading = site.normal.x.atan2(site.normal.z);
    SceneInstance {
        kind: SceneryKind::Church,
        template: templates.church,
        transform: Transform::from_translation(site.position + Vec3::Y * CHURCH_ELEVATION)
            .with_rotation(Quat::from_rotation_y(heading - FRAC_PI_2))
            .with_scale(Vec3::splat(CHURCH_SCALE)),
        cast_shadow: true,
        receive_shadow: true,
    }
}
