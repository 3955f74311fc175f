//! Endless landscape streaming.
//!
//! A ring of noise-driven terrain patches follows the [`Viewpoint`] along +Z.
//! Every recycled row is classified and dressed with boats, piers and the odd
//! church from one seeded stream, so a world seed always flies the same
//! world. Rendering lives elsewhere and reads the [`scene::SceneLedger`].

use bevy::prelude::*;

pub mod classifier;
pub mod config;
pub mod config_error;
pub mod fingerprint;
pub mod grid;
pub mod heightmap;
pub mod patch;
pub mod placement;
pub mod random_stream;
pub mod scatter;
pub mod scene;
pub mod wildlife;
pub mod world;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

use config::LandscapeConfig;
use scene::{MeshTemplates, SceneChangeConsumer, SceneLedger};
use wildlife::{Flock, BIRD_COUNT};
use world::{WaterPlane, WorldState};

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Where the observer is. Written each frame by whatever flies the camera;
/// the landscape streams so the row under it stays covered.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub position: Vec3,
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LandscapeSet {
    /// Grid shifts and scenery placement.
    Stream,
    /// Flock respawns; runs after streaming.
    Wildlife,
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct LandscapePlugin;

impl Plugin for LandscapePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<MeshTemplates>() {
            app.insert_resource(MeshTemplates::standard());
        }
        app.init_resource::<LandscapeConfig>()
            .init_resource::<SceneLedger>()
            .init_resource::<Viewpoint>()
            .configure_sets(
                Update,
                (LandscapeSet::Stream, LandscapeSet::Wildlife).chain(),
            )
            .add_systems(Startup, init_world)
            .add_systems(
                Update,
                stream_terrain
                    .in_set(LandscapeSet::Stream)
                    .run_if(resource_exists::<WorldState>),
            )
            .add_systems(
                Update,
                update_flock
                    .in_set(LandscapeSet::Wildlife)
                    .run_if(resource_exists::<Flock>),
            )
            .add_systems(
                Last,
                discard_unread_changes.run_if(not(resource_exists::<SceneChangeConsumer>)),
            );
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Validate the config and build the world, or request a failing exit.
pub fn init_world(
    mut commands: Commands,
    config: Res<LandscapeConfig>,
    templates: Res<MeshTemplates>,
    mut ledger: ResMut<SceneLedger>,
    mut exit: EventWriter<AppExit>,
) {
    match WorldState::new(config.clone(), &templates, &mut *ledger) {
        Ok(world) => {
            commands.insert_resource(*world.water());
            commands.insert_resource(Flock::new(config.world_seed, BIRD_COUNT));
            commands.insert_resource(world);
        }
        Err(e) => {
            error!("Landscape configuration rejected: {}", e);
            exit.send(AppExit::error());
        }
    }
}

/// Shift the grid until the viewpoint's row is covered.
pub fn stream_terrain(
    viewpoint: Res<Viewpoint>,
    mut world: ResMut<WorldState>,
    mut ledger: ResMut<SceneLedger>,
    mut water: ResMut<WaterPlane>,
) {
    let shifted = world.advance_to(viewpoint.position, &mut *ledger);
    if shifted > 0 {
        *water = *world.water();
        debug!(
            "stream_terrain: {} row(s), forward index {}",
            shifted,
            world.grid().forward_index()
        );
    }
}

pub fn update_flock(
    time: Res<Time>,
    viewpoint: Res<Viewpoint>,
    world: Option<Res<WorldState>>,
    mut flock: ResMut<Flock>,
) {
    let width = world
        .map(|w| w.grid().landscape_width())
        .unwrap_or_default();
    flock.tick(time.delta_secs(), viewpoint.position.z, width);
}

/// Empty the change queue when no renderer is draining it.
pub fn discard_unread_changes(mut ledger: ResMut<SceneLedger>) {
    if !ledger.pending().is_empty() {
        ledger.clear_changes();
    }
}
