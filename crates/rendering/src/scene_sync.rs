//! Applies the landscape's queued scene changes to ECS entities.
//!
//! Each frame, after streaming, the `SceneLedger` is drained in order:
//! spawned scenery becomes a `SceneRoot` entity, removed scenery is
//! despawned, and rebuilt patches get a fresh mesh on their existing entity.

use std::collections::HashMap;

use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;

use landscape::patch::PatchId;
use landscape::scene::{InstanceHandle, SceneChange, SceneInstance, SceneLedger};
use landscape::world::WorldState;

use crate::models::SceneryModelCache;
use crate::patch_mesh::build_patch_mesh;

/// Marker on a rendered terrain patch.
#[derive(Component, Debug, Clone, Copy)]
pub struct PatchMesh(pub PatchId);

/// Marker on a rendered scenery instance.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneryEntity(pub InstanceHandle);

/// Entity bookkeeping for everything the landscape asked for.
#[derive(Resource, Default)]
pub struct SceneEntities {
    pub instances: HashMap<InstanceHandle, Entity>,
    pub patches: HashMap<PatchId, RenderedPatch>,
}

/// A patch entity and the mesh it currently shows.
pub struct RenderedPatch {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
}

/// Shared material for all patches; vertex colors carry the ground tint.
#[derive(Resource)]
pub struct TerrainMaterial(pub Handle<StandardMaterial>);

impl FromWorld for TerrainMaterial {
    fn from_world(world: &mut World) -> Self {
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        Self(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            perceptual_roughness: 0.9,
            ..default()
        }))
    }
}

pub fn apply_scene_changes(
    mut commands: Commands,
    mut ledger: ResMut<SceneLedger>,
    mut entities: ResMut<SceneEntities>,
    models: Option<Res<SceneryModelCache>>,
    world: Option<Res<WorldState>>,
    terrain_material: Res<TerrainMaterial>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    if ledger.pending().is_empty() {
        return;
    }
    let water_level = world
        .as_ref()
        .map(|w| w.config().water_level)
        .unwrap_or_default();

    for change in ledger.drain_changes() {
        match change {
            SceneChange::Spawned(handle, instance) => {
                let scene = models
                    .as_ref()
                    .map(|m| m.get(instance.template))
                    .unwrap_or_default();
                let entity = spawn_instance(&mut commands, handle, &instance, scene);
                entities.instances.insert(handle, entity);
            }
            SceneChange::Removed(handle) => {
                if let Some(entity) = entities.instances.remove(&handle) {
                    commands.entity(entity).despawn_recursive();
                }
            }
            SceneChange::PatchRebuilt(id, geometry) => {
                let mesh = meshes.add(build_patch_mesh(&geometry, water_level));
                let transform = Transform::from_translation(geometry.origin);
                match entities.patches.get_mut(&id) {
                    Some(rendered) => {
                        let old = std::mem::replace(&mut rendered.mesh, mesh.clone());
                        meshes.remove(&old);
                        commands
                            .entity(rendered.entity)
                            .insert((Mesh3d(mesh), transform));
                    }
                    None => {
                        let entity = commands
                            .spawn((
                                Mesh3d(mesh.clone()),
                                MeshMaterial3d(terrain_material.0.clone()),
                                transform,
                                PatchMesh(id),
                            ))
                            .id();
                        entities.patches.insert(id, RenderedPatch { entity, mesh });
                    }
                }
            }
        }
    }
}

fn spawn_instance(
    commands: &mut Commands,
    handle: InstanceHandle,
    instance: &SceneInstance,
    scene: Handle<Scene>,
) -> Entity {
    let mut entity = commands.spawn((
        SceneRoot(scene),
        instance.transform,
        SceneryEntity(handle),
    ));
    if !instance.cast_shadow {
        entity.insert(NotShadowCaster);
    }
    if !instance.receive_shadow {
        entity.insert(NotShadowReceiver);
    }
    entity.id()
}
