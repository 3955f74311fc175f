//! Bird markers that mirror the flock's positions.

use bevy::pbr::NotShadowReceiver;
use bevy::prelude::*;

use landscape::wildlife::Flock;

#[derive(Component, Debug, Clone, Copy)]
pub struct Bird(pub usize);

const BIRD_RADIUS: f32 = 0.6;

pub fn sync_birds(
    mut commands: Commands,
    flock: Option<Res<Flock>>,
    mut birds: Query<(&Bird, &mut Transform)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(flock) = flock else {
        return;
    };

    if birds.is_empty() {
        let mesh = meshes.add(Sphere::new(BIRD_RADIUS));
        let material = materials.add(StandardMaterial {
            base_color: Color::srgb(0.15, 0.15, 0.18),
            ..default()
        });
        for (i, position) in flock.birds().iter().enumerate() {
            commands.spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(*position),
                NotShadowReceiver,
                Bird(i),
            ));
        }
        return;
    }

    if !flock.is_changed() {
        return;
    }
    for (bird, mut transform) in &mut birds {
        if let Some(position) = flock.birds().get(bird.0) {
            transform.translation = *position;
        }
    }
}
