//! The balloon: a constant-speed fly-forward driver for the viewpoint.

use bevy::prelude::*;

use landscape::scene::{MeshTemplates, BALLOON_TEMPLATE};
use landscape::Viewpoint;
use rendering::models::SceneryModelCache;

pub const START_POSITION: Vec3 = Vec3::new(0.0, 100.0, 0.0);
pub const CRUISE_SPEED: f32 = 20.0;

#[derive(Component)]
pub struct Balloon {
    pub speed: f32,
}

pub fn spawn_balloon(
    mut commands: Commands,
    templates: Res<MeshTemplates>,
    models: Res<SceneryModelCache>,
    mut viewpoint: ResMut<Viewpoint>,
) {
    let scene = templates
        .get(BALLOON_TEMPLATE)
        .map(|id| models.get(id))
        .unwrap_or_default();
    commands.spawn((
        SceneRoot(scene),
        Transform::from_translation(START_POSITION),
        Balloon {
            speed: CRUISE_SPEED,
        },
    ));
    viewpoint.position = START_POSITION;
}

/// Move the balloon along +Z and publish its position as the viewpoint.
pub fn fly_forward(
    time: Res<Time>,
    mut viewpoint: ResMut<Viewpoint>,
    mut balloons: Query<(&Balloon, &mut Transform)>,
) {
    for (balloon, mut transform) in &mut balloons {
        transform.translation.z += balloon.speed * time.delta_secs();
        viewpoint.position = transform.translation;
    }
}
