use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use landscape::Viewpoint;

/// Sideways travel of the camera anchor is clamped to this half-width.
const ANCHOR_MAX_X: f32 = 60.0;
const FOG_START: f32 = 350.0;
const FOG_END: f32 = 950.0;

/// Chase camera that trails the viewpoint.
#[derive(Component)]
pub struct FollowCamera {
    /// Camera position relative to the anchor.
    pub offset: Vec3,
    /// Point looked at, relative to the anchor.
    pub look_ahead: Vec3,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 110.0, -90.0),
            look_ahead: Vec3::new(0.0, 40.0, 60.0),
        }
    }
}

/// Ground point the camera follows: the viewpoint projected to Y = 0 with X
/// kept near the middle of the strip.
pub fn camera_anchor(viewpoint: Vec3) -> Vec3 {
    Vec3::new(viewpoint.x.clamp(-ANCHOR_MAX_X, ANCHOR_MAX_X), 0.0, viewpoint.z)
}

pub fn setup_camera(mut commands: Commands) {
    let follow = FollowCamera::default();
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(follow.offset).looking_at(follow.look_ahead, Vec3::Y),
        DistanceFog {
            color: Color::srgb_u8(0xda, 0xf0, 0xfb),
            falloff: FogFalloff::Linear {
                start: FOG_START,
                end: FOG_END,
            },
            ..default()
        },
        follow,
    ));
}

pub fn follow_viewpoint(
    viewpoint: Res<Viewpoint>,
    mut cameras: Query<(&FollowCamera, &mut Transform)>,
) {
    let anchor = camera_anchor(viewpoint.position);
    for (follow, mut transform) in &mut cameras {
        *transform = Transform::from_translation(anchor + follow.offset)
            .looking_at(anchor + follow.look_ahead, Vec3::Y);
    }
}
