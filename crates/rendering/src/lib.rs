use bevy::prelude::*;

use landscape::scene::SceneChangeConsumer;
use landscape::LandscapeSet;

pub mod birds;
pub mod camera;
pub mod models;
pub mod patch_mesh;
pub mod scene_sync;
pub mod water;

use scene_sync::{SceneEntities, TerrainMaterial};

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SceneChangeConsumer)
            .init_resource::<SceneEntities>()
            .init_resource::<TerrainMaterial>()
            .add_systems(
                Startup,
                (
                    camera::setup_camera,
                    setup_lighting,
                    models::load_scenery_models,
                ),
            )
            .add_systems(
                Update,
                (
                    scene_sync::apply_scene_changes,
                    water::sync_water_surface,
                    camera::follow_viewpoint,
                )
                    .after(LandscapeSet::Stream),
            )
            .add_systems(Update, birds::sync_birds.after(LandscapeSet::Wildlife));
    }
}

fn setup_lighting(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::srgb_u8(0xee, 0xee, 0xff),
        brightness: 300.0,
    });
    commands.insert_resource(ClearColor(Color::srgb_u8(0xda, 0xf0, 0xfb)));

    // Sun low in the south, lighting the strip from behind the viewer.
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::XYZ,
            -std::f32::consts::FRAC_PI_4,
            std::f32::consts::FRAC_PI_6,
            0.0,
        )),
    ));
}
