use bevy::prelude::*;

use landscape::world::WaterPlane;

#[derive(Component)]
pub struct WaterSurface;

pub const WATER_BASE_COLOR: Color = Color::srgb(0.067, 0.067, 0.067);
pub const WATER_EMISSIVE: LinearRgba = LinearRgba::new(0.108, 0.345, 0.402, 1.0);

/// Spawn the water surface once the landscape publishes it, then keep it
/// under the streaming grid.
pub fn sync_water_surface(
    mut commands: Commands,
    water: Option<Res<WaterPlane>>,
    mut surfaces: Query<&mut Transform, With<WaterSurface>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(water) = water else {
        return;
    };
    let transform = Transform::from_xyz(water.center_x, water.height, water.center_z);

    if let Ok(mut current) = surfaces.get_single_mut() {
        if water.is_changed() {
            *current = transform;
        }
        return;
    }

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(water.width, water.depth))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: WATER_BASE_COLOR,
            emissive: WATER_EMISSIVE,
            ..default()
        })),
        transform,
        WaterSurface,
    ));
}
