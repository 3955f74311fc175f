//! Triangle meshes for terrain patches.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use landscape::patch::PatchGeometry;

pub const SAND_COLOR: [f32; 4] = [0.533, 0.4, 0.2, 1.0];
pub const GRASS_COLOR: [f32; 4] = [0.278, 0.349, 0.02, 1.0];
pub const CLIFF_COLOR: [f32; 4] = [0.333, 0.333, 0.333, 1.0];

/// Ground within this height of the waterline reads as beach.
const SAND_BAND: f32 = 1.0;
/// Slope (`1 - normal.y`) past which ground reads as rock.
const CLIFF_SLOPE: f32 = 0.25;

/// Vertex color for ground at `height` facing `normal`.
pub fn ground_color(height: f32, normal: Vec3, water_level: f32) -> [f32; 4] {
    if 1.0 - normal.y > CLIFF_SLOPE {
        CLIFF_COLOR
    } else if height <= water_level + 0.5 + SAND_BAND {
        SAND_COLOR
    } else {
        GRASS_COLOR
    }
}

/// Build a mesh for `geometry` in patch-local space (origin at the minimum
/// corner); place it with `Transform::from_translation(geometry.origin)`.
pub fn build_patch_mesh(geometry: &PatchGeometry, water_level: f32) -> Mesh {
    let side = geometry.side();
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(side * side);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(side * side);
    let mut colors: Vec<[f32; 4]> = Vec::with_capacity(side * side);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(side * side);

    let segments = geometry.segments as f32;
    for iz in 0..side {
        for ix in 0..side {
            let world = geometry.vertex(ix, iz);
            let local = world - geometry.origin;
            let normal = geometry.normals[iz * side + ix];
            positions.push(local.to_array());
            normals.push(normal.to_array());
            colors.push(ground_color(world.y, normal, water_level));
            uvs.push([ix as f32 / segments, iz as f32 / segments]);
        }
    }

    let cells = geometry.segments as usize;
    let mut indices: Vec<u32> = Vec::with_capacity(cells * cells * 6);
    for iz in 0..cells {
        for ix in 0..cells {
            let tl = (iz * side + ix) as u32;
            let tr = tl + 1;
            let bl = tl + side as u32;
            let br = bl + 1;
            // Counter-clockwise seen from +Y.
            indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        }
    }

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_indices(Indices::U32(indices))
}
