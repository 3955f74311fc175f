//! The owned world: config, elevation field, grid, terrain stream and water.
//!
//! `WorldState` is the single mutable root of the landscape. The plugin
//! inserts it as a resource once startup validation passes; nothing else
//! holds landscape state.

use std::sync::Arc;

use bevy::prelude::*;

use crate::classifier::SpawnRules;
use crate::config::LandscapeConfig;
use crate::config_error::ConfigError;
use crate::grid::{ShiftContext, TerrainGrid};
use crate::heightmap::{ElevationField, Heightmap};
use crate::patch::{PatchLayout, SampledPoint};
use crate::random_stream::RandomStream;
use crate::scatter::ScatterObjectSpec;
use crate::scene::{MeshTemplates, SceneGraph, SceneryTemplates};

/// The sea surface. It spans twice the landscape depth and slides forward
/// one patch per shift.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WaterPlane {
    pub center_x: f32,
    pub center_z: f32,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
}

impl WaterPlane {
    pub fn from_config(config: &LandscapeConfig) -> Self {
        Self {
            center_x: config.grid_offset_x() + config.landscape_width() * 0.5,
            center_z: -config.grid_offset_x(),
            width: config.landscape_width(),
            depth: 2.0 * config.landscape_depth(),
            height: config.water_level,
        }
    }

    fn advance(&mut self, rows: usize, patch_depth: f32) {
        self.center_z += rows as f32 * patch_depth;
    }
}

#[derive(Resource)]
pub struct WorldState {
    config: LandscapeConfig,
    field: Arc<dyn ElevationField>,
    grid: TerrainGrid,
    terrain: RandomStream,
    rules: SpawnRules,
    templates: SceneryTemplates,
    water: WaterPlane,
}

impl WorldState {
    /// Validate `config` and build the initial grid over the noise heightmap.
    pub fn new(
        config: LandscapeConfig,
        templates: &MeshTemplates,
        scene: &mut dyn SceneGraph,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = Arc::new(Heightmap::new(config.heightmap()));
        Self::with_field(config, field, templates, scene)
    }

    /// Like [`WorldState::new`] but over any elevation field.
    pub fn with_field(
        config: LandscapeConfig,
        field: Arc<dyn ElevationField>,
        templates: &MeshTemplates,
        scene: &mut dyn SceneGraph,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let scenery = SceneryTemplates::resolve(templates)?;
        let rules = SpawnRules::from_config(&config);
        let mut terrain = RandomStream::terrain(config.world_seed);
        let scatter = vec![ScatterObjectSpec::trees(&config.trees, scenery.tree)];

        let grid = TerrainGrid::new(
            PatchLayout::from_config(&config),
            config.grid_rows,
            config.grid_columns,
            config.world_seed,
            Arc::clone(&field),
            scatter,
            ShiftContext {
                rng: &mut terrain,
                rules: &rules,
                templates: &scenery,
                scene,
            },
        );
        info!(
            "WorldState: {}x{} patches ready, seed {}",
            config.grid_columns, config.grid_rows, config.world_seed
        );

        Ok(Self {
            water: WaterPlane::from_config(&config),
            config,
            field,
            grid,
            terrain,
            rules,
            templates: scenery,
        })
    }

    pub fn config(&self) -> &LandscapeConfig {
        &self.config
    }

    pub fn field(&self) -> &Arc<dyn ElevationField> {
        &self.field
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn water(&self) -> &WaterPlane {
        &self.water
    }

    pub fn rules(&self) -> &SpawnRules {
        &self.rules
    }

    /// Words drawn from the terrain stream so far.
    pub fn terrain_draws(&self) -> u128 {
        self.terrain.word_pos()
    }

    pub fn shift(&mut self, rows: usize, scene: &mut dyn SceneGraph) {
        if rows == 0 {
            return;
        }
        self.grid.shift(
            rows,
            ShiftContext {
                rng: &mut self.terrain,
                rules: &self.rules,
                templates: &self.templates,
                scene,
            },
        );
        self.water.advance(rows, self.config.patch_depth);
    }

    /// Shift until the row under `viewpoint` is covered; returns the count.
    pub fn advance_to(&mut self, viewpoint: Vec3, scene: &mut dyn SceneGraph) -> usize {
        let due = self.grid.rows_due(viewpoint);
        self.shift(due, scene);
        due
    }

    pub fn query(&self, p: Vec3) -> Option<SampledPoint> {
        self.grid.query(p)
    }
}
