//! Landscape configuration.
//!
//! The defaults reproduce the classic flight: a 6 x 12 grid of 64-unit
//! patches streaming along +Z, water at -15 and boats over anything deeper
//! than -21. A `LandscapeConfig` resource inserted before `LandscapePlugin`
//! overrides them; the binary can also read one from JSON.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config_error::ConfigError;
use crate::heightmap::HeightmapConfig;
use crate::random_stream::{derive_seed, NOISE_SEED_SALT};

pub const DEFAULT_WORLD_SEED: u64 = 42;

pub const PATCH_WIDTH: f32 = 64.0;
pub const PATCH_DEPTH: f32 = 64.0;
pub const PATCH_SEGMENTS: u32 = 32;
pub const GRID_COLUMNS: usize = 6;
pub const GRID_ROWS: usize = 12;
/// Z of the trailing edge of row 0 at startup.
pub const GRID_OFFSET_Z: f32 = -128.0;
pub const COARSE_SAMPLE_SPACING: f32 = 8.0;

pub const WATER_LEVEL: f32 = -15.0;
pub const BOAT_DEPTH_THRESHOLD: f32 = -21.0;
pub const DOCK_SPAWN_CHANCE: f32 = 0.05;
pub const CHURCH_SPAWN_CHANCE: f32 = 0.1;

pub const TERRAIN_HEIGHT: f32 = 50.0;
pub const TERRAIN_SCALE: f32 = 100.0;

pub const TREES_PER_PATCH: u32 = 50;

/// Upper bounds a config may ask the grid to allocate.
pub const MAX_PATCH_SEGMENTS: u32 = 256;
pub const MAX_GRID_PATCHES: usize = 4096;
pub const MAX_SAMPLES_PER_AXIS: f32 = 256.0;
pub const MAX_TREES_PER_PATCH: u32 = 10_000;

/// Rule for the trees scattered over every patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeScatterConfig {
    pub count: u32,
    pub min_size: [f32; 3],
    pub max_size: [f32; 3],
    pub lock_xz_scale: bool,
    pub min_height: f32,
    pub max_height: f32,
    /// Largest accepted `1 - normal.y`.
    pub max_slope: f32,
}

impl Default for TreeScatterConfig {
    fn default() -> Self {
        Self {
            count: TREES_PER_PATCH,
            min_size: [0.25, 0.4, 0.25],
            max_size: [0.5, 0.5, 0.5],
            lock_xz_scale: true,
            min_height: -10.0,
            max_height: 100.0,
            max_slope: 0.6,
        }
    }
}

/// Every tunable of the landscape, supplied once at startup.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandscapeConfig {
    /// Feeds the noise seed and both random streams through distinct derivations.
    pub world_seed: u64,
    pub water_level: f32,
    pub boat_depth_threshold: f32,
    pub dock_spawn_chance: f32,
    pub church_spawn_chance: f32,
    pub patch_width: f32,
    pub patch_depth: f32,
    /// Vertex segments along each side of a patch.
    pub patch_segments: u32,
    /// Distance between classification samples.
    pub coarse_sample_spacing: f32,
    pub grid_rows: usize,
    pub grid_columns: usize,
    pub grid_offset_z: f32,
    /// Noise-space offset as `[x, z]`.
    pub noise_offset: [f32; 2],
    pub terrain_height: f32,
    pub terrain_scale: f32,
    pub trees: TreeScatterConfig,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            world_seed: DEFAULT_WORLD_SEED,
            water_level: WATER_LEVEL,
            boat_depth_threshold: BOAT_DEPTH_THRESHOLD,
            dock_spawn_chance: DOCK_SPAWN_CHANCE,
            church_spawn_chance: CHURCH_SPAWN_CHANCE,
            patch_width: PATCH_WIDTH,
            patch_depth: PATCH_DEPTH,
            patch_segments: PATCH_SEGMENTS,
            coarse_sample_spacing: COARSE_SAMPLE_SPACING,
            grid_rows: GRID_ROWS,
            grid_columns: GRID_COLUMNS,
            grid_offset_z: GRID_OFFSET_Z,
            noise_offset: [0.0, -GRID_OFFSET_Z],
            terrain_height: TERRAIN_HEIGHT,
            terrain_scale: TERRAIN_SCALE,
            trees: TreeScatterConfig::default(),
        }
    }
}

impl LandscapeConfig {
    /// Parse and validate a JSON config. Missing keys fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// X of the left edge of column 0; the strip is centred on X = 0.
    pub fn grid_offset_x(&self) -> f32 {
        -(self.grid_columns as f32) * 0.5 * self.patch_width
    }

    pub fn landscape_width(&self) -> f32 {
        self.grid_columns as f32 * self.patch_width
    }

    pub fn landscape_depth(&self) -> f32 {
        self.grid_rows as f32 * self.patch_depth
    }

    pub fn heightmap(&self) -> HeightmapConfig {
        HeightmapConfig {
            noise_offset: Vec2::new(self.noise_offset[0], self.noise_offset[1]),
            height: self.terrain_height,
            scale: self.terrain_scale,
            seed: derive_seed(self.world_seed, NOISE_SEED_SALT) as i32,
        }
    }

    /// Reject any config the grid cannot operate on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_rows == 0 || self.grid_columns == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.grid_rows,
                columns: self.grid_columns,
            });
        }
        let patches = self.grid_rows.saturating_mul(self.grid_columns);
        if patches > MAX_GRID_PATCHES {
            return Err(ConfigError::TooLarge {
                field: "grid_rows * grid_columns",
                value: patches as f64,
                max: MAX_GRID_PATCHES as f64,
            });
        }
        if self.patch_segments == 0 {
            return Err(ConfigError::ZeroSegments);
        }
        if self.patch_segments > MAX_PATCH_SEGMENTS {
            return Err(ConfigError::TooLarge {
                field: "patch_segments",
                value: self.patch_segments as f64,
                max: MAX_PATCH_SEGMENTS as f64,
            });
        }

        let trees = &self.trees;
        for (field, value) in [
            ("water_level", self.water_level),
            ("boat_depth_threshold", self.boat_depth_threshold),
            ("grid_offset_z", self.grid_offset_z),
            ("noise_offset.x", self.noise_offset[0]),
            ("noise_offset.z", self.noise_offset[1]),
            ("terrain_height", self.terrain_height),
            ("trees.min_height", trees.min_height),
            ("trees.max_height", trees.max_height),
            ("trees.max_slope", trees.max_slope),
        ]
        .into_iter()
        .chain(trees.min_size.iter().map(|v| ("trees.min_size", *v)))
        .chain(trees.max_size.iter().map(|v| ("trees.max_size", *v)))
        {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        for (field, value) in [
            ("patch_width", self.patch_width),
            ("patch_depth", self.patch_depth),
            ("coarse_sample_spacing", self.coarse_sample_spacing),
            ("terrain_scale", self.terrain_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        // The grid must stay finite once patches are laid end to end.
        for (field, value) in [
            ("landscape_width", self.landscape_width()),
            ("landscape_depth", self.landscape_depth()),
            ("grid_offset_z + landscape_depth", self.grid_offset_z + self.landscape_depth()),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        let samples = self.patch_width.max(self.patch_depth) / self.coarse_sample_spacing;
        if samples > MAX_SAMPLES_PER_AXIS {
            return Err(ConfigError::TooLarge {
                field: "patch size / coarse_sample_spacing",
                value: samples as f64,
                max: MAX_SAMPLES_PER_AXIS as f64,
            });
        }
        if trees.count > MAX_TREES_PER_PATCH {
            return Err(ConfigError::TooLarge {
                field: "trees.count",
                value: trees.count as f64,
                max: MAX_TREES_PER_PATCH as f64,
            });
        }

        for (field, value) in [
            ("dock_spawn_chance", self.dock_spawn_chance),
            ("church_spawn_chance", self.church_spawn_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ChanceOutOfRange { field, value });
            }
        }
        if trees.min_height > trees.max_height {
            return Err(ConfigError::InvertedRange {
                field: "trees.height",
                min: trees.min_height,
                max: trees.max_height,
            });
        }
        for axis in 0..3 {
            if trees.min_size[axis] > trees.max_size[axis] {
                return Err(ConfigError::InvertedRange {
                    field: "trees.size",
                    min: trees.min_size[axis],
                    max: trees.max_size[axis],
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LandscapeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_strip_is_centred() {
        let config = LandscapeConfig::default();
        assert_eq!(config.grid_offset_x(), -192.0);
        assert_eq!(config.landscape_width(), 384.0);
        assert_eq!(config.landscape_depth(), 768.0);
    }

    #[test]
    fn test_zero_rows_rejected() {
        let config = LandscapeConfig {
            grid_rows: 0,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyGrid { rows: 0, .. })
        ));
    }

    #[test]
    fn test_negative_patch_width_rejected() {
        let config = LandscapeConfig {
            patch_width: -64.0,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "patch_width",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_spacing_rejected() {
        let config = LandscapeConfig {
            coarse_sample_spacing: f32::NAN,
            ..default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_infinite_offset_rejected() {
        let config = LandscapeConfig {
            grid_offset_z: f32::INFINITY,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "grid_offset_z",
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_levels_rejected() {
        let cases = [
            LandscapeConfig {
                water_level: f32::NAN,
                ..default()
            },
            LandscapeConfig {
                boat_depth_threshold: f32::NEG_INFINITY,
                ..default()
            },
            LandscapeConfig {
                terrain_height: f32::INFINITY,
                ..default()
            },
            LandscapeConfig {
                noise_offset: [f32::NAN, 0.0],
                ..default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::NonFinite { .. })),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn test_non_finite_tree_bounds_rejected() {
        let mut config = LandscapeConfig::default();
        config.trees.max_height = f32::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "trees.max_height",
                ..
            })
        ));
        let mut config = LandscapeConfig::default();
        config.trees.min_size[1] = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_huge_patch_width_overflowing_strip_rejected() {
        let config = LandscapeConfig {
            patch_width: f32::MAX,
            coarse_sample_spacing: f32::MAX,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "landscape_width",
                ..
            })
        ));
    }

    #[test]
    fn test_resolution_caps() {
        let config = LandscapeConfig {
            patch_segments: u32::MAX,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge {
                field: "patch_segments",
                ..
            })
        ));

        let config = LandscapeConfig {
            coarse_sample_spacing: 0.001,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge { .. })
        ));

        let config = LandscapeConfig {
            grid_rows: usize::MAX,
            grid_columns: 2,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge { .. })
        ));

        let mut config = LandscapeConfig::default();
        config.trees.count = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge {
                field: "trees.count",
                ..
            })
        ));

        let config = LandscapeConfig {
            patch_segments: MAX_PATCH_SEGMENTS,
            ..default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chance_above_one_rejected() {
        let config = LandscapeConfig {
            church_spawn_chance: 1.5,
            ..default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ChanceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_inverted_tree_sizes_rejected() {
        let mut config = LandscapeConfig::default();
        config.trees.min_size = [1.0, 1.0, 1.0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_from_json_partial_override() {
        let config = LandscapeConfig::from_json(r#"{ "world_seed": 7, "grid_rows": 4 }"#)
            .expect("partial json should parse");
        assert_eq!(config.world_seed, 7);
        assert_eq!(config.grid_rows, 4);
        assert_eq!(config.grid_columns, GRID_COLUMNS);
        assert_eq!(config.water_level, WATER_LEVEL);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let result = LandscapeConfig::from_json(r#"{ "grid_columns": 0 }"#);
        assert!(matches!(result, Err(ConfigError::EmptyGrid { .. })));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            LandscapeConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_heightmap_seed_follows_world_seed() {
        let a = LandscapeConfig::default().heightmap();
        let b = LandscapeConfig {
            world_seed: 43,
            ..default()
        }
        .heightmap();
        assert_ne!(a.seed, b.seed);
        assert_eq!(a.noise_offset, Vec2::new(0.0, 128.0));
    }
}
