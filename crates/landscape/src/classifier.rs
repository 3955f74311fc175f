//! Sorting coarse samples into scenery candidates.

use crate::config::LandscapeConfig;
use crate::patch::SampledPoint;

/// Minimum `normal.y` for a boat anchorage (nearly flat sea bed).
pub const BOAT_FLATNESS: f32 = 0.99;
/// Piers sit this far above the waterline.
pub const PIER_HEIGHT_ABOVE_WATER: f32 = 0.5;
/// Accepted distance from the pier height.
pub const PIER_HEIGHT_TOLERANCE: f32 = 1.5;
pub const PIER_FLATNESS: f32 = 0.7;
pub const BUILDING_FLATNESS: f32 = 0.95;

/// Thresholds the classifier compares samples against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRules {
    pub water_level: f32,
    pub boat_depth_threshold: f32,
    pub dock_spawn_chance: f32,
    pub church_spawn_chance: f32,
}

impl SpawnRules {
    pub fn from_config(config: &LandscapeConfig) -> Self {
        Self {
            water_level: config.water_level,
            boat_depth_threshold: config.boat_depth_threshold,
            dock_spawn_chance: config.dock_spawn_chance,
            church_spawn_chance: config.church_spawn_chance,
        }
    }

    pub fn is_boat_site(&self, sample: &SampledPoint) -> bool {
        sample.position.y <= self.boat_depth_threshold && sample.normal.y >= BOAT_FLATNESS
    }

    pub fn is_pier_site(&self, sample: &SampledPoint) -> bool {
        let pier_height = self.water_level + PIER_HEIGHT_ABOVE_WATER;
        (sample.position.y - pier_height).abs() < PIER_HEIGHT_TOLERANCE
            && sample.normal.y > PIER_FLATNESS
    }

    pub fn is_building_site(&self, sample: &SampledPoint) -> bool {
        sample.position.y > self.water_level && sample.normal.y > BUILDING_FLATNESS
    }
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self::from_config(&LandscapeConfig::default())
    }
}

/// Candidates for one row. A sample may appear in several lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnCandidateSet {
    pub boats: Vec<SampledPoint>,
    pub piers: Vec<SampledPoint>,
    pub buildings: Vec<SampledPoint>,
}

impl SpawnCandidateSet {
    pub fn is_empty(&self) -> bool {
        self.boats.is_empty() && self.piers.is_empty() && self.buildings.is_empty()
    }
}

/// Apply every rule to every sample, preserving sample order.
pub fn classify(
    samples: impl IntoIterator<Item = SampledPoint>,
    rules: &SpawnRules,
) -> SpawnCandidateSet {
    let mut set = SpawnCandidateSet::default();
    for sample in samples {
        if rules.is_boat_site(&sample) {
            set.boats.push(sample);
        }
        if rules.is_pier_site(&sample) {
            set.piers.push(sample);
        }
        if rules.is_building_site(&sample) {
            set.buildings.push(sample);
        }
    }
    set
}
