//! Bird flock respawn schedule.
//!
//! Only placement and timing live here; steering the birds between respawns
//! belongs to whoever animates them. The flock draws exclusively from the
//! wildlife stream, so the terrain stream never sees its samples.

use bevy::prelude::*;

use crate::random_stream::RandomStream;

pub const BIRD_COUNT: usize = 40;
/// Flocks appear this far along Z from the viewpoint (negative is behind).
pub const BIRD_SPAWN_DISTANCE: f32 = -200.0;
pub const RESPAWN_BASE_SECS: f32 = 30.0;
pub const RESPAWN_JITTER_SECS: f32 = 20.0;

const FLOCK_ALTITUDE: (f32, f32) = (64.0, 128.0);
const BUNCH_RANGE: (f32, f32) = (0.2, 1.0);
/// Per-bird spread before bunching.
const BIRD_SPREAD: Vec3 = Vec3::new(32.0, 16.0, 48.0);

#[derive(Resource)]
pub struct Flock {
    birds: Vec<Vec3>,
    /// Seconds until the next respawn; `<= 0` means due now.
    respawn_in: f32,
    spawns: u32,
    rng: RandomStream,
}

impl Flock {
    pub fn new(world_seed: u64, count: usize) -> Self {
        Self {
            birds: vec![Vec3::ZERO; count],
            respawn_in: 0.0,
            spawns: 0,
            rng: RandomStream::wildlife(world_seed),
        }
    }

    pub fn birds(&self) -> &[Vec3] {
        &self.birds
    }

    /// Mutable positions for the behaviour that flies the birds.
    pub fn birds_mut(&mut self) -> &mut [Vec3] {
        &mut self.birds
    }

    pub fn spawn_count(&self) -> u32 {
        self.spawns
    }

    pub fn respawn_in(&self) -> f32 {
        self.respawn_in
    }

    pub fn centroid(&self) -> Option<Vec3> {
        if self.birds.is_empty() {
            return None;
        }
        let sum: Vec3 = self.birds.iter().copied().sum();
        Some(sum / self.birds.len() as f32)
    }

    /// Count down by `dt` and respawn when due. Returns whether it respawned.
    pub fn tick(&mut self, dt: f32, viewpoint_z: f32, landscape_width: f32) -> bool {
        self.respawn_in -= dt;
        if self.respawn_in > 0.0 {
            return false;
        }
        self.respawn(viewpoint_z, landscape_width);
        true
    }

    /// Regroup the flock ahead of the viewpoint and schedule the next respawn.
    pub fn respawn(&mut self, viewpoint_z: f32, landscape_width: f32) {
        let half_span = landscape_width * 0.25;
        let bunch = self.rng.range(BUNCH_RANGE.0, BUNCH_RANGE.1);
        let centre = Vec3::new(
            self.rng.range(-half_span, half_span),
            self.rng.range(FLOCK_ALTITUDE.0, FLOCK_ALTITUDE.1),
            viewpoint_z + BIRD_SPAWN_DISTANCE,
        );
        for bird in &mut self.birds {
            let offset = Vec3::new(
                self.rng.range(-BIRD_SPREAD.x, BIRD_SPREAD.x),
                self.rng.range(-BIRD_SPREAD.y, BIRD_SPREAD.y),
                self.rng.range(-BIRD_SPREAD.z, BIRD_SPREAD.z),
            );
            *bird = centre + offset * bunch;
        }
        self.respawn_in = RESPAWN_BASE_SECS + self.rng.range(0.0, RESPAWN_JITTER_SECS);
        self.spawns += 1;
        debug!(
            "Flock: respawn #{} at {:?}, next in {:.1}s",
            self.spawns, centre, self.respawn_in
        );
    }
}
