//! Deterministic random streams.
//!
//! Wraps `ChaCha8Rng` for cross-platform reproducible sequences. The world
//! owns two independent streams derived from one `world_seed`: one for
//! terrain and scenery decisions, one for wildlife, so advancing one never
//! perturbs the other.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Salt for the terrain/scenery stream.
pub const TERRAIN_STREAM_SALT: u64 = 0x7465_7272_6169_6e00;
/// Salt for the wildlife stream.
pub const WILDLIFE_STREAM_SALT: u64 = 0x6269_7264_7300_0000;
/// Salt for the heightmap noise seed.
pub const NOISE_SEED_SALT: u64 = 0x6e6f_6973_6500_0000;
/// Salt for per-patch scatter streams.
pub const SCATTER_SALT: u64 = 0x7363_6174_7465_7200;

/// Splitmix64 finalizer over a seed and a salt.
///
/// Distinct salts give unrelated seeds for the same world seed.
#[inline]
pub fn derive_seed(seed: u64, salt: u64) -> u64 {
    let mut h = seed ^ salt;
    h = h.wrapping_add(0x9e37_79b9_7f4a_7c15);
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Seed for the scatter stream of the patch at `(column, row_index)`.
pub fn patch_seed(world_seed: u64, column: usize, row_index: i64) -> u64 {
    let h = derive_seed(world_seed, SCATTER_SALT);
    let h = derive_seed(h, column as u64);
    derive_seed(h, row_index as u64)
}

/// A reproducible sequence of bounded real samples.
pub struct RandomStream {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream for terrain and scenery decisions.
    pub fn terrain(world_seed: u64) -> Self {
        Self::new(derive_seed(world_seed, TERRAIN_STREAM_SALT))
    }

    /// Stream for wildlife; never shared with terrain.
    pub fn wildlife(world_seed: u64) -> Self {
        Self::new(derive_seed(world_seed, WILDLIFE_STREAM_SALT))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform sample in `[min, max)`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.rng.gen::<f32>()
    }

    /// Rare-event test: true when `range(0, 1) + chance > 1`.
    pub fn chance(&mut self, chance: f32) -> bool {
        self.range(0.0, 1.0) + chance > 1.0
    }

    /// Uniform index into a list of `len` items (`floor(range(0, len))`).
    ///
    /// Consumes exactly one sample; `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        let raw = self.range(0.0, len as f32).floor() as usize;
        raw.min(len.saturating_sub(1))
    }

    /// `ceil(range(min, max))`, used for small counts.
    pub fn count(&mut self, min: f32, max: f32) -> u32 {
        self.range(min, max).ceil() as u32
    }

    /// Number of 32-bit words consumed so far.
    pub fn word_pos(&self) -> u128 {
        self.rng.get_word_pos()
    }
}
