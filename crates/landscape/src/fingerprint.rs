//! Reproducibility fingerprint of the placed scenery.
//!
//! Every live instance is flattened into a [`SceneryRecord`] in handle order,
//! the list is bitcode-encoded and the bytes are hashed with xxh32. Float
//! fields are stored as bit patterns so identical worlds hash identically on
//! every platform.

use bitcode::{Decode, Encode};
use xxhash_rust::xxh32::xxh32;

use crate::scene::{SceneInstance, SceneLedger, SceneryKind};

const FINGERPRINT_SEED: u32 = 0x4c41_4e44;

/// Flat, hashable form of a [`SceneInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct SceneryRecord {
    pub kind: u8,
    pub template: u32,
    pub translation: [u32; 3],
    pub rotation: [u32; 4],
    pub scale: [u32; 3],
    pub shadows: u8,
}

impl SceneryRecord {
    pub fn from_instance(instance: &SceneInstance) -> Self {
        let t = &instance.transform;
        Self {
            kind: kind_tag(instance.kind),
            template: instance.template.0,
            translation: t.translation.to_array().map(f32::to_bits),
            rotation: t.rotation.to_array().map(f32::to_bits),
            scale: t.scale.to_array().map(f32::to_bits),
            shadows: instance.cast_shadow as u8 | (instance.receive_shadow as u8) << 1,
        }
    }
}

fn kind_tag(kind: SceneryKind) -> u8 {
    match kind {
        SceneryKind::Tree => 0,
        SceneryKind::Boat => 1,
        SceneryKind::Pier => 2,
        SceneryKind::Church => 3,
    }
}

/// Records of every live instance, in creation order.
pub fn scenery_records(ledger: &SceneLedger) -> Vec<SceneryRecord> {
    ledger
        .live()
        .map(|(_, instance)| SceneryRecord::from_instance(instance))
        .collect()
}

/// Hash of all live scenery. Equal worlds give equal fingerprints.
pub fn scenery_fingerprint(ledger: &SceneLedger) -> u32 {
    let bytes = bitcode::encode(&scenery_records(ledger));
    xxh32(&bytes, FINGERPRINT_SEED)
}
