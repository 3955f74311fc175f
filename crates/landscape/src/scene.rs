//! The seam between the landscape and whatever draws it.
//!
//! The landscape never owns mesh data. It asks a [`SceneGraph`] to
//! instantiate registered [`MeshTemplates`] and gets back lightweight
//! [`InstanceHandle`]s, which it later hands back for removal. Patch geometry
//! is published as a whole `Arc<PatchGeometry>` whenever a patch is rebuilt.
//!
//! [`SceneLedger`] is the in-process implementation: it keeps the live
//! instance table and queues [`SceneChange`]s for a renderer to drain.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::config_error::ConfigError;
use crate::patch::{PatchGeometry, PatchId};

pub const TREE_TEMPLATE: &str = "tree";
pub const BOAT_TEMPLATE: &str = "boat";
pub const PIER_TEMPLATE: &str = "pier";
pub const CHURCH_TEMPLATE: &str = "church";
pub const BALLOON_TEMPLATE: &str = "balloon";

/// Index of a registered mesh template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub u32);

/// Names of the templates the asset collaborator has loaded.
#[derive(Resource, Debug, Clone, Default)]
pub struct MeshTemplates {
    names: Vec<String>,
}

impl MeshTemplates {
    /// Registry holding every template the landscape and player use.
    pub fn standard() -> Self {
        let mut templates = Self::default();
        for name in [
            TREE_TEMPLATE,
            BOAT_TEMPLATE,
            PIER_TEMPLATE,
            CHURCH_TEMPLATE,
            BALLOON_TEMPLATE,
        ] {
            templates.register(name);
        }
        templates
    }

    /// Register a template by name; re-registering returns the existing id.
    pub fn register(&mut self, name: &str) -> TemplateId {
        if let Some(id) = self.get(name) {
            return id;
        }
        self.names.push(name.to_string());
        TemplateId(self.names.len() as u32 - 1)
    }

    pub fn get(&self, name: &str) -> Option<TemplateId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| TemplateId(i as u32))
    }

    pub fn require(&self, name: &str) -> Result<TemplateId, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingTemplate(name.to_string()))
    }

    pub fn name(&self, id: TemplateId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The templates the landscape places, resolved once at startup.
#[derive(Debug, Clone, Copy)]
pub struct SceneryTemplates {
    pub tree: TemplateId,
    pub boat: TemplateId,
    pub pier: TemplateId,
    pub church: TemplateId,
}

impl SceneryTemplates {
    pub fn resolve(templates: &MeshTemplates) -> Result<Self, ConfigError> {
        Ok(Self {
            tree: templates.require(TREE_TEMPLATE)?,
            boat: templates.require(BOAT_TEMPLATE)?,
            pier: templates.require(PIER_TEMPLATE)?,
            church: templates.require(CHURCH_TEMPLATE)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneryKind {
    Tree,
    Boat,
    Pier,
    Church,
}

/// One object the landscape wants in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInstance {
    pub kind: SceneryKind,
    pub template: TemplateId,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Opaque handle to an instantiated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle(pub u64);

/// Add/remove scene-graph collaborator.
pub trait SceneGraph {
    fn instantiate(&mut self, instance: SceneInstance) -> InstanceHandle;
    fn remove(&mut self, handle: InstanceHandle);
    fn patch_rebuilt(&mut self, patch: PatchId, geometry: Arc<PatchGeometry>);
}

/// A change the renderer has not yet applied.
#[derive(Debug, Clone)]
pub enum SceneChange {
    Spawned(InstanceHandle, SceneInstance),
    Removed(InstanceHandle),
    PatchRebuilt(PatchId, Arc<PatchGeometry>),
}

/// Present when something drains [`SceneLedger`] changes each frame.
///
/// Without it the landscape discards the queue at the end of every frame, so
/// a headless world does not accumulate geometry nobody will read.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SceneChangeConsumer;

/// Live instance table plus a queue of pending changes.
#[derive(Resource, Default)]
pub struct SceneLedger {
    next_handle: u64,
    live: BTreeMap<InstanceHandle, SceneInstance>,
    pending: Vec<SceneChange>,
}

impl SceneLedger {
    pub fn live(&self) -> impl Iterator<Item = (&InstanceHandle, &SceneInstance)> {
        self.live.iter()
    }

    pub fn get(&self, handle: InstanceHandle) -> Option<&SceneInstance> {
        self.live.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn count_of(&self, kind: SceneryKind) -> usize {
        self.live.values().filter(|i| i.kind == kind).count()
    }

    /// Live instances of one kind, in handle (creation) order.
    pub fn instances_of(&self, kind: SceneryKind) -> Vec<&SceneInstance> {
        self.live.values().filter(|i| i.kind == kind).collect()
    }

    pub fn pending(&self) -> &[SceneChange] {
        &self.pending
    }

    /// Drop queued changes without applying them. The live table is kept.
    pub fn clear_changes(&mut self) {
        self.pending.clear();
    }

    /// Hand every queued change to the caller, oldest first.
    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.pending)
    }
}

impl SceneGraph for SceneLedger {
    fn instantiate(&mut self, instance: SceneInstance) -> InstanceHandle {
        let handle = InstanceHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle, instance.clone());
        self.pending.push(SceneChange::Spawned(handle, instance));
        handle
    }

    fn remove(&mut self, handle: InstanceHandle) {
        if self.live.remove(&handle).is_some() {
            self.pending.push(SceneChange::Removed(handle));
        } else {
            warn!("SceneLedger: remove of unknown instance {:?}", handle);
        }
    }

    fn patch_rebuilt(&mut self, patch: PatchId, geometry: Arc<PatchGeometry>) {
        self.pending.push(SceneChange::PatchRebuilt(patch, geometry));
    }
}
