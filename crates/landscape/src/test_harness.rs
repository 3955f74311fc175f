//! # TestLandscape: headless harness for the landscape plugin
//!
//! Wraps `bevy::app::App` + `MinimalPlugins` + `LandscapePlugin` so tests
//! and benchmarks can fly a viewpoint over the world without a window.

use bevy::app::{App, AppExit};
use bevy::prelude::*;

use crate::config::LandscapeConfig;
use crate::fingerprint::scenery_fingerprint;
use crate::scene::{MeshTemplates, SceneChange, SceneChangeConsumer, SceneLedger, SceneryKind};
use crate::wildlife::Flock;
use crate::world::{WaterPlane, WorldState};
use crate::{LandscapePlugin, Viewpoint};

pub struct TestLandscape {
    app: App,
}

impl Default for TestLandscape {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLandscape {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// The default world: seed 42, 6 x 12 patches.
    pub fn new() -> Self {
        Self::with_config(LandscapeConfig::default())
    }

    pub fn with_config(config: LandscapeConfig) -> Self {
        Self::build(config, None, false)
    }

    /// Start with a custom template registry instead of the standard one.
    pub fn with_templates(config: LandscapeConfig, templates: MeshTemplates) -> Self {
        Self::build(config, Some(templates), false)
    }

    /// Keep every queued scene change, as if a renderer were attached; the
    /// test reads them through [`TestLandscape::take_changes`].
    pub fn with_change_consumer(config: LandscapeConfig) -> Self {
        Self::build(config, None, true)
    }

    fn build(config: LandscapeConfig, templates: Option<MeshTemplates>, consumer: bool) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(config);
        if let Some(templates) = templates {
            app.insert_resource(templates);
        }
        if consumer {
            app.insert_resource(SceneChangeConsumer);
        }
        app.add_plugins(LandscapePlugin);
        // Startup runs here; a rejected config leaves no WorldState behind.
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Move the viewpoint and run one frame.
    pub fn fly_to(&mut self, position: Vec3) -> &mut Self {
        self.app.world_mut().resource_mut::<Viewpoint>().position = position;
        self.app.update();
        self
    }

    /// Fly along +Z in `step`-unit frames until `z` is reached.
    pub fn fly_forward(&mut self, z: f32, step: f32) -> &mut Self {
        let mut current = self.viewpoint().z;
        while current < z {
            current = (current + step).min(z);
            let x = self.viewpoint().x;
            self.fly_to(Vec3::new(x, 60.0, current));
        }
        self
    }

    pub fn update(&mut self, frames: u32) -> &mut Self {
        for _ in 0..frames {
            self.app.update();
        }
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn has_resource<T: Resource>(&self) -> bool {
        self.app.world().contains_resource::<T>()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn viewpoint(&self) -> Vec3 {
        self.resource::<Viewpoint>().position
    }

    pub fn world_state(&self) -> &WorldState {
        self.resource::<WorldState>()
    }

    pub fn ledger(&self) -> &SceneLedger {
        self.resource::<SceneLedger>()
    }

    pub fn water(&self) -> &WaterPlane {
        self.resource::<WaterPlane>()
    }

    pub fn flock(&self) -> &Flock {
        self.resource::<Flock>()
    }

    pub fn count_of(&self, kind: SceneryKind) -> usize {
        self.ledger().count_of(kind)
    }

    pub fn fingerprint(&self) -> u32 {
        scenery_fingerprint(self.ledger())
    }

    /// Drain the scene change queue, as a renderer would.
    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        self.app
            .world_mut()
            .resource_mut::<SceneLedger>()
            .drain_changes()
    }

    pub fn exit_requested(&self) -> Option<AppExit> {
        self.app.should_exit()
    }
}
