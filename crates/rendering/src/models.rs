//! Scene handles for every registered mesh template.

use std::collections::HashMap;

use bevy::prelude::*;

use landscape::scene::{MeshTemplates, TemplateId};

/// Pre-loaded GLB scenes keyed by template.
#[derive(Resource, Default)]
pub struct SceneryModelCache {
    scenes: HashMap<TemplateId, Handle<Scene>>,
}

impl SceneryModelCache {
    pub fn insert(&mut self, template: TemplateId, scene: Handle<Scene>) {
        self.scenes.insert(template, scene);
    }

    /// Scene for `template`, or the default handle when nothing was loaded.
    pub fn get(&self, template: TemplateId) -> Handle<Scene> {
        self.scenes.get(&template).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// Asset path of a template's model.
pub fn model_path(name: &str) -> String {
    format!("models/{name}.glb")
}

/// Startup system: load `models/<name>.glb` for each registered template.
pub fn load_scenery_models(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    templates: Res<MeshTemplates>,
) {
    let mut cache = SceneryModelCache::default();
    for index in 0..templates.len() {
        let id = TemplateId(index as u32);
        let Some(name) = templates.name(id) else {
            continue;
        };
        let scene =
            asset_server.load(bevy::gltf::GltfAssetLabel::Scene(0).from_asset(model_path(name)));
        cache.insert(id, scene);
    }
    info!("Loaded {} scenery models", cache.len());
    commands.insert_resource(cache);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_template_falls_back_to_default() {
        let cache = SceneryModelCache::default();
        assert_eq!(cache.get(TemplateId(4)), Handle::<Scene>::default());
        assert!(cache.is_empty());
    }

    #[test]
    fn model_paths_follow_template_names() {
        assert_eq!(model_path("church"), "models/church.glb");
    }
}
